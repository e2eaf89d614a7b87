#[tokio::main]
async fn main() -> Result<(), todo_web::error::StartupError> {
    todo_web::init_tracing();
    todo_web::start_server().await
}
