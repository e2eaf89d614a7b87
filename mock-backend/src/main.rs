use mock_backend::MockConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let defaults = MockConfig::default();
    let config = MockConfig {
        project_id: std::env::var("MOCK_PROJECT_ID").unwrap_or(defaults.project_id),
        api_key: std::env::var("MOCK_API_KEY").unwrap_or(defaults.api_key),
        ..defaults
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(project = %config.project_id, "mock backend listening on http://{addr}/v1");
    mock_backend::run_with(listener, config).await
}
