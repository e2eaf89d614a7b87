//! Server-rendered todo app backed by a backend-as-a-service.
//!
//! # Overview
//! The app owns no data. Accounts, sessions and todo documents live in the
//! backend; this crate carries the session secret in a cookie and forwards
//! each operation to the backend under the right credentials.
//!
//! # Request flow
//! - `RequestContext` pulls the cookie jar and TLS status out of the request.
//! - `ClientFactory` builds a session client (from the cookie) or an admin
//!   client (from the API key) for that one call.
//! - `TodoService` runs the operation and maps documents into `TodoItem`s.
//! - `cookies` sets the session cookie on sign-in/sign-up and clears it on
//!   sign-out.
//!
//! # Configuration
//! `BACKEND_ENDPOINT`, `BACKEND_PROJECT_ID`, `BACKEND_API_KEY`,
//! `BACKEND_DATABASE_ID` and `BACKEND_COLLECTION_ID` come from the environment
//! or `/run/secrets/<NAME>`. `APP_ENV=production` makes incomplete settings
//! fatal at startup and enables `Secure` cookies for TLS requests. `PORT`
//! defaults to 3000.
//!
//! ```sh
//! cargo run -p mock-backend &
//! BACKEND_ENDPOINT=http://127.0.0.1:3001/v1 BACKEND_PROJECT_ID=test-project \
//! BACKEND_API_KEY=test-key BACKEND_DATABASE_ID=main BACKEND_COLLECTION_ID=todos \
//! cargo run -p todo-web
//! ```

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_cookies::CookieManagerLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod context;
pub mod cookies;
pub mod credentials;
pub mod error;
pub mod pages;
pub mod routes;
pub mod service;

use config::{check_startup, Config};
use error::StartupError;
use routes::{
    create_todo_handler, delete_todo_handler, health_handler, index_handler, list_todos_handler,
    sign_in_handler, sign_in_page_handler, sign_out_handler, sign_up_handler, sign_up_page_handler,
    update_todo_handler,
};
use service::TodoService;

pub fn app(service: TodoService) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/sign-in", get(sign_in_page_handler).post(sign_in_handler))
        .route("/sign-up", get(sign_up_page_handler).post(sign_up_handler))
        .route("/sign-out", post(sign_out_handler))
        .route("/todos", get(list_todos_handler).post(create_todo_handler))
        .route("/todos/{id}", post(update_todo_handler))
        .route("/todos/{id}/delete", post(delete_todo_handler))
        .layer(CookieManagerLayer::new())
        .with_state(service)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

pub async fn start_server() -> Result<(), StartupError> {
    info!("Loading configuration...");
    let config = Config::load()?;
    if let Err(e) = check_startup(&config) {
        error!("Refusing to start: {e}");
        return Err(e.into());
    }
    let config = Arc::new(config);

    let address = format!("0.0.0.0:{}", config.port);
    let app = app(TodoService::new(config));

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
