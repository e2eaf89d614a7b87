use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use baas_client::ApiError;
use thiserror::Error;

use crate::{config::ConfigError, pages};

/// Failure of one outbound backend call.
#[derive(Error, Debug)]
pub enum CallError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CallError {
    /// The backend refused the credentials, e.g. an expired or revoked session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CallError::Api(ApiError::HttpError { status: 401, .. }))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("backend configuration incomplete: {}", .0.join(", "))]
    ConfigurationIncomplete(Vec<&'static str>),

    #[error("request carries no session cookie")]
    NoSession,

    #[error("not signed in")]
    Unauthenticated,

    #[error("cookie operation attempted outside of a request")]
    NoRequestContext,

    #[error("sign-up failed")]
    SignUpFailed,

    #[error("sign-in failed")]
    SignInFailed,

    #[error("{operation} failed")]
    Backend {
        operation: &'static str,
        id: Option<String>,
        #[source]
        source: CallError,
    },
}

impl AppError {
    pub fn backend(operation: &'static str, id: Option<&str>, source: impl Into<CallError>) -> Self {
        AppError::Backend {
            operation,
            id: id.map(str::to_string),
            source: source.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NoSession | AppError::Unauthenticated => {
                return Redirect::to("/sign-in").into_response();
            }
            AppError::SignUpFailed => (StatusCode::UNAUTHORIZED, "Could not create the account."),
            AppError::SignInFailed => (StatusCode::UNAUTHORIZED, "Invalid email or password."),
            AppError::ConfigurationIncomplete(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "The service is not configured yet.",
            ),
            AppError::NoRequestContext => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
            AppError::Backend { .. } => (
                StatusCode::BAD_GATEWAY,
                "The operation failed. Please try again.",
            ),
        };

        (status, Html(pages::error_page(message))).into_response()
    }
}

/// Errors that stop the server from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
