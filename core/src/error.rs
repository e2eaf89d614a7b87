//! Error types for the backend API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the
//! document does not exist" from "the backend returned an unexpected status."
//! All other non-2xx responses land in `HttpError` with the raw status code and
//! body for debugging.

use thiserror::Error;

/// Errors returned by `BackendClient` build and parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend returned 404.
    #[error("resource not found")]
    NotFound,

    /// The backend returned a status other than the expected one or 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// Status code reported by the backend, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
