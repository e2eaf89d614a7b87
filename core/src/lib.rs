//! Synchronous API client core for the backend-as-a-service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip.
//!
//! # Design
//! - `BackendClient` is stateless; it holds one `CredentialContext`.
//! - `Credentials` is a tagged variant (`Session` | `Admin`); a request carries
//!   exactly one credential header and the variant is fixed at construction.
//! - Documents are projected into `TodoItem` by `document_to_todo`, which
//!   substitutes defaults for missing or mistyped fields.

pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod mapping;
pub mod types;

pub use client::{encode_component, owner_permissions, BackendClient, ORDER_NEWEST_FIRST};
pub use credentials::{CredentialContext, Credentials};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mapping::document_to_todo;
pub use types::{
    Collection, EmailPassword, NewAccount, Session, SessionToken, TodoFields, TodoItem, User,
};
