//! Wire DTOs for the backend API and the local todo projection.
//!
//! # Design
//! Backend-owned records (`User`, `Session`) deserialize straight from the
//! backend's JSON, `$`-prefixed metadata included. Documents are NOT given a
//! typed schema here: they stay `serde_json::Value` until `document_to_todo`
//! projects them, so malformed payloads go through the defaulting rules
//! instead of failing deserialization.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier placeholder asking the backend to assign a fresh id.
pub const UNIQUE_ID: &str = "unique()";

/// An account as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A session as returned by the backend. `secret` is only populated when the
/// session was created with the server API key.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub expire: Option<String>,
}

/// Opaque session secret. Never parsed, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Request payload for account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub name: String,
}

impl NewAccount {
    pub fn new(email: &str, password: &str, name: &str) -> Self {
        Self {
            user_id: UNIQUE_ID.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }
}

/// Request payload for email/password session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailPassword {
    pub email: String,
    pub password: String,
}

/// The user-writable fields of a todo document. Both are always sent;
/// updates overwrite rather than merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoFields {
    pub title: String,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
}

/// Database/collection pair addressing the todo documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub database_id: String,
    pub collection_id: String,
}

impl Collection {
    pub fn new(database_id: &str, collection_id: &str) -> Self {
        Self {
            database_id: database_id.to_string(),
            collection_id: collection_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDocument<'a> {
    #[serde(rename = "documentId")]
    pub document_id: &'a str,
    pub data: &'a TodoFields,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateDocument<'a> {
    pub data: &'a TodoFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentList {
    #[serde(default)]
    pub documents: Vec<serde_json::Value>,
}

/// Local read/write projection of a todo document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
