//! Stateless HTTP request builder and response parser for the backend API.
//!
//! # Design
//! `BackendClient` holds only a `CredentialContext` and carries no mutable
//! state between calls. Each backend operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. Every request goes through [`BackendClient::request`],
//! the one place credentials are turned into headers.

use std::borrow::Cow;

use serde::Serialize;

use crate::credentials::CredentialContext;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::mapping::document_to_todo;
use crate::types::{
    Collection, CreateDocument, DocumentList, EmailPassword, NewAccount, Session, TodoFields,
    TodoItem, UpdateDocument, User, UNIQUE_ID,
};

/// Newest documents first.
pub const ORDER_NEWEST_FIRST: &str = r#"orderDesc("$createdAt")"#;

/// Read, update and delete permissions for a single user.
pub fn owner_permissions(user_id: &str) -> Vec<String> {
    ["read", "update", "delete"]
        .iter()
        .map(|action| format!("{action}(\"user:{user_id}\")"))
        .collect()
}

/// Synchronous, stateless client for the backend API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    context: CredentialContext,
}

impl BackendClient {
    pub fn new(context: CredentialContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CredentialContext {
        &self.context
    }

    /// Build a request under this client's credentials.
    pub fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = self.context.headers();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.context.endpoint()),
            headers,
            body,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(method, path, Some(body)))
    }

    // -- account ------------------------------------------------------------

    pub fn build_create_account(&self, input: &NewAccount) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/account", input)
    }

    pub fn build_create_email_session(&self, input: &EmailPassword) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/account/sessions/email", input)
    }

    pub fn build_delete_current_session(&self) -> HttpRequest {
        self.request(HttpMethod::Delete, "/account/sessions/current", None)
    }

    pub fn build_get_account(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/account", None)
    }

    // -- documents ----------------------------------------------------------

    pub fn build_create_document(
        &self,
        collection: &Collection,
        fields: &TodoFields,
        permissions: Vec<String>,
    ) -> Result<HttpRequest, ApiError> {
        let payload = CreateDocument {
            document_id: UNIQUE_ID,
            data: fields,
            permissions,
        };
        self.json_request(HttpMethod::Post, &documents_path(collection), &payload)
    }

    pub fn build_list_documents(&self, collection: &Collection) -> HttpRequest {
        let path = format!(
            "{}?{}={}",
            documents_path(collection),
            encode_component("queries[]"),
            encode_component(ORDER_NEWEST_FIRST)
        );
        self.request(HttpMethod::Get, &path, None)
    }

    pub fn build_update_document(
        &self,
        collection: &Collection,
        id: &str,
        fields: &TodoFields,
    ) -> Result<HttpRequest, ApiError> {
        let payload = UpdateDocument { data: fields };
        self.json_request(HttpMethod::Patch, &document_path(collection, id), &payload)
    }

    pub fn build_delete_document(&self, collection: &Collection, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &document_path(collection, id), None)
    }

    // -- parsing ------------------------------------------------------------

    pub fn parse_create_account(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    pub fn parse_create_email_session(&self, response: HttpResponse) -> Result<Session, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    pub fn parse_delete_current_session(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_get_account(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn parse_create_document(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response, 201)?;
        let doc: serde_json::Value = decode(&response)?;
        Ok(document_to_todo(&doc))
    }

    /// Documents come back in the order the backend applied; no local sort.
    pub fn parse_list_documents(&self, response: HttpResponse) -> Result<Vec<TodoItem>, ApiError> {
        check_status(&response, 200)?;
        let list: DocumentList = decode(&response)?;
        Ok(list.documents.iter().map(document_to_todo).collect())
    }

    pub fn parse_update_document(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response, 200)?;
        let doc: serde_json::Value = decode(&response)?;
        Ok(document_to_todo(&doc))
    }

    pub fn parse_delete_document(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }
}

fn documents_path(collection: &Collection) -> String {
    format!(
        "/databases/{}/collections/{}/documents",
        encode_component(&collection.database_id),
        encode_component(&collection.collection_id)
    )
}

fn document_path(collection: &Collection, id: &str) -> String {
    format!("{}/{}", documents_path(collection), encode_component(id))
}

/// Percent-encode everything outside the RFC 3986 unreserved set, for use as
/// one path segment or query component.
pub fn encode_component(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
