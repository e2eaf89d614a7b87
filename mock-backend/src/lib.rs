//! In-memory stand-in for the backend-as-a-service.
//!
//! Serves the subset of the REST API the web app calls, under `/v1`:
//! account creation, email/password sessions, the current account, and
//! documents with per-user permissions. State lives in one `RwLock` and is
//! lost when the process exits.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const PROJECT_HEADER: &str = "x-appwrite-project";
pub const SESSION_HEADER: &str = "x-appwrite-session";
pub const API_KEY_HEADER: &str = "x-appwrite-key";

const UNIQUE_ID: &str = "unique()";
const MIN_PASSWORD_LEN: usize = 8;

/// Project identity the mock accepts, plus fault switches for tests.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub project_id: String,
    pub api_key: String,
    /// Answer every session deletion with a 500.
    pub fail_session_delete: bool,
    /// Answer the first N email session creations with a 500.
    pub fail_session_creates: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            project_id: "test-project".to_string(),
            api_key: "test-key".to_string(),
            fail_session_delete: false,
            fail_session_creates: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Clone, Debug)]
struct SessionRecord {
    id: String,
    user_id: String,
    expire: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct Document {
    id: String,
    database_id: String,
    collection_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    permissions: Vec<String>,
    data: Map<String, Value>,
    seq: u64,
}

impl Document {
    fn to_json(&self) -> Value {
        let mut out = self.data.clone();
        out.insert("$id".into(), json!(self.id));
        out.insert("$databaseId".into(), json!(self.database_id));
        out.insert("$collectionId".into(), json!(self.collection_id));
        out.insert("$createdAt".into(), json!(timestamp(self.created_at)));
        out.insert("$updatedAt".into(), json!(timestamp(self.updated_at)));
        out.insert("$permissions".into(), json!(self.permissions));
        Value::Object(out)
    }

    fn allows(&self, action: &str, caller: &Caller) -> bool {
        match caller {
            Caller::Admin => true,
            Caller::User(user_id) => {
                self.permissions.contains(&format!("{action}(\"user:{user_id}\")"))
                    || self.permissions.contains(&format!("{action}(\"users\")"))
                    || self.permissions.contains(&format!("{action}(\"any\")"))
            }
            Caller::Guest => self.permissions.contains(&format!("{action}(\"any\")")),
        }
    }

    fn in_collection(&self, database_id: &str, collection_id: &str) -> bool {
        self.database_id == database_id && self.collection_id == collection_id
    }
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, SessionRecord>,
    documents: HashMap<String, Document>,
    next_seq: u64,
    failed_session_creates: u32,
}

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

/// Who a request acts as, resolved from its credential headers.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Caller {
    Admin,
    User(String),
    Guest,
}

/// Error body in the backend's `{message, code, type}` shape.
#[derive(Debug)]
struct Failure {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "general_unauthorized_scope",
            "The current user is not authorized to perform the requested action.",
        )
    }

    fn document_not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "document_not_found",
            "Document with the requested ID could not be found.",
        )
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "message": self.message,
            "code": self.status.as_u16(),
            "type": self.kind,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route("/v1/account", get(get_account).post(create_account))
        .route("/v1/account/sessions/email", post(create_email_session))
        .route(
            "/v1/account/sessions/current",
            delete(delete_current_session),
        )
        .route(
            "/v1/databases/{database_id}/collections/{collection_id}/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/v1/databases/{database_id}/collections/{collection_id}/documents/{document_id}",
            patch(update_document).delete(delete_document),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn resolve_id(requested: &str) -> String {
    if requested == UNIQUE_ID {
        Uuid::new_v4().simple().to_string()
    } else {
        requested.to_string()
    }
}

/// Check the project header, then decide who the caller is. An API key takes
/// precedence; an unknown or expired session is an error, not a guest.
async fn caller(state: &AppState, headers: &HeaderMap) -> Result<Caller, Failure> {
    if header(headers, PROJECT_HEADER) != Some(state.config.project_id.as_str()) {
        return Err(Failure::new(
            StatusCode::NOT_FOUND,
            "project_not_found",
            "Project with the requested ID could not be found.",
        ));
    }

    if let Some(key) = header(headers, API_KEY_HEADER) {
        if key == state.config.api_key {
            return Ok(Caller::Admin);
        }
        return Err(Failure::new(
            StatusCode::UNAUTHORIZED,
            "user_unauthorized",
            "Invalid API key.",
        ));
    }

    let Some(secret) = header(headers, SESSION_HEADER) else {
        return Ok(Caller::Guest);
    };
    let store = state.store.read().await;
    match store.sessions.get(secret) {
        Some(session) if session.expire > Utc::now() => Ok(Caller::User(session.user_id.clone())),
        _ => Err(Failure::new(
            StatusCode::UNAUTHORIZED,
            "user_session_not_found",
            "The current user session could not be found.",
        )),
    }
}

// --- account ---

#[derive(Deserialize)]
struct CreateAccount {
    #[serde(rename = "userId")]
    user_id: String,
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateAccount>,
) -> Result<(StatusCode, Json<User>), Failure> {
    if let Caller::User(_) = caller(&state, &headers).await? {
        return Err(Failure::new(
            StatusCode::UNAUTHORIZED,
            "general_unauthorized_scope",
            "Signed-in users cannot create accounts.",
        ));
    }
    if !input.email.contains('@') {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "general_argument_invalid",
            "Invalid `email` param: Value must be a valid email address",
        ));
    }
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "general_argument_invalid",
            "Invalid `password` param: Password must be at least 8 characters",
        ));
    }

    let mut store = state.store.write().await;
    let email = input.email.to_lowercase();
    let id = resolve_id(&input.user_id);
    if store.accounts.contains_key(&id) || store.accounts.values().any(|a| a.user.email == email) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            "user_already_exists",
            "A user with the same id, email, or phone already exists in this project.",
        ));
    }

    let user = User {
        id: id.clone(),
        name: input.name,
        email,
    };
    store.accounts.insert(
        id,
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    debug!(user = %user.id, "account created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
struct EmailPassword {
    email: String,
    password: String,
}

async fn create_email_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EmailPassword>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let caller = caller(&state, &headers).await?;

    let mut store = state.store.write().await;
    if store.failed_session_creates < state.config.fail_session_creates {
        store.failed_session_creates += 1;
        return Err(Failure::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "general_server_error",
            "Server Error",
        ));
    }
    let email = input.email.to_lowercase();
    let user_id = store
        .accounts
        .values()
        .find(|a| a.user.email == email && a.password == input.password)
        .map(|a| a.user.id.clone())
        .ok_or_else(|| {
            Failure::new(
                StatusCode::UNAUTHORIZED,
                "user_invalid_credentials",
                "Invalid credentials. Please check the email and password.",
            )
        })?;

    let secret = Uuid::new_v4().simple().to_string();
    let session = SessionRecord {
        id: Uuid::new_v4().simple().to_string(),
        user_id,
        expire: Utc::now() + chrono::Duration::days(365),
    };
    let body = json!({
        "$id": session.id,
        "$createdAt": timestamp(Utc::now()),
        "userId": session.user_id,
        "expire": timestamp(session.expire),
        "provider": "email",
        // Only server-side (API key) callers get to see the secret.
        "secret": if caller == Caller::Admin { secret.clone() } else { String::new() },
    });
    store.sessions.insert(secret, session);
    Ok((StatusCode::CREATED, Json(body)))
}

async fn delete_current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, Failure> {
    if state.config.fail_session_delete {
        return Err(Failure::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "general_server_error",
            "Server Error",
        ));
    }
    let Caller::User(_) = caller(&state, &headers).await? else {
        return Err(Failure::unauthorized());
    };
    if let Some(secret) = header(&headers, SESSION_HEADER) {
        let mut store = state.store.write().await;
        if let Some(session) = store.sessions.remove(secret) {
            debug!(session = %session.id, "session deleted");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn get_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, Failure> {
    let Caller::User(user_id) = caller(&state, &headers).await? else {
        return Err(Failure::unauthorized());
    };
    let store = state.store.read().await;
    store
        .accounts
        .get(&user_id)
        .map(|a| Json(a.user.clone()))
        .ok_or_else(Failure::unauthorized)
}

// --- documents ---

#[derive(Deserialize)]
struct CreateDocument {
    #[serde(rename = "documentId")]
    document_id: String,
    data: Map<String, Value>,
    #[serde(default)]
    permissions: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct UpdateDocument {
    #[serde(default)]
    data: Map<String, Value>,
}

async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((database_id, collection_id)): Path<(String, String)>,
    Json(input): Json<CreateDocument>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let caller = caller(&state, &headers).await?;
    // Without explicit permissions the creating user owns the document.
    let permissions = match (input.permissions, &caller) {
        (_, Caller::Guest) => return Err(Failure::unauthorized()),
        (Some(permissions), _) => permissions,
        (None, Caller::User(user_id)) => ["read", "update", "delete"]
            .iter()
            .map(|action| format!("{action}(\"user:{user_id}\")"))
            .collect(),
        (None, Caller::Admin) => Vec::new(),
    };

    let mut store = state.store.write().await;
    let id = resolve_id(&input.document_id);
    if store.documents.contains_key(&id) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            "document_already_exists",
            "Document with the requested ID already exists.",
        ));
    }

    let now = Utc::now();
    let seq = store.next_seq;
    store.next_seq += 1;
    let doc = Document {
        id: id.clone(),
        database_id,
        collection_id,
        created_at: now,
        updated_at: now,
        permissions,
        data: input.data,
        seq,
    };
    let body = doc.to_json();
    store.documents.insert(id, doc);
    Ok((StatusCode::CREATED, Json(body)))
}

async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((database_id, collection_id)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, Failure> {
    let caller = caller(&state, &headers).await?;
    let store = state.store.read().await;

    let mut docs: Vec<&Document> = store
        .documents
        .values()
        .filter(|d| d.in_collection(&database_id, &collection_id) && d.allows("read", &caller))
        .collect();
    docs.sort_by_key(|d| (d.created_at, d.seq));

    for (key, query) in &params {
        if key != "queries[]" {
            continue;
        }
        match query.as_str() {
            r#"orderDesc("$createdAt")"# => docs.reverse(),
            r#"orderAsc("$createdAt")"# => {}
            other => {
                return Err(Failure::new(
                    StatusCode::BAD_REQUEST,
                    "general_query_invalid",
                    format!("Invalid query: {other}"),
                ))
            }
        }
    }

    let documents: Vec<Value> = docs.iter().map(|d| d.to_json()).collect();
    Ok(Json(json!({ "total": documents.len(), "documents": documents })))
}

async fn update_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((database_id, collection_id, document_id)): Path<(String, String, String)>,
    Json(input): Json<UpdateDocument>,
) -> Result<Json<Value>, Failure> {
    let caller = caller(&state, &headers).await?;
    let mut store = state.store.write().await;
    let doc = store
        .documents
        .get_mut(&document_id)
        .filter(|d| d.in_collection(&database_id, &collection_id) && d.allows("read", &caller))
        .ok_or_else(Failure::document_not_found)?;
    if !doc.allows("update", &caller) {
        return Err(Failure::unauthorized());
    }
    for (field, value) in input.data {
        if !field.starts_with('$') {
            doc.data.insert(field, value);
        }
    }
    doc.updated_at = Utc::now();
    Ok(Json(doc.to_json()))
}

async fn delete_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((database_id, collection_id, document_id)): Path<(String, String, String)>,
) -> Result<StatusCode, Failure> {
    let caller = caller(&state, &headers).await?;
    let mut store = state.store.write().await;
    let doc = store
        .documents
        .get(&document_id)
        .filter(|d| d.in_collection(&database_id, &collection_id) && d.allows("read", &caller))
        .ok_or_else(Failure::document_not_found)?;
    if !doc.allows("delete", &caller) {
        return Err(Failure::unauthorized());
    }
    store.documents.remove(&document_id);
    Ok(StatusCode::NO_CONTENT)
}
