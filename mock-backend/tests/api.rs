use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_backend::{app, app_with, MockConfig, User, API_KEY_HEADER, PROJECT_HEADER, SESSION_HEADER};
use serde_json::Value;
use tower::ServiceExt;

const DOCS: &str = "/v1/databases/main/collections/todos/documents";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

enum As<'a> {
    Admin,
    Session(&'a str),
    Guest,
}

fn request(method: &str, uri: &str, who: As<'_>, body: Option<&str>) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(PROJECT_HEADER, "test-project");
    builder = match who {
        As::Admin => builder.header(API_KEY_HEADER, "test-key"),
        As::Session(secret) => builder.header(SESSION_HEADER, secret),
        As::Guest => builder,
    };
    match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .unwrap(),
        None => builder.body(String::new()).unwrap(),
    }
}

async fn call(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

/// Create an account and return a session secret for it.
async fn sign_up(app: &Router, email: &str) -> String {
    let body = format!(r#"{{"userId":"unique()","email":"{email}","password":"password123","name":"N"}}"#);
    let resp = call(app, request("POST", "/v1/account", As::Admin, Some(&body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = format!(r#"{{"email":"{email}","password":"password123"}}"#);
    let resp = call(app, request("POST", "/v1/account/sessions/email", As::Admin, Some(&body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: Value = body_json(resp).await;
    session["secret"].as_str().unwrap().to_string()
}

// --- project and credentials ---

#[tokio::test]
async fn unknown_project_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/account")
                .header(PROJECT_HEADER, "other")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_api_key_is_unauthorized() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(DOCS)
                .header(PROJECT_HEADER, "test-project")
                .header(API_KEY_HEADER, "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- account ---

#[tokio::test]
async fn create_account_returns_201() {
    let app = app();
    let body = r#"{"userId":"unique()","email":"Ann@Example.com","password":"password123","name":"Ann"}"#;
    let resp = call(&app, request("POST", "/v1/account", As::Admin, Some(body))).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: User = body_json(resp).await;
    assert_eq!(user.email, "ann@example.com");
    assert_eq!(user.name, "Ann");
    assert!(!user.id.is_empty());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = app();
    let body = r#"{"userId":"unique()","email":"a@example.com","password":"password123"}"#;
    let first = call(&app, request("POST", "/v1/account", As::Admin, Some(body))).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = call(&app, request("POST", "/v1/account", As::Admin, Some(body))).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let body = r#"{"userId":"unique()","email":"a@example.com","password":"short"}"#;
    let resp = call(&app(), request("POST", "/v1/account", As::Admin, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- sessions ---

#[tokio::test]
async fn bad_password_is_invalid_credentials() {
    let app = app();
    sign_up(&app, "a@example.com").await;
    let body = r#"{"email":"a@example.com","password":"wrong-password"}"#;
    let resp = call(&app, request("POST", "/v1/account/sessions/email", As::Admin, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let err: Value = body_json(resp).await;
    assert_eq!(err["type"], "user_invalid_credentials");
}

#[tokio::test]
async fn guest_session_has_no_secret() {
    let app = app();
    sign_up(&app, "a@example.com").await;
    let body = r#"{"email":"a@example.com","password":"password123"}"#;
    let resp = call(&app, request("POST", "/v1/account/sessions/email", As::Guest, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: Value = body_json(resp).await;
    assert_eq!(session["secret"], "");
}

#[tokio::test]
async fn session_resolves_current_account_until_deleted() {
    let app = app();
    let secret = sign_up(&app, "a@example.com").await;

    let resp = call(&app, request("GET", "/v1/account", As::Session(&secret), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.email, "a@example.com");

    let resp = call(
        &app,
        request("DELETE", "/v1/account/sessions/current", As::Session(&secret), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = call(&app, request("GET", "/v1/account", As::Session(&secret), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_requires_a_session() {
    let resp = call(&app(), request("GET", "/v1/account", As::Guest, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_delete_fault_returns_500() {
    let app = app_with(MockConfig {
        fail_session_delete: true,
        ..MockConfig::default()
    });
    let secret = sign_up(&app, "a@example.com").await;
    let resp = call(
        &app,
        request("DELETE", "/v1/account/sessions/current", As::Session(&secret), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn session_create_fault_applies_to_the_first_attempts_only() {
    let app = app_with(MockConfig {
        fail_session_creates: 1,
        ..MockConfig::default()
    });
    let body = r#"{"userId":"unique()","email":"b@example.com","password":"password123","name":"B"}"#;
    let resp = call(&app, request("POST", "/v1/account", As::Admin, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let login = r#"{"email":"b@example.com","password":"password123"}"#;
    let resp = call(&app, request("POST", "/v1/account/sessions/email", As::Admin, Some(login))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let resp = call(&app, request("POST", "/v1/account/sessions/email", As::Admin, Some(login))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

// --- documents ---

#[tokio::test]
async fn guest_cannot_create_documents() {
    let body = r#"{"documentId":"unique()","data":{"title":"x"}}"#;
    let resp = call(&app(), request("POST", DOCS, As::Guest, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn documents_are_private_to_their_owner() {
    let app = app();
    let alice = sign_up(&app, "alice@example.com").await;
    let bob = sign_up(&app, "bob@example.com").await;

    let body = r#"{"documentId":"unique()","data":{"title":"Alice's","isCompleted":false}}"#;
    let resp = call(&app, request("POST", DOCS, As::Session(&alice), Some(body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = body_json(resp).await;
    let id = created["$id"].as_str().unwrap().to_string();

    let resp = call(&app, request("GET", DOCS, As::Session(&bob), None)).await;
    let list: Value = body_json(resp).await;
    assert_eq!(list["total"], 0);

    let uri = format!("{DOCS}/{id}");
    let resp = call(&app, request("DELETE", &uri, As::Session(&bob), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(&app, request("GET", DOCS, As::Admin, None)).await;
    let list: Value = body_json(resp).await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn read_only_permission_blocks_update() {
    let app = app();
    let secret = sign_up(&app, "a@example.com").await;
    let resp = call(&app, request("GET", "/v1/account", As::Session(&secret), None)).await;
    let user: User = body_json(resp).await;

    let body = format!(
        r#"{{"documentId":"fixed","data":{{"title":"ro"}},"permissions":["read(\"user:{}\")"]}}"#,
        user.id
    );
    let resp = call(&app, request("POST", DOCS, As::Admin, Some(&body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = call(
        &app,
        request("PATCH", &format!("{DOCS}/fixed"), As::Session(&secret), Some(r#"{"data":{"title":"rw"}}"#)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_query_is_rejected() {
    let uri = format!("{DOCS}?queries%5B%5D=limit%2825%29");
    let resp = call(&app(), request("GET", &uri, As::Admin, None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full document lifecycle ---

#[tokio::test]
async fn document_lifecycle() {
    let app = app();
    let secret = sign_up(&app, "a@example.com").await;
    let newest_first = format!("{DOCS}?queries%5B%5D=orderDesc%28%22%24createdAt%22%29");

    // create two
    let mut ids = Vec::new();
    for title in ["Walk dog", "Buy milk"] {
        let body = format!(r#"{{"documentId":"unique()","data":{{"title":"{title}","isCompleted":false}}}}"#);
        let resp = call(&app, request("POST", DOCS, As::Session(&secret), Some(&body))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let doc: Value = body_json(resp).await;
        assert_eq!(doc["title"], title);
        assert!(doc["$createdAt"].is_string());
        ids.push(doc["$id"].as_str().unwrap().to_string());
    }

    // list, newest first
    let resp = call(&app, request("GET", &newest_first, As::Session(&secret), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Value = body_json(resp).await;
    assert_eq!(list["total"], 2);
    assert_eq!(list["documents"][0]["title"], "Buy milk");
    assert_eq!(list["documents"][1]["title"], "Walk dog");

    // update overwrites the sent fields
    let uri = format!("{DOCS}/{}", ids[0]);
    let resp = call(
        &app,
        request(
            "PATCH",
            &uri,
            As::Session(&secret),
            Some(r#"{"data":{"title":"Walk cat","isCompleted":true}}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = body_json(resp).await;
    assert_eq!(updated["title"], "Walk cat");
    assert_eq!(updated["isCompleted"], true);
    assert_eq!(updated["$id"], ids[0].as_str());

    // delete, then delete again
    let resp = call(&app, request("DELETE", &uri, As::Session(&secret), None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = call(&app, request("DELETE", &uri, As::Session(&secret), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(&app, request("GET", &newest_first, As::Session(&secret), None)).await;
    let list: Value = body_json(resp).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["documents"][0]["title"], "Buy milk");
}
