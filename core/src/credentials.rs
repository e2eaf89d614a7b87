//! Credential contexts for outbound backend calls.
//!
//! Every request leaves with the project header plus exactly one credential
//! header. Which one is decided by the `Credentials` variant the caller picked;
//! there is no default and no fallback from one kind to the other.

use std::fmt;

pub const PROJECT_HEADER: &str = "x-appwrite-project";
pub const SESSION_HEADER: &str = "x-appwrite-session";
pub const API_KEY_HEADER: &str = "x-appwrite-key";

/// Privilege level of a call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Acts as one end-user, identified by the session secret from their cookie.
    Session { token: String },
    /// Acts as the whole project, using the server API key.
    Admin { api_key: String },
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Session { .. } => "session",
            Credentials::Admin { .. } => "admin",
        }
    }

    fn header(&self) -> (&'static str, &str) {
        match self {
            Credentials::Session { token } => (SESSION_HEADER, token),
            Credentials::Admin { api_key } => (API_KEY_HEADER, api_key),
        }
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Session { .. } => f.write_str("Session { token: <redacted> }"),
            Credentials::Admin { .. } => f.write_str("Admin { api_key: <redacted> }"),
        }
    }
}

/// Endpoint, project and credentials for one outbound call.
#[derive(Debug, Clone)]
pub struct CredentialContext {
    endpoint: String,
    project_id: String,
    credentials: Credentials,
}

impl CredentialContext {
    pub fn session(endpoint: &str, project_id: &str, token: impl Into<String>) -> Self {
        Self::new(endpoint, project_id, Credentials::Session { token: token.into() })
    }

    pub fn admin(endpoint: &str, project_id: &str, api_key: impl Into<String>) -> Self {
        Self::new(endpoint, project_id, Credentials::Admin { api_key: api_key.into() })
    }

    fn new(endpoint: &str, project_id: &str, credentials: Credentials) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            credentials,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Headers every request made under this context must carry.
    pub fn headers(&self) -> Vec<(String, String)> {
        let (name, value) = self.credentials.header();
        vec![
            (PROJECT_HEADER.to_string(), self.project_id.clone()),
            (name.to_string(), value.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_context_sends_only_the_session_header() {
        let ctx = CredentialContext::session("http://backend/v1/", "proj", "s3cret");
        let headers = ctx.headers();
        assert_eq!(ctx.endpoint(), "http://backend/v1");
        assert!(headers.contains(&(PROJECT_HEADER.to_string(), "proj".to_string())));
        assert!(headers.contains(&(SESSION_HEADER.to_string(), "s3cret".to_string())));
        assert!(!headers.iter().any(|(k, _)| k == API_KEY_HEADER));
    }

    #[test]
    fn admin_context_sends_only_the_key_header() {
        let ctx = CredentialContext::admin("http://backend/v1", "proj", "key");
        let headers = ctx.headers();
        assert!(headers.contains(&(API_KEY_HEADER.to_string(), "key".to_string())));
        assert!(!headers.iter().any(|(k, _)| k == SESSION_HEADER));
        assert_eq!(ctx.credentials().kind(), "admin");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let ctx = CredentialContext::session("http://backend", "proj", "s3cret");
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("s3cret"));
        let admin = Credentials::Admin { api_key: "key-123".to_string() };
        assert!(!format!("{admin:?}").contains("key-123"));
    }
}
