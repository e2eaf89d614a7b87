//! Credential client factory.
//!
//! Two constructors, one per privilege level. Callers name the level they
//! need; a missing session never turns into an admin client. Every client is
//! built fresh for the call that needs it, including its HTTP connection pool,
//! so credentials never outlive the request that supplied them.

use std::sync::Arc;

use baas_client::{
    ApiError, BackendClient, CredentialContext, HttpMethod, HttpRequest, HttpResponse,
};
use tracing::debug;

use crate::{
    config::Config,
    context::RequestContext,
    cookies::session_token,
    error::{AppError, CallError},
};

#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: Arc<Config>,
}

impl ClientFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Client acting as the end-user identified by the request's session cookie.
    pub fn session_client(&self, ctx: &RequestContext) -> Result<Client, AppError> {
        let token = session_token(ctx).ok_or(AppError::NoSession)?;
        self.ensure_complete()?;
        Ok(Client::new(CredentialContext::session(
            &self.config.endpoint,
            &self.config.project_id,
            token.into_inner(),
        )))
    }

    /// Client acting with the project API key.
    pub fn admin_client(&self) -> Result<Client, AppError> {
        self.ensure_complete()?;
        Ok(Client::new(CredentialContext::admin(
            &self.config.endpoint,
            &self.config.project_id,
            self.config.api_key.clone(),
        )))
    }

    fn ensure_complete(&self) -> Result<(), AppError> {
        let missing = self.config.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::ConfigurationIncomplete(missing))
        }
    }
}

/// A backend client plus the transport that executes its requests.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    backend: BackendClient,
}

impl Client {
    fn new(context: CredentialContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend: BackendClient::new(context),
        }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// `"session"` or `"admin"`.
    pub fn privilege(&self) -> &'static str {
        self.backend.context().credentials().kind()
    }

    /// Execute a built request and parse the response with the matching
    /// `BackendClient::parse_*` method.
    pub async fn call<T, F>(&self, request: HttpRequest, parse: F) -> Result<T, CallError>
    where
        F: FnOnce(&BackendClient, HttpResponse) -> Result<T, ApiError>,
    {
        let response = self.execute(request).await?;
        Ok(parse(&self.backend, response)?)
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        debug!(method = request.method.as_str(), privilege = self.privilege(), "backend call");

        let mut builder = self.http.request(method, &request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
