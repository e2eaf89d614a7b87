//! Resource operations: authentication and todo CRUD against the backend.
//!
//! Each method picks its privilege level explicitly. Account and session
//! creation run with the admin client; everything done on behalf of a
//! signed-in user runs with the session client built from their cookie.

use std::sync::Arc;

use baas_client::{
    owner_permissions, BackendClient, EmailPassword, NewAccount, SessionToken, TodoFields, TodoItem,
    User,
};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    context::RequestContext,
    cookies::clear_session_cookie,
    credentials::ClientFactory,
    error::{AppError, CallError},
};

#[derive(Debug, Clone)]
pub struct TodoService {
    config: Arc<Config>,
    clients: ClientFactory,
}

impl TodoService {
    pub fn new(config: Arc<Config>) -> Self {
        let clients = ClientFactory::new(config.clone());
        Self { config, clients }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create the account, then open a session for it.
    ///
    /// The two steps are not atomic: if the session step fails the account
    /// stays behind and the user has to sign in separately.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SessionToken, AppError> {
        let admin = self.clients.admin_client()?;

        let req = admin
            .backend()
            .build_create_account(&NewAccount::new(email, password, name))
            .map_err(|e| {
                error!(operation = "sign up", error = %e, "could not build account request");
                AppError::SignUpFailed
            })?;
        let user = admin
            .call(req, BackendClient::parse_create_account)
            .await
            .map_err(|e| {
                error!(operation = "sign up", error = %e, "account creation failed");
                AppError::SignUpFailed
            })?;
        info!(user = %user.id, "account created");

        self.create_session(email, password).await.map_err(|e| {
            error!(
                operation = "sign up",
                user = %user.id,
                error = %e,
                "account created but session creation failed"
            );
            AppError::SignUpFailed
        })
    }

    /// Wrong password and unknown account both come back as `SignInFailed`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionToken, AppError> {
        match self.create_session(email, password).await {
            Ok(token) => Ok(token),
            Err(e @ AppError::ConfigurationIncomplete(_)) => Err(e),
            Err(e) => {
                warn!(operation = "sign in", error = %e, "sign-in rejected");
                Err(AppError::SignInFailed)
            }
        }
    }

    async fn create_session(&self, email: &str, password: &str) -> Result<SessionToken, AppError> {
        let admin = self.clients.admin_client()?;
        let credentials = EmailPassword {
            email: email.to_string(),
            password: password.to_string(),
        };
        let req = admin
            .backend()
            .build_create_email_session(&credentials)
            .map_err(|e| AppError::backend("create session", None, e))?;
        let session = admin
            .call(req, BackendClient::parse_create_email_session)
            .await
            .map_err(|e| AppError::backend("create session", None, e))?;

        if session.secret.is_empty() {
            error!(session = %session.id, "backend returned a session without a secret");
            return Err(AppError::SignInFailed);
        }
        Ok(SessionToken::new(session.secret))
    }

    /// Revoke the session at the backend and clear the cookie. Backend
    /// failures are logged; the cookie is cleared regardless.
    pub async fn sign_out(&self, ctx: &RequestContext) {
        match self.clients.session_client(ctx) {
            Ok(client) => {
                let req = client.backend().build_delete_current_session();
                if let Err(e) = client
                    .call(req, BackendClient::parse_delete_current_session)
                    .await
                {
                    warn!(operation = "sign out", error = %e, "backend session revocation failed");
                }
            }
            Err(e) => warn!(operation = "sign out", error = %e, "no session to revoke"),
        }
        clear_session_cookie(ctx);
    }

    /// The signed-in user, or `None` for any failure at all.
    pub async fn current_user(&self, ctx: &RequestContext) -> Option<User> {
        let client = self.clients.session_client(ctx).ok()?;
        let req = client.backend().build_get_account();
        match client.call(req, BackendClient::parse_get_account).await {
            Ok(user) => Some(user),
            Err(e) => {
                info!(error = %e, "session did not resolve to a user");
                None
            }
        }
    }

    async fn require_user(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.current_user(ctx).await.ok_or(AppError::Unauthenticated)
    }

    pub async fn create_todo(&self, ctx: &RequestContext, title: &str) -> Result<TodoItem, AppError> {
        let user = self.require_user(ctx).await?;
        let client = self.clients.session_client(ctx)?;
        let fields = TodoFields {
            title: title.to_string(),
            is_completed: false,
        };

        let result = match client.backend().build_create_document(
            &self.config.collection(),
            &fields,
            owner_permissions(&user.id),
        ) {
            Ok(req) => client.call(req, BackendClient::parse_create_document).await,
            Err(e) => Err(e.into()),
        };
        result.map_err(|e| {
            error!(operation = "create todo", error = %e, "backend call failed");
            AppError::backend("create todo", None, e)
        })
    }

    /// Newest first, fetched fresh on every call.
    pub async fn list_todos(&self, ctx: &RequestContext) -> Result<Vec<TodoItem>, AppError> {
        self.list_todos_for_user(ctx).await.map(|(_, todos)| todos)
    }

    /// Like [`TodoService::list_todos`], also returning the user the session
    /// resolved to so pages need only one identity lookup.
    pub async fn list_todos_for_user(
        &self,
        ctx: &RequestContext,
    ) -> Result<(User, Vec<TodoItem>), AppError> {
        let user = self.require_user(ctx).await?;
        let client = self.clients.session_client(ctx)?;
        let req = client.backend().build_list_documents(&self.config.collection());
        let todos = client
            .call(req, BackendClient::parse_list_documents)
            .await
            .map_err(|e| {
                error!(operation = "list todos", error = %e, "backend call failed");
                AppError::backend("list todos", None, e)
            })?;
        Ok((user, todos))
    }

    /// Overwrites title and completion flag. Ownership is enforced by the
    /// backend's document permissions, not here.
    pub async fn update_todo(
        &self,
        ctx: &RequestContext,
        id: &str,
        title: &str,
        is_completed: bool,
    ) -> Result<TodoItem, AppError> {
        let client = self.clients.session_client(ctx)?;
        let fields = TodoFields {
            title: title.to_string(),
            is_completed,
        };

        let result = match client
            .backend()
            .build_update_document(&self.config.collection(), id, &fields)
        {
            Ok(req) => client.call(req, BackendClient::parse_update_document).await,
            Err(e) => Err(e.into()),
        };
        result.map_err(|e| document_failure("update todo", id, e))
    }

    pub async fn delete_todo(&self, ctx: &RequestContext, id: &str) -> Result<(), AppError> {
        let client = self.clients.session_client(ctx)?;
        let req = client
            .backend()
            .build_delete_document(&self.config.collection(), id);
        client
            .call(req, BackendClient::parse_delete_document)
            .await
            .map_err(|e| document_failure("delete todo", id, e))
    }
}

/// A rejected session surfaces as `Unauthenticated` so the caller is sent to
/// sign-in; anything else is a backend failure.
fn document_failure(operation: &'static str, id: &str, e: CallError) -> AppError {
    if e.is_unauthorized() {
        warn!(operation, id, "session rejected by the backend");
        return AppError::Unauthenticated;
    }
    error!(operation, id, error = %e, "backend call failed");
    AppError::backend(operation, Some(id), e)
}
