//! Session cookie lifecycle.
//!
//! Setting the cookie is part of sign-in and fails loudly without a request
//! context. Clearing it is part of sign-out and never fails: a missing context
//! is logged and ignored.

use baas_client::SessionToken;
use tower_cookies::{cookie::SameSite, Cookie};
use tracing::{debug, warn};

use crate::{config::Environment, context::RequestContext, error::AppError};

pub const SESSION_COOKIE: &str = "todo_session";

/// `Secure` only for production deployments serving this request over TLS.
pub fn secure_flag(environment: Environment, tls: bool) -> bool {
    environment.is_production() && tls
}

/// HTTP-only, strict same-site, path `/`.
pub fn session_cookie(secret: &SessionToken, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, secret.as_str().to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie
}

/// Session secret carried by the request, if any. Empty values count as absent.
pub fn session_token(ctx: &RequestContext) -> Option<SessionToken> {
    let cookie = ctx.cookies()?.get(SESSION_COOKIE)?;
    let value = cookie.value();
    if value.is_empty() {
        return None;
    }
    Some(SessionToken::new(value))
}

pub fn set_session_cookie(
    ctx: &RequestContext,
    environment: Environment,
    secret: &SessionToken,
) -> Result<(), AppError> {
    let Some(cookies) = ctx.cookies() else {
        return Err(AppError::NoRequestContext);
    };
    let secure = secure_flag(environment, ctx.is_tls());
    cookies.add(session_cookie(secret, secure));
    debug!(secure, "session cookie set");
    Ok(())
}

pub fn clear_session_cookie(ctx: &RequestContext) {
    let Some(cookies) = ctx.cookies() else {
        warn!("no request context while clearing the session cookie");
        return;
    };
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    cookies.remove(removal);
    debug!("session cookie cleared");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_only_in_production_over_tls() {
        assert!(secure_flag(Environment::Production, true));
        assert!(!secure_flag(Environment::Production, false));
        assert!(!secure_flag(Environment::Development, true));
        assert!(!secure_flag(Environment::Development, false));
    }

    #[test]
    fn session_cookie_is_hardened() {
        let cookie = session_cookie(&SessionToken::new("abc"), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(false));
        assert!(session_cookie(&SessionToken::new("abc"), true).secure().unwrap_or(false));
    }

    #[test]
    fn set_without_request_context_fails() {
        let err = set_session_cookie(
            &RequestContext::detached(),
            Environment::Development,
            &SessionToken::new("abc"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NoRequestContext));
    }

    #[test]
    fn clear_without_request_context_is_a_no_op() {
        clear_session_cookie(&RequestContext::detached());
    }

    #[test]
    fn detached_context_has_no_token() {
        assert!(session_token(&RequestContext::detached()).is_none());
    }
}
