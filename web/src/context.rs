//! Request-scoped view of the inbound request that the cookie and credential
//! code needs: the cookie jar and the transport security of the request.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Clone, Default)]
pub struct RequestContext {
    cookies: Option<Cookies>,
    tls: bool,
}

impl RequestContext {
    pub fn new(cookies: Option<Cookies>, tls: bool) -> Self {
        Self { cookies, tls }
    }

    /// No active request/response pair.
    pub fn detached() -> Self {
        Self::default()
    }

    /// `None` when the cookie layer is not installed on the route.
    pub fn cookies(&self) -> Option<&Cookies> {
        self.cookies.as_ref()
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }
}

/// The first `X-Forwarded-Proto` hop wins; without one, fall back to the
/// request URI scheme.
fn arrived_over_tls(parts: &Parts) -> bool {
    if let Some(proto) = parts.headers.get(FORWARDED_PROTO).and_then(|v| v.to_str().ok()) {
        let first = proto.split(',').next().unwrap_or_default().trim();
        return first.eq_ignore_ascii_case("https");
    }
    parts.uri.scheme_str() == Some("https")
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>().cloned();
        Ok(Self::new(cookies, arrived_over_tls(parts)))
    }
}
