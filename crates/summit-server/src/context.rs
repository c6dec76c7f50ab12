//! Request context: caller identity and request ids.
//!
//! Authentication happens upstream. A trusted proxy forwards the identity in
//! `X-User-Id`, `X-User-Email` and `X-User-Name`; this module turns those
//! headers into a [`Caller`] and echoes an `x-request-id` on every response.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, HeaderValue, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use summit_core::{Caller, UserId};

use crate::error::ApiError;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the user's e-mail address.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Header carrying the user's nickname.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Per-request context stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing/correlation
    pub request_id: String,
    /// Authenticated caller, if the proxy supplied one
    pub caller: Option<Caller>,
}

impl RequestContext {
    fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = header_string(headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| ulid::Ulid::new().to_string());
        Self { request_id, caller: caller_from_headers(headers) }
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Option<Caller> {
    let user_id = UserId::new(header_string(headers, USER_ID_HEADER)?).ok()?;
    let email = header_string(headers, USER_EMAIL_HEADER).unwrap_or_default();
    let nickname = header_string(headers, USER_NAME_HEADER).unwrap_or_default();
    Some(Caller::new(user_id, email, nickname))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

fn add_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
}

/// Middleware that injects a [`RequestContext`] and echoes the request ID.
pub async fn context_middleware(req: Request<Body>, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let ctx = RequestContext::from_headers(&parts.headers);
    let request_id = ctx.request_id.clone();

    tracing::debug!(
        request_id = %request_id,
        user = ctx.caller.as_ref().map(|caller| caller.user_id.as_str()),
        "request context"
    );
    parts.extensions.insert(ctx);

    let mut response = next.run(Request::from_parts(parts, body)).await;
    add_request_id_header(&mut response, &request_id);
    response
}

/// Extractor for routes that need an authenticated caller.
///
/// Rejects with `401` when the proxy supplied no identity.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Caller);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.caller.clone())
            .map(Self)
            .ok_or(ApiError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_requires_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("ada@example.com"));
        assert!(caller_from_headers(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("ada"));
        let caller = caller_from_headers(&headers).unwrap();
        assert_eq!(caller.user_id.as_str(), "ada");
        assert_eq!(caller.email, "ada@example.com");
        assert_eq!(caller.nickname, "ada");
    }

    #[test]
    fn request_id_is_generated_when_absent() {
        let ctx = RequestContext::from_headers(&HeaderMap::new());
        assert_eq!(ctx.request_id.len(), 26);

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        assert_eq!(RequestContext::from_headers(&headers).request_id, "req-1");
    }
}
