//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Extract what negotiation needs from the request (host, scheme, path)
//! - Recognize the admin bearer token

use axum::http::{header, HeaderMap, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::domain::Scheme;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID assigned by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Raw host of the request: the Host header, else the URI authority.
pub fn request_host<B>(request: &Request<B>) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
}

/// Scheme the client used, honoring `x-forwarded-proto` from a front proxy.
pub fn request_scheme<B>(request: &Request<B>) -> Scheme {
    scheme_from_parts(request.headers(), request.uri())
}

/// Same as [`request_scheme`], for handlers that extract headers and URI.
pub fn scheme_from_parts(headers: &HeaderMap, uri: &Uri) -> Scheme {
    headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Scheme::parse(v.split(',').next().unwrap_or_default().trim()))
        .or_else(|| uri.scheme_str().and_then(Scheme::parse))
        .unwrap_or_default()
}

/// Path and query of the request URI, `/` when absent.
pub fn request_uri<B>(request: &Request<B>) -> &str {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}

/// Bearer token of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// True when the request carries the configured admin key.
pub fn is_privileged(headers: &HeaderMap, api_key: &str) -> bool {
    !api_key.is_empty() && bearer_token(headers) == Some(api_key)
}
