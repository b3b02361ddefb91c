//! Gateway responses.
//!
//! Maps redirect decisions and negotiation failures to HTTP responses and
//! tags passed-through responses with the negotiated domain.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::negotiation::NegotiationResult;
use crate::redirect::{RedirectDecision, REJECTED_STATUS};

pub const X_DOMAIN_ID: HeaderName = HeaderName::from_static("x-domain-id");
pub const X_DOMAIN_MATCH: HeaderName = HeaderName::from_static("x-domain-match");

/// Response for a decision, or `None` to let the request through.
pub fn decision_response(decision: &RedirectDecision) -> Option<Response> {
    match decision {
        RedirectDecision::PassThrough => None,
        RedirectDecision::Redirect { target_url, status } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::FOUND);
            let Ok(location) = HeaderValue::from_str(target_url) else {
                tracing::error!(target_url = %target_url, "Redirect target is not a valid header value");
                return Some(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            };
            Some((status, [(header::LOCATION, location)]).into_response())
        }
        RedirectDecision::Rejected(reason) => {
            let status = StatusCode::from_u16(REJECTED_STATUS).unwrap_or(StatusCode::UNAUTHORIZED);
            Some((status, reason.to_string()).into_response())
        }
    }
}

/// 503 for a request no domain can serve.
pub fn no_domain_response(host: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "no_domain_configured",
            "host": host,
        })),
    )
        .into_response()
}

/// Tag a passed-through response with the active domain.
pub fn tag_response(response: &mut Response, result: &NegotiationResult) {
    let headers = response.headers_mut();
    if let Ok(id) = HeaderValue::from_str(&result.domain.id) {
        headers.insert(X_DOMAIN_ID, id);
    }
    headers.insert(
        X_DOMAIN_MATCH,
        HeaderValue::from_static(result.match_type.as_str()),
    );
}
