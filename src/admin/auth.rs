use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::request::is_privileged;
use crate::http::server::AppState;

/// Reject requests without `Authorization: Bearer <admin.api_key>`.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let inner = state.load();
    if is_privileged(request.headers(), &inner.config.admin.api_key) {
        return Ok(next.run(request).await);
    }
    tracing::warn!(path = %request.uri().path(), "Unauthorized admin request");
    Err(StatusCode::UNAUTHORIZED)
}
