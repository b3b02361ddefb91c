//! Admin API: bearer-protected JSON endpoints for domain and alias records.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/negotiate", get(negotiate_host))
        .route("/admin/domains", get(list_domains).post(create_domain))
        .route("/admin/domains/options", get(domain_options))
        .route(
            "/admin/domains/{id}",
            get(get_domain).patch(update_domain).delete(delete_domain),
        )
        .route("/admin/domains/{id}/default", post(set_default_domain))
        .route(
            "/admin/domains/{id}/aliases",
            get(list_domain_aliases).delete(delete_domain_aliases),
        )
        .route("/admin/aliases", get(list_aliases).post(create_alias))
        .route(
            "/admin/aliases/{id}",
            get(get_alias).patch(update_alias).delete(delete_alias),
        )
        .route(
            "/admin/overrides/{domain_id}/{name}",
            put(put_override).delete(delete_override),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API starting");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    tracing::info!("Admin API stopped");
    Ok(())
}
