//! HTTP gateway setup.
//!
//! # Responsibilities
//! - Create the Axum router with the negotiation middleware in front of
//!   every route
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve until shutdown, swapping runtime state on config reload
//!
//! # Request lifecycle
//! ```text
//! Host header → RequestContext (memoized negotiation)
//!     → access (domain status or admin bearer token)
//!     → RedirectEngine::decide
//!     → redirect back to the requested host? pass through instead
//!     → 3xx + Location | 401 | pass through tagged with x-domain-id
//! NoDomainConfigured → 503 (reject) | pass through unscoped
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, UnmatchedPolicy};
use crate::http::request::{
    is_privileged, request_host, request_id, request_scheme, request_uri, MakeRequestUuid,
};
use crate::http::response::{decision_response, no_domain_response, tag_response};
use crate::negotiation::{MatchType, NegotiationError, NegotiationResult, Negotiator, RequestContext};
use crate::observability::metrics;
use crate::overrides::ConfigOverrides;
use crate::redirect::{RedirectDecision, RedirectEngine};
use crate::registry::{Registry, RegistryError};

/// Runtime state built from one configuration revision.
#[derive(Debug)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub registry: Registry,
    pub negotiator: Arc<Negotiator>,
    pub engine: RedirectEngine,
    pub overrides: ConfigOverrides,
}

impl GatewayState {
    pub fn from_config(config: GatewayConfig) -> Result<Self, RegistryError> {
        let registry = Registry::from_config(&config)?;
        let negotiator = Arc::new(registry.negotiator(&config.negotiation));
        let engine = RedirectEngine::new(
            negotiator.clone(),
            registry.domains().clone(),
            &config.negotiation,
        );
        let overrides = ConfigOverrides::from_config(&config.overrides);
        Ok(Self {
            config,
            registry,
            negotiator,
            engine,
            overrides,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<GatewayState>>,
}

impl AppState {
    pub fn new(state: GatewayState) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(state)),
        }
    }

    pub fn load(&self) -> Arc<GatewayState> {
        self.inner.load_full()
    }

    /// Rebuild the runtime state from a new configuration revision.
    pub fn reload(&self, config: GatewayConfig) -> Result<(), RegistryError> {
        let state = GatewayState::from_config(config)?;
        self.inner.store(Arc::new(state));
        Ok(())
    }
}

/// HTTP gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: GatewayConfig) -> Result<Self, RegistryError> {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState::new(GatewayState::from_config(config)?);
        let router = Self::build_router(request_timeout, state.clone());
        Ok(Self { router, state })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_timeout: Duration, state: AppState) -> Router {
        Router::new()
            .route("/_domain/info", get(domain_info))
            .route("/_domain/config/{name}", get(domain_config))
            .fallback(pass_through)
            .layer(middleware::from_fn_with_state(state.clone(), negotiate_request))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP gateway starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match state.reload(config) {
                    Ok(()) => {
                        let inner = state.load();
                        tracing::info!(
                            domains = inner.registry.domains().count(),
                            aliases = inner.registry.aliases().count(),
                            "Configuration reloaded"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected config reload, keeping current state");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP gateway stopped");
        Ok(())
    }
}

/// Negotiate the active domain and apply the redirect decision.
async fn negotiate_request(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let inner = state.load();
    let method = request.method().to_string();
    let request_id = request_id(request.headers()).to_string();

    let host = request_host(&request);
    let mut context = RequestContext::new(
        host.as_deref(),
        request_scheme(&request),
        request_uri(&request),
    );

    let response = match context.active_domain(&inner.negotiator, false).cloned() {
        Ok(result) => {
            metrics::record_negotiation(result.match_type);
            let privileged = is_privileged(request.headers(), &inner.config.admin.api_key);
            let allowed = inner.engine.policy().domain_access(&result.domain, privileged);
            let mut decision = inner.engine.decide(&result.domain, context.request_uri(), allowed);
            if decision.targets_host(context.host()) {
                tracing::warn!(
                    request_id = %request_id,
                    host = %context.host(),
                    domain_id = %result.domain.id,
                    target_url = decision.target_url().unwrap_or_default(),
                    "Redirect points back at the requested host, passing through"
                );
                decision = RedirectDecision::PassThrough;
            }

            match decision_response(&decision) {
                Some(response) => {
                    match &decision {
                        RedirectDecision::Redirect { target_url, status } => {
                            metrics::record_redirect(*status);
                            tracing::info!(
                                request_id = %request_id,
                                host = %context.host(),
                                domain_id = %result.domain.id,
                                target_url = %target_url,
                                status = status,
                                "Redirecting request"
                            );
                        }
                        RedirectDecision::Rejected(reason) => {
                            metrics::record_rejection();
                            tracing::warn!(
                                request_id = %request_id,
                                host = %context.host(),
                                reason = %reason,
                                "Rejected redirect"
                            );
                        }
                        RedirectDecision::PassThrough => {}
                    }
                    response
                }
                None => {
                    tracing::debug!(
                        request_id = %request_id,
                        host = %context.host(),
                        domain_id = %result.domain.id,
                        match_type = result.match_type.as_str(),
                        "Serving request"
                    );
                    request.extensions_mut().insert(result.clone());
                    request.extensions_mut().insert(context.clone());
                    let mut response = next.run(request).await;
                    tag_response(&mut response, &result);
                    response
                }
            }
        }
        Err(NegotiationError::NoDomainConfigured { host }) => {
            metrics::record_negotiation_failure();
            match inner.config.negotiation.unmatched_policy {
                UnmatchedPolicy::Reject => {
                    tracing::warn!(request_id = %request_id, host = %host, "No domain configured");
                    no_domain_response(&host)
                }
                UnmatchedPolicy::ServeUnscoped => next.run(request).await,
            }
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

fn no_active_domain() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "No domain record could be loaded." })),
    )
        .into_response()
}

/// Server information for the active domain.
async fn domain_info(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (Some(result), Some(context)) = (
        request.extensions().get::<NegotiationResult>(),
        request.extensions().get::<RequestContext>(),
    ) else {
        return no_active_domain();
    };
    let inner = state.load();

    let domain_match = match (result.match_type, &result.alias) {
        (MatchType::Exact, _) => "Exact match".to_string(),
        (MatchType::Alias, Some(alias)) => format!("ALIAS: Using alias {}", alias.pattern),
        (MatchType::Alias, None) => "Resolver match".to_string(),
        (MatchType::None, _) => "FALSE: Using default domain.".to_string(),
    };

    Json(json!({
        "requested_host": result.requested_host,
        "hostname": result.hostname,
        "domain_match": domain_match,
        "match_type": result.match_type,
        "environment": result.environment(),
        "canonical": result.domain.canonical(),
        "base_path": result.domain.path(),
        "request_scheme": context.scheme(),
        "current_url": result.domain.url(context.request_uri()),
        "strip_www_prefix": inner.negotiator.strip_www_prefix(),
        "domain": result.domain,
    }))
    .into_response()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigQuery {
    langcode: Option<String>,
}

/// Effective configuration overrides of the active domain.
async fn domain_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ConfigQuery>,
    request: Request<Body>,
) -> Response {
    let Some(result) = request.extensions().get::<NegotiationResult>() else {
        return no_active_domain();
    };
    let inner = state.load();
    let domain_id = result.domain.id.as_str();
    let langcode = query.langcode.as_deref();

    Json(json!({
        "domain_id": domain_id,
        "name": name,
        "langcode": langcode,
        "overridden": inner.overrides.has_override(domain_id, langcode, &name),
        "data": inner.overrides.resolve(domain_id, langcode, &name, Value::Object(Default::default())),
    }))
    .into_response()
}

/// Default handler for requests the gateway lets through.
async fn pass_through(request: Request<Body>) -> Response {
    let domain_id = request
        .extensions()
        .get::<NegotiationResult>()
        .map(|r| r.domain.id.clone());
    Json(json!({
        "status": "ok",
        "domain_id": domain_id,
        "path": request.uri().path(),
    }))
    .into_response()
}
