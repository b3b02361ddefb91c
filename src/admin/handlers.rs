use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::alias::{AliasError, AliasFilter, AliasPatch, AliasRecord, AliasValues};
use crate::domain::{DomainError, DomainPatch, DomainRecord, DomainValues};
use crate::http::request::scheme_from_parts;
use crate::http::server::AppState;
use crate::negotiation::{NegotiationError, NegotiationResult};
use crate::registry::RegistryError;

/// Error body returned by every admin endpoint.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let status = match e {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::DuplicateHostname(_) | DomainError::DuplicateId(_) => StatusCode::CONFLICT,
            DomainError::InvalidHostname(_) | DomainError::DefaultRequired(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self { status, message: e.to_string() }
    }
}

impl From<AliasError> for ApiError {
    fn from(e: AliasError) -> Self {
        let status = match e {
            AliasError::NotFound(_) => StatusCode::NOT_FOUND,
            AliasError::DuplicatePattern { .. } | AliasError::DuplicateId(_) => StatusCode::CONFLICT,
            AliasError::InvalidPattern(_) | AliasError::UnknownDomain(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self { status, message: e.to_string() }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Domain(e) => e.into(),
            RegistryError::Alias(e) => e.into(),
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(e: NegotiationError) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: e.to_string() }
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub domains: usize,
    pub aliases: usize,
    pub default_domain: Option<String>,
    pub overrides: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        domains: inner.registry.domains().count(),
        aliases: inner.registry.aliases().count(),
        default_domain: inner.registry.domains().find_default_id(),
        overrides: inner.overrides.len(),
    })
}

#[derive(Debug, Deserialize)]
pub struct NegotiateQuery {
    pub host: String,
}

/// Dry-run negotiation for an arbitrary host.
pub async fn negotiate_host(
    State(state): State<AppState>,
    Query(query): Query<NegotiateQuery>,
) -> ApiResult<Json<NegotiationResult>> {
    let inner = state.load();
    Ok(Json(inner.negotiator.negotiate(&query.host)?))
}

pub async fn list_domains(State(state): State<AppState>) -> Json<Vec<DomainRecord>> {
    Json(state.load().registry.domains().list_sorted())
}

pub async fn domain_options(State(state): State<AppState>) -> Json<Value> {
    let options: serde_json::Map<String, Value> = state
        .load()
        .registry
        .domains()
        .load_options_list()
        .into_iter()
        .map(|(id, name)| (id, Value::String(name)))
        .collect();
    Json(Value::Object(options))
}

pub async fn get_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DomainRecord>> {
    state
        .load()
        .registry
        .domains()
        .get(&id)
        .map(Json)
        .ok_or_else(|| DomainError::NotFound(id).into())
}

/// Records without a `scheme` take the scheme of the admin request.
pub async fn create_domain(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(values): Json<DomainValues>,
) -> ApiResult<(StatusCode, Json<DomainRecord>)> {
    let scheme = scheme_from_parts(&headers, &uri);
    let domain = state.load().registry.create_domain(values, Some(scheme))?;
    tracing::info!(domain_id = %domain.id, hostname = %domain.hostname, "Domain created");
    Ok((StatusCode::CREATED, Json(domain)))
}

pub async fn update_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<DomainPatch>,
) -> ApiResult<Json<DomainRecord>> {
    let domain = state.load().registry.update_domain(&id, patch)?;
    tracing::info!(domain_id = %domain.id, "Domain updated");
    Ok(Json(domain))
}

pub async fn set_default_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DomainRecord>> {
    let domain = state.load().registry.set_default(&id)?;
    tracing::info!(domain_id = %domain.id, "Default domain changed");
    Ok(Json(domain))
}

#[derive(Serialize)]
pub struct DeletedDomain {
    pub domain: DomainRecord,
    pub aliases: Vec<AliasRecord>,
}

pub async fn delete_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedDomain>> {
    let inner = state.load();
    let (domain, aliases) = inner.registry.delete_domain(&id)?;
    inner.overrides.remove_domain(&domain.id);
    tracing::info!(domain_id = %domain.id, aliases = aliases.len(), "Domain deleted");
    Ok(Json(DeletedDomain { domain, aliases }))
}

pub async fn list_domain_aliases(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AliasRecord>>> {
    let inner = state.load();
    if inner.registry.domains().get(&id).is_none() {
        return Err(DomainError::NotFound(id).into());
    }
    let filter = AliasFilter {
        domain_id: Some(id),
        ..Default::default()
    };
    Ok(Json(inner.registry.aliases().load_by_filter(&filter)))
}

/// Bulk delete of a domain's aliases, optionally narrowed by environment
/// and redirect.
pub async fn delete_domain_aliases(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(filter): Query<AliasFilter>,
) -> ApiResult<Json<Vec<AliasRecord>>> {
    let deleted = state.load().registry.delete_aliases_bulk(&id, &filter)?;
    tracing::info!(domain_id = %id, count = deleted.len(), "Aliases deleted");
    Ok(Json(deleted))
}

pub async fn list_aliases(
    State(state): State<AppState>,
    Query(filter): Query<AliasFilter>,
) -> Json<Vec<AliasRecord>> {
    Json(state.load().registry.aliases().load_by_filter(&filter))
}

pub async fn get_alias(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AliasRecord>> {
    state
        .load()
        .registry
        .aliases()
        .get(&id)
        .map(Json)
        .ok_or_else(|| AliasError::NotFound(id).into())
}

pub async fn create_alias(
    State(state): State<AppState>,
    Json(values): Json<AliasValues>,
) -> ApiResult<(StatusCode, Json<AliasRecord>)> {
    let alias = state.load().registry.create_alias(values)?;
    tracing::info!(alias_id = %alias.id, pattern = %alias.pattern, domain_id = %alias.domain_id, "Alias created");
    Ok((StatusCode::CREATED, Json(alias)))
}

pub async fn update_alias(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<AliasPatch>,
) -> ApiResult<Json<AliasRecord>> {
    let alias = state.load().registry.update_alias(&id, patch)?;
    tracing::info!(alias_id = %alias.id, "Alias updated");
    Ok(Json(alias))
}

pub async fn delete_alias(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AliasRecord>> {
    let alias = state.load().registry.delete_alias(&id)?;
    tracing::info!(alias_id = %alias.id, "Alias deleted");
    Ok(Json(alias))
}

#[derive(Debug, Default, Deserialize)]
pub struct OverrideQuery {
    pub langcode: Option<String>,
}

pub async fn put_override(
    State(state): State<AppState>,
    Path((domain_id, name)): Path<(String, String)>,
    Query(query): Query<OverrideQuery>,
    Json(data): Json<Value>,
) -> ApiResult<StatusCode> {
    let inner = state.load();
    if inner.registry.domains().get(&domain_id).is_none() {
        return Err(DomainError::NotFound(domain_id).into());
    }
    inner.overrides.set(&domain_id, query.langcode.as_deref(), &name, data);
    tracing::info!(domain_id = %domain_id, name = %name, "Config override stored");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_override(
    State(state): State<AppState>,
    Path((domain_id, name)): Path<(String, String)>,
    Query(query): Query<OverrideQuery>,
) -> ApiResult<Json<Value>> {
    state
        .load()
        .overrides
        .remove(&domain_id, query.langcode.as_deref(), &name)
        .map(Json)
        .ok_or_else(|| ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("no override {} for domain {}", name, domain_id),
        })
}
