use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use domainmap_router::{AliasRecord, DomainRecord, MapError, PatternError, ResolutionResult};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::middleware::RequestDomain;
use crate::models::*;
use crate::report::DomainReport;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

/// Map a validation failure onto an HTTP status
fn map_error(err: MapError) -> ApiError {
    let status = match &err {
        MapError::NotFound(..) => StatusCode::NOT_FOUND,
        MapError::DuplicateId(..)
        | MapError::DuplicateHostname { .. }
        | MapError::DuplicatePattern { .. }
        | MapError::DomainInUse { .. }
        | MapError::InvalidDefault { .. } => StatusCode::CONFLICT,
        MapError::UnknownDomain { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        MapError::InvalidHostname(_) | MapError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        }),
    )
}

fn pattern_error(err: PatternError) -> ApiError {
    map_error(MapError::InvalidPattern(err))
}

/// Save the whole snapshot after a successful mutation
async fn persist(state: &Arc<AppState>) -> ApiResult<()> {
    if state.store.is_none() {
        return Ok(());
    }

    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || match &state.store {
        Some(store) => store.save_map(&state.map),
        None => Ok(()),
    })
    .await
    .map_err(anyhow::Error::from)
    .and_then(|saved| saved);

    result.map_err(|e| {
        error!("Failed to save snapshot: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Change applied but not saved: {}", e),
                code: Some("SNAPSHOT_SAVE_FAILED".to_string()),
            }),
        )
    })
}

fn alias_summaries(state: &AppState, aliases: &[AliasRecord]) -> Vec<AliasSummary> {
    aliases
        .iter()
        .map(|alias| {
            let target = state.map.domain(&alias.domain_id).ok();
            AliasSummary::new(alias, target.as_ref())
        })
        .collect()
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        domains: state.map.domains().len(),
        aliases: state.map.aliases().len(),
    })
}

/// List all domains
#[utoipa::path(
    get,
    path = "/api/domains",
    responses(
        (status = 200, description = "List of domains", body = DomainList)
    ),
    tag = "domains"
)]
pub async fn list_domains(State(state): State<Arc<AppState>>) -> Json<DomainList> {
    debug!("Listing domains");
    let domains = state.map.domains();
    let total = domains.len();
    Json(DomainList { domains, total })
}

/// Create a domain
#[utoipa::path(
    post,
    path = "/api/domains",
    request_body = CreateDomainRequest,
    responses(
        (status = 201, description = "Domain created", body = DomainRecord),
        (status = 400, description = "Invalid hostname", body = ErrorResponse),
        (status = 409, description = "Duplicate id, hostname or default", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn create_domain(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDomainRequest>,
) -> ApiResult<(StatusCode, Json<DomainRecord>)> {
    info!("Creating domain: {}", req.id);

    let id = req.id.clone();
    state.map.add_domain(req.into_record()).map_err(map_error)?;
    persist(&state).await?;

    let record = state.map.domain(&id).map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a domain by id
#[utoipa::path(
    get,
    path = "/api/domains/{id}",
    params(
        ("id" = String, Path, description = "Domain ID")
    ),
    responses(
        (status = 200, description = "Domain", body = DomainRecord),
        (status = 404, description = "Domain not found", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn get_domain(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DomainRecord>> {
    debug!("Getting domain: {}", id);
    state.map.domain(&id).map(Json).map_err(map_error)
}

/// Edit a domain
#[utoipa::path(
    put,
    path = "/api/domains/{id}",
    params(
        ("id" = String, Path, description = "Domain ID")
    ),
    request_body = UpdateDomainRequest,
    responses(
        (status = 200, description = "Domain updated", body = DomainRecord),
        (status = 400, description = "Invalid hostname", body = ErrorResponse),
        (status = 404, description = "Domain not found", body = ErrorResponse),
        (status = 409, description = "Duplicate hostname", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn update_domain(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDomainRequest>,
) -> ApiResult<Json<DomainRecord>> {
    info!("Updating domain: {}", id);

    let current = state.map.domain(&id).map_err(map_error)?;
    state
        .map
        .update_domain(req.apply(current))
        .map_err(map_error)?;
    persist(&state).await?;

    state.map.domain(&id).map(Json).map_err(map_error)
}

/// Delete a domain
#[utoipa::path(
    delete,
    path = "/api/domains/{id}",
    params(
        ("id" = String, Path, description = "Domain ID")
    ),
    responses(
        (status = 204, description = "Domain deleted"),
        (status = 404, description = "Domain not found", body = ErrorResponse),
        (status = 409, description = "Domain still referenced by aliases", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn delete_domain(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("Deleting domain: {}", id);

    state.map.remove_domain(&id).map_err(map_error)?;
    persist(&state).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Make a domain the default domain
#[utoipa::path(
    post,
    path = "/api/domains/{id}/default",
    params(
        ("id" = String, Path, description = "Domain ID")
    ),
    responses(
        (status = 200, description = "Default domain set", body = DomainRecord),
        (status = 404, description = "Domain not found", body = ErrorResponse)
    ),
    tag = "domains"
)]
pub async fn set_default_domain(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DomainRecord>> {
    info!("Setting default domain: {}", id);

    state.map.set_default(&id).map_err(map_error)?;
    persist(&state).await?;

    state.map.domain(&id).map(Json).map_err(map_error)
}

/// List aliases
#[utoipa::path(
    get,
    path = "/api/aliases",
    params(
        ("domain_id" = Option<String>, Query, description = "Only aliases for this domain")
    ),
    responses(
        (status = 200, description = "Aliases in resolution order", body = AliasList)
    ),
    tag = "aliases"
)]
pub async fn list_aliases(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AliasQuery>,
) -> Json<AliasList> {
    debug!("Listing aliases (domain filter: {:?})", query.domain_id);

    let aliases = match &query.domain_id {
        Some(domain_id) => state.map.aliases_for(domain_id),
        None => state.map.aliases(),
    };
    let aliases = alias_summaries(&state, &aliases);
    let total = aliases.len();

    Json(AliasList { aliases, total })
}

/// Create an alias
#[utoipa::path(
    post,
    path = "/api/aliases",
    request_body = CreateAliasRequest,
    responses(
        (status = 201, description = "Alias created", body = AliasRecord),
        (status = 400, description = "Invalid pattern", body = ErrorResponse),
        (status = 409, description = "Duplicate id or pattern", body = ErrorResponse),
        (status = 422, description = "Unknown domain", body = ErrorResponse)
    ),
    tag = "aliases"
)]
pub async fn create_alias(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAliasRequest>,
) -> ApiResult<(StatusCode, Json<AliasRecord>)> {
    info!("Creating alias: {} ({} -> {})", req.id, req.pattern, req.domain_id);

    let alias = AliasRecord::new(req.id, req.domain_id, &req.pattern)
        .map_err(pattern_error)?
        .with_redirect(req.redirect);
    let id = alias.id.clone();

    state.map.add_alias(alias).map_err(map_error)?;
    persist(&state).await?;

    let alias = state.map.alias(&id).map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(alias)))
}

/// Get an alias by id
#[utoipa::path(
    get,
    path = "/api/aliases/{id}",
    params(
        ("id" = String, Path, description = "Alias ID")
    ),
    responses(
        (status = 200, description = "Alias", body = AliasRecord),
        (status = 404, description = "Alias not found", body = ErrorResponse)
    ),
    tag = "aliases"
)]
pub async fn get_alias(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AliasRecord>> {
    debug!("Getting alias: {}", id);
    state.map.alias(&id).map(Json).map_err(map_error)
}

/// Edit an alias
#[utoipa::path(
    put,
    path = "/api/aliases/{id}",
    params(
        ("id" = String, Path, description = "Alias ID")
    ),
    request_body = UpdateAliasRequest,
    responses(
        (status = 200, description = "Alias updated", body = AliasRecord),
        (status = 400, description = "Invalid pattern", body = ErrorResponse),
        (status = 404, description = "Alias not found", body = ErrorResponse),
        (status = 422, description = "Unknown domain", body = ErrorResponse)
    ),
    tag = "aliases"
)]
pub async fn update_alias(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAliasRequest>,
) -> ApiResult<Json<AliasRecord>> {
    info!("Updating alias: {}", id);

    let mut alias = state.map.alias(&id).map_err(map_error)?;
    if let Some(domain_id) = req.domain_id {
        alias.domain_id = domain_id;
    }
    if let Some(pattern) = req.pattern {
        alias.pattern = pattern.try_into().map_err(pattern_error)?;
    }
    if let Some(redirect) = req.redirect {
        alias.redirect = redirect;
    }

    state.map.update_alias(alias).map_err(map_error)?;
    persist(&state).await?;

    state.map.alias(&id).map(Json).map_err(map_error)
}

/// Delete an alias
#[utoipa::path(
    delete,
    path = "/api/aliases/{id}",
    params(
        ("id" = String, Path, description = "Alias ID")
    ),
    responses(
        (status = 204, description = "Alias deleted"),
        (status = 404, description = "Alias not found", body = ErrorResponse)
    ),
    tag = "aliases"
)]
pub async fn delete_alias(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("Deleting alias: {}", id);

    state.map.remove_alias(&id).map_err(map_error)?;
    persist(&state).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve a hostname
#[utoipa::path(
    get,
    path = "/api/resolve",
    params(
        ("host" = String, Query, description = "Request hostname")
    ),
    responses(
        (status = 200, description = "Resolution result; match_kind is \"none\" when nothing applies", body = ResolutionResult)
    ),
    tag = "resolution"
)]
pub async fn resolve_host(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolutionResult> {
    debug!("Resolving host: {}", query.host);
    Json(state.map.resolve(&query.host))
}

/// Domain match diagnostics
#[utoipa::path(
    get,
    path = "/api/report",
    params(
        ("host" = Option<String>, Query, description = "Hostname to report on (defaults to the Host header)")
    ),
    responses(
        (status = 200, description = "Diagnostic report", body = DomainReport)
    ),
    tag = "resolution"
)]
pub async fn domain_report(
    State(state): State<Arc<AppState>>,
    Extension(request_domain): Extension<RequestDomain>,
    Query(query): Query<ReportQuery>,
) -> Json<DomainReport> {
    let report = match query.host {
        Some(host) => DomainReport::build(&host, &state.map.resolve(&host)),
        None => DomainReport::build(&request_domain.host, &request_domain.resolution),
    };
    Json(report)
}
