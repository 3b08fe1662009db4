pub mod handlers;
pub mod middleware;
pub mod models;
pub mod report;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use domainmap_router::DomainMap;
use domainmap_store::SnapshotStore;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers
pub struct AppState {
    pub map: Arc<DomainMap>,
    /// Snapshot file written after every change, if configured
    pub store: Option<SnapshotStore>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Domain Map API",
        version = "0.1.0",
        description = "REST API for managing domains, aliases and hostname resolution"
    ),
    paths(
        handlers::health_check,
        handlers::list_domains,
        handlers::create_domain,
        handlers::get_domain,
        handlers::update_domain,
        handlers::delete_domain,
        handlers::set_default_domain,
        handlers::list_aliases,
        handlers::create_alias,
        handlers::get_alias,
        handlers::update_alias,
        handlers::delete_alias,
        handlers::resolve_host,
        handlers::domain_report,
    ),
    components(
        schemas(
            domainmap_router::DomainRecord,
            domainmap_router::AliasRecord,
            domainmap_router::MatchKind,
            domainmap_router::ResolutionResult,
            models::CreateDomainRequest,
            models::UpdateDomainRequest,
            models::DomainList,
            models::CreateAliasRequest,
            models::UpdateAliasRequest,
            models::AliasSummary,
            models::AliasList,
            models::AliasQuery,
            models::ResolveQuery,
            models::ReportQuery,
            models::HealthResponse,
            models::ErrorResponse,
            report::ReportRow,
            report::DomainReport,
        )
    ),
    tags(
        (name = "domains", description = "Domain management endpoints"),
        (name = "aliases", description = "Alias management endpoints"),
        (name = "resolution", description = "Hostname resolution and diagnostics"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS for local development origins
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, map: Arc<DomainMap>, store: Option<SnapshotStore>) -> Self {
        let state = Arc::new(AppState { map, store });
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let admin_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route(
                "/api/domains",
                get(handlers::list_domains).post(handlers::create_domain),
            )
            .route(
                "/api/domains/{id}",
                get(handlers::get_domain)
                    .put(handlers::update_domain)
                    .delete(handlers::delete_domain),
            )
            .route(
                "/api/domains/{id}/default",
                post(handlers::set_default_domain),
            )
            .route(
                "/api/aliases",
                get(handlers::list_aliases).post(handlers::create_alias),
            )
            .route(
                "/api/aliases/{id}",
                get(handlers::get_alias)
                    .put(handlers::update_alias)
                    .delete(handlers::delete_alias),
            )
            .route("/api/resolve", get(handlers::resolve_host))
            .with_state(self.state.clone());

        // The report reads the request's own domain resolution
        let report_router = Router::new()
            .route("/api/report", get(handlers::domain_report))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::resolve_request_domain,
            ));

        let mut router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(admin_router)
            .merge(report_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            use tower_http::cors::AllowOrigin;

            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                        || origin_str.starts_with("https://localhost:")
                        || origin_str.starts_with("https://127.0.0.1:")
                }));
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

/// Convenience function to create and start an API server
pub async fn run_api_server(
    config: ApiServerConfig,
    map: Arc<DomainMap>,
    store: Option<SnapshotStore>,
) -> Result<(), anyhow::Error> {
    ApiServer::new(config, map, store).start().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let api_doc = ApiDoc::openapi();
        let json = serde_json::to_value(&api_doc).unwrap();
        assert!(json["paths"]["/api/resolve"].is_object());
        assert!(json["components"]["schemas"]["ResolutionResult"].is_object());
    }
}
