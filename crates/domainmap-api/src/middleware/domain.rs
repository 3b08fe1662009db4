//! Request domain middleware
//!
//! Resolves the request's Host header against the domain map and makes the
//! outcome available to handlers via Axum's Extension. The host is used as
//! received (only trimmed and lowercased by the resolver), so a port stays
//! part of the hostname.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use domainmap_router::ResolutionResult;
use std::sync::Arc;
use tracing::debug;

use crate::AppState;

/// Domain resolution for the current request
#[derive(Debug, Clone)]
pub struct RequestDomain {
    /// Host as received from the client
    pub host: String,
    pub resolution: ResolutionResult,
}

/// Extract the request host
///
/// Uses the Host header, falling back to the URI authority (HTTP/2).
pub fn request_host(request: &Request) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

/// Resolve the request host and inject a `RequestDomain` extension
pub async fn resolve_request_domain(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request_host(&request);
    let resolution = state.map.resolve(&host);

    debug!(
        host = %host,
        match_kind = ?resolution.match_kind,
        domain_id = ?resolution.matched_domain.as_ref().map(|d| d.id.as_str()),
        "Resolved request domain"
    );

    request
        .extensions_mut()
        .insert(RequestDomain { host, resolution });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_host_from_header() {
        let request = Request::builder()
            .uri("/api/report")
            .header("host", "Shop.Example.com:8080")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request), "Shop.Example.com:8080");
    }

    #[test]
    fn test_request_host_from_authority() {
        let request = Request::builder()
            .uri("https://example.com/api/report")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request), "example.com");
    }

    #[test]
    fn test_request_host_missing() {
        let request = Request::builder()
            .uri("/api/report")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&request), "");
    }
}
