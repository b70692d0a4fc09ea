//! HTTP middleware: security headers and CORS

pub mod security_headers;

pub use security_headers::security_headers_middleware;

use axum::http::{header, HeaderValue, Method};
use registrar_core::{Environment, ServerConfig};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS for the configured front-end origins
///
/// Development mirrors any origin; other environments accept only the
/// configured list. Unparseable origins are skipped with a warning.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = if config.environment == Environment::Development {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
