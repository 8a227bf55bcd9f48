pub mod audit;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod files;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod schema;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{CorsConfig, StorageBackend};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keyvia File Vault API",
        version = "1.0.0",
        description = "Multi-tenant file storage with content deduplication, quotas and sharing"
    ),
    tags(
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Files", description = "Upload, search, download and delete files"),
        (name = "Sharing", description = "Public links and per-user shares"),
        (name = "Audit", description = "Per-user activity history"),
        (name = "Admin", description = "System-wide file listing"),
        (name = "Health", description = "Liveness checks"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(handlers::health::health))
        .nest("/api", routes::api_routes(&state))
        .split_for_parts();

    let mut router = router
        .with_state(state.clone())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    if state.config.storage.backend == StorageBackend::Filesystem {
        router = router.nest_service(
            "/objects",
            ServeDir::new(&state.config.storage.filesystem.base_path),
        );
    }

    router.layer(cors_layer(&state.config.server.cors))
}
