//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use leadflow_automation::AutomationController;
use leadflow_core::config::GatewayConfig;
use leadflow_store::SqliteStore;
use leadflow_templates::TemplateStore;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AutomationController>,
    pub store: Arc<SqliteStore>,
    pub templates: TemplateStore,
    pub start_time: std::time::Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    let api = Router::new()
        .route("/api/v1/leads", get(super::routes::list_leads))
        .route("/api/v1/leads", post(super::routes::create_lead))
        .route("/api/v1/leads/{id}", get(super::routes::get_lead))
        .route(
            "/api/v1/leads/{id}/automation",
            get(super::routes::automation_status),
        )
        .route(
            "/api/v1/leads/{id}/automation/start",
            post(super::routes::start_automation),
        )
        .route(
            "/api/v1/leads/{id}/automation/pause",
            post(super::routes::pause_automation),
        )
        .route(
            "/api/v1/leads/{id}/automation/resume",
            post(super::routes::resume_automation),
        )
        .route(
            "/api/v1/leads/{id}/automation/stop",
            post(super::routes::stop_automation),
        )
        .route(
            "/api/v1/leads/{id}/automation/force-send",
            post(super::routes::force_send),
        )
        .route(
            "/api/v1/leads/{id}/automation/process",
            post(super::routes::process_lead),
        )
        .route("/api/v1/templates", get(super::routes::list_templates))
        .route("/api/v1/templates", post(super::routes::save_template))
        .route(
            "/api/v1/settings/{user_id}",
            put(super::routes::save_settings),
        )
        .route(
            "/api/v1/credentials/{user_id}",
            put(super::routes::save_credentials),
        );

    let public = Router::new().route("/health", get(super::routes::health_check));

    api.merge(public)
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(3600));

            // Restrict CORS origins in production via env var, e.g.
            // LEADFLOW_CORS_ORIGINS=https://crm.example.com
            if let Ok(origins_str) = std::env::var("LEADFLOW_CORS_ORIGINS") {
                let origins: Vec<_> = origins_str
                    .split(',')
                    .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            } else {
                cors.allow_origin(Any)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(state: AppState, config: &GatewayConfig) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
