//! `api` crate — HTTP REST API layer (§6 "External interfaces").
//!
//! Exposes:
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/:id
//!   DELETE /api/v1/workflows/:id
//!   POST   /api/v1/workflows/:id/execute
//!   GET    /api/v1/automations
//!   POST   /api/v1/automations
//!   POST   /api/v1/automations/:id/enable
//!   POST   /api/v1/automations/:id/disable
//!   POST   /api/v1/automations/:id/trigger
//!   POST   /webhook/:path

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use db::DbPool;
use nodes::NodeRegistry;
use scheduler::AutomationScheduler;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub registry: NodeRegistry,
    pub scheduler: AutomationScheduler,
}

pub async fn serve(bind: &str, state: AppState) -> Result<(), std::io::Error> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).post(handlers::workflows::create))
        .route("/workflows/:id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:id/execute", post(handlers::executions::execute))
        .route("/automations", get(handlers::automations::list).post(handlers::automations::create))
        .route("/automations/:id/enable", post(handlers::automations::enable))
        .route("/automations/:id/disable", post(handlers::automations::disable))
        .route("/automations/:id/trigger", post(handlers::automations::trigger));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/webhook/*path", post(handlers::webhooks::handle_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
