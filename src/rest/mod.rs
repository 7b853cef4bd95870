// rest/mod.rs — Public REST API server.
//
// Axum HTTP server fronting the task query engine and mutation handlers.
//
// Endpoints:
//   GET    /api/health
//   POST   /api/auth/register
//   POST   /api/auth/login
//   GET    /api/me
//   PUT    /api/me
//   GET    /api/tasks
//   POST   /api/tasks
//   PUT    /api/tasks/{id}
//   DELETE /api/tasks/{id}

pub mod caller;
pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let router = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("REST API listening on http://{}", bind);
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(&ctx.config.cors_origin);
    Router::new()
        // Health (no auth)
        .route("/api/health", get(routes::health::health))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        // Profile
        .route(
            "/api/me",
            get(routes::me::get_profile).put(routes::me::update_profile),
        )
        // Tasks
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/{id}",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .layer(cors)
        .with_state(ctx)
}

fn cors_layer(origin: &str) -> CorsLayer {
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        Err(e) => {
            warn!(origin, err = %e, "invalid cors_origin — cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}
