//! Upload intake and CORS static file server for a browser glTF viewer.
//!
//! Uploaded `.glb`/`.gltf` files are written to `{static_root}/uploads` and
//! served back by [`static_server::StaticServer`] so an in-browser renderer
//! can fetch them cross-origin. A small host API accepts uploads and relays
//! selections from embedded scenes to their host pages.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod intake;
pub mod routes;
pub mod selection;
pub mod static_server;

use config::ServerConfig;
use intake::AssetIntake;
use selection::SelectionChannel;
use static_server::StaticServer;

#[derive(Clone)]
pub struct AppState {
    pub intake: AssetIntake,
    pub selection: SelectionChannel,
    pub static_server: Arc<StaticServer>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            intake: AssetIntake::new(config),
            selection: SelectionChannel::default(),
            static_server: Arc::new(StaticServer::new(config)),
        }
    }
}

/// Host API router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route(
            "/api/upload",
            post(routes::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/assets", get(routes::list_assets))
        .route("/api/selection", post(routes::publish_selection))
        .route("/api/selection/ws", get(routes::selection_ws))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
