pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::handlers::archive;
use crate::storage::BlobStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub store: Arc<dyn BlobStore>,
}

pub fn create_router(state: AppState) -> Router {
    // The SPA frontend is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/archives/upload", post(archive::upload_archive))
        .route("/archives/download/:id", get(archive::download_archive))
        .route("/archives", get(archive::list_archives))
        .route(
            "/archives/:id",
            get(archive::get_archive).delete(archive::delete_archive),
        )
        // Headroom over the payload cap for the multipart framing
        .layer(DefaultBodyLimit::max(archive::MAX_FILE_SIZE + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
