pub mod appresult;
pub mod auth;
pub mod db;
pub mod discover;
pub mod profiles;
pub mod rooms;
pub mod swipes;

use axum::{Router, extract::FromRef, routing::get};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub use appresult::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub verifier: auth::Verifier,
    pub rooms: rooms::Registry,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/discover", get(discover::feed))
        .nest("/swipes", swipes::router())
        .nest("/chat", rooms::router())
        .nest("/p", profiles::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn index() -> &'static str {
    "server running"
}
