pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::cascade::handlers;

pub fn build_router() -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Card API
        .route("/api/v1/cards/render", post(handlers::handle_render))
        .route("/api/v1/cards/normalize", post(handlers::handle_normalize))
        .route("/api/v1/cards/sample", get(handlers::handle_sample))
}
