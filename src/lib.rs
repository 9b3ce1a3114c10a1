use std::sync::Arc;

use axum::{middleware, routing::get, Router};

pub mod backend;
pub mod command;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod monitor;
pub mod sampler;

use monitor::{broadcaster::Broadcaster, controller::ServiceController};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ServiceController>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(controller: Arc<ServiceController>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            controller,
            broadcaster,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/inventory", get(http::handlers::inventory))
        .route("/ws", get(http::handlers::websocket))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
