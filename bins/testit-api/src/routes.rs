use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ws, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute_batch))
        .route("/results/:request_id", get(handlers::get_results))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/ws", get(ws::ws_handler))
}
