use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod auth;
pub mod handlers;
pub mod types;

use handlers::{get_log, list_devices, list_logs, register_device, submit_log_data, upload_log};

pub fn router() -> Router<AppState> {
    Router::new()
        // user-token protected
        .route("/api/devices/register", post(register_device))
        .route("/api/devices", get(list_devices))
        .route("/api/logs", get(list_logs))
        .route("/api/logs/{id}", get(get_log))
        // device API key protected
        .route("/api/logs/upload", post(upload_log))
        .route("/api/logs/data", post(submit_log_data))
}
