pub mod handlers;
pub mod jwt;
pub mod types;
pub mod utils;

use axum::{routing::post, Router};

use crate::state::AppState;
use handlers::{login_handler, register_handler};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register_handler))
        .route("/api/users/login", post(login_handler))
}
