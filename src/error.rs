use axum::http::StatusCode;

pub type ApiError = (StatusCode, String);

/// Boundary catch-all: log the real failure, report a generic message so
/// store or filesystem internals never leak to callers.
pub fn server_error<E: std::fmt::Display>(err: E) -> ApiError {
    tracing::error!(error = %err, "unexpected failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
}
