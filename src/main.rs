use std::sync::Arc;

use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod auth;
mod config;
mod db;
mod error;
mod model;
mod state;
mod storage;

use api::auth::JwtState;
use config::Config;
use db::DbLayer;
use state::AppState;
use storage::StorageService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(DbLayer::new(&config.db_path)?);
    let storage = StorageService::new(&config.upload_dir).await?;

    let state = AppState {
        db,
        storage,
        jwt_secret: config.jwt_secret.clone(),
    };

    let app = Router::new()
        .merge(auth::router())
        .merge(api::router())
        .layer(Extension(JwtState {
            secret: config.jwt_secret,
        }))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, "HTTP listening");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
