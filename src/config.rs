use std::path::PathBuf;

use anyhow::{Context, Result};

/// Process configuration, built once in `main` and threaded through
/// constructors. Handlers never read the environment themselves.
pub struct Config {
    pub db_path: String,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret =
            std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let db_path = std::env::var("LOG_DB_PATH").unwrap_or_else(|_| "logdb".into());
        let upload_dir = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads".into())
            .into();
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        Ok(Self {
            db_path,
            jwt_secret,
            upload_dir,
            port,
        })
    }
}
