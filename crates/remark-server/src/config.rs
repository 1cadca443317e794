use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Session secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub github_client_id: String,
    pub github_client_secret: String,
    pub origin_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("SESSION_SECRET is unset or still a placeholder");
        }

        // PORT is honoured for platforms that inject it.
        let port: u16 = env::var("REMARK_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("invalid REMARK_PORT")?;

        Ok(Self {
            host: env::var("REMARK_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            db_path: env::var("REMARK_DB_PATH")
                .unwrap_or_else(|_| "remark.db".into())
                .into(),
            session_secret,
            github_client_id: env::var("GITHUB_CLIENT_ID").context("GITHUB_CLIENT_ID is not set")?,
            github_client_secret: env::var("GITHUB_CLIENT_SECRET")
                .context("GITHUB_CLIENT_SECRET is not set")?,
            origin_url: env::var("ORIGIN_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),
        })
    }
}
