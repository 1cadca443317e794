use std::sync::Arc;

use remark_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::github::IdentityProvider;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
    /// Public origin of the site, e.g. `https://remark.example.com`. Used to
    /// build the OAuth redirect URI and post-login redirects.
    pub origin_url: String,
    pub identity: Box<dyn IdentityProvider>,
}

/// Runs a blocking database call off the async runtime.
pub async fn run_db<F, T, E>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("database task failed: {}", e))
        })?
        .map_err(Into::into)
}
