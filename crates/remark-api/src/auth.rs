use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use remark_db::models::UserRow;
use remark_types::api::{Claims, MessageResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_db};

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const SESSION_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Page to return to after signing in.
    pub current: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
    pub current: Option<String>,
}

/// GET /api/auth/login: starts the OAuth dance.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let current = query.current.as_deref().filter(|p| is_local_path(p));
    let redirect_uri = callback_uri(&state.origin_url, current)?;

    let oauth_state = random_state();
    let authorize_url = state.identity.authorize_url(&oauth_state, &redirect_uri)?;

    let jar = jar.add(
        Cookie::build((OAUTH_STATE_COOKIE, oauth_state))
            .path("/api/auth")
            .http_only(true)
            .same_site(SameSite::Lax),
    );

    Ok((jar, Redirect::temporary(&authorize_url)))
}

/// GET /api/auth/callback: completes sign-in and issues the session cookie.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(CookieJar, Response), ApiError> {
    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    if expected.as_deref() != Some(query.state.as_str()) {
        warn!("OAuth callback with mismatched state");
        return Err(ApiError::Unauthorized);
    }

    let current = query.current.as_deref().filter(|p| is_local_path(p));
    let redirect_uri = callback_uri(&state.origin_url, current)?;

    let identity = state
        .identity
        .exchange(&query.code, &redirect_uri)
        .await
        .map_err(|e| {
            warn!("OAuth exchange failed: {:#}", e);
            ApiError::BadRequest("GitHub sign-in failed".into())
        })?;

    let external_id = identity.id.clone();
    let login = identity.login.clone();
    let user = run_db(&state, move |db| db.upsert_user(&external_id, &login)).await?;

    let token = create_token(&state.session_secret, &user)?;
    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path("/api/auth"))
        .add(session_cookie(token));

    info!("User {} ({}) signed in", user.display_name, user.id);

    let response = match current {
        Some(path) => Redirect::to(&format!("{}{}", state.origin_url, path)).into_response(),
        None => Json(serde_json::json!({
            "message": "Logged in successfully",
            "github_id": identity.id,
        }))
        .into_response(),
    };

    Ok((jar, response))
}

/// GET /api/auth/logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Logged out")))
}

pub fn create_token(secret: &str, user: &UserRow) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        login: user.display_name.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Lifetime is bounded by the token's `exp`, not the cookie.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}

fn callback_uri(origin: &str, current: Option<&str>) -> Result<String, ApiError> {
    let mut url = Url::parse(&format!("{}/api/auth/callback", origin))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("bad ORIGIN_URL: {}", e)))?;
    if let Some(path) = current {
        url.query_pairs_mut().append_pair("current", path);
    }
    Ok(url.into())
}

/// Only same-site absolute paths are accepted as post-login targets.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

fn random_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    B64.encode(bytes)
}
