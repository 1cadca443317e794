use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use remark_db::models::UserRow;
use remark_types::api::Claims;
use tracing::debug;

use crate::auth::SESSION_COOKIE;
use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// Decodes the session cookie, if any, and stores the result as an
/// `Option<Claims>` request extension. Never rejects: routes decide for
/// themselves whether a session is required.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_token(&state.session_secret, cookie.value()));

    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
    .map(|data| data.claims)
}

/// Resolves the session to a stored user. A valid token whose user row no
/// longer exists is treated as signed out.
pub async fn require_user(state: &AppState, session: Option<Claims>) -> Result<UserRow, ApiError> {
    let claims = session.ok_or(ApiError::Unauthorized)?;
    run_db(state, move |db| db.get_user_by_id(claims.sub))
        .await?
        .ok_or(ApiError::Unauthorized)
}
