use axum::{Extension, Json, extract::State};

use remark_types::api::{Claims, StatusResponse, UserResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// GET /api/: who am I.
pub async fn status(
    State(state): State<AppState>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = match session {
        Some(claims) => run_db(&state, move |db| db.get_user_by_id(claims.sub)).await?,
        None => None,
    };

    Ok(Json(match user {
        Some(user) => StatusResponse {
            user_id: user.display_name,
            logged_in: true,
        },
        None => StatusResponse {
            user_id: "Not logged in".to_string(),
            logged_in: false,
        },
    }))
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = run_db(&state, |db| db.list_users()).await?;

    Ok(Json(
        users
            .into_iter()
            .map(|u| UserResponse {
                id: u.id,
                github_id: u.external_id,
                github_login: u.display_name,
            })
            .collect(),
    ))
}
