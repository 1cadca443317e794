use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use remark_db::models::{CommentView, UserRow};
use remark_db::{Database, StoreError};
use remark_types::api::{Claims, CommentResponse, CreateCommentRequest, MessageResponse};
use remark_types::models::ReactionKind;

use crate::error::ApiError;
use crate::middleware::require_user;
use crate::state::{AppState, run_db};

pub(crate) fn receiver_by_login(db: &Database, login: &str) -> Result<UserRow, StoreError> {
    db.get_user_by_login(login)?
        .ok_or(StoreError::NotFound("GitHub user"))
}

/// GET /api/user/{username}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let viewer = session.map(|c| c.sub);

    let views = run_db(&state, move |db| {
        let receiver = receiver_by_login(db, &username)?;
        db.list_comments(receiver.id, viewer)
    })
    .await?;

    Ok(Json(views.into_iter().map(to_response).collect()))
}

/// POST /api/user/{username}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(session): Extension<Option<Claims>>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let author = require_user(&state, session).await?;

    run_db(&state, move |db| {
        let receiver = receiver_by_login(db, &username)?;
        db.create_comment(author.id, receiver.id, &req.content)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("Comment created"))))
}

/// DELETE /api/user/{username}/comments: removes the caller's comment.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let author = require_user(&state, session).await?;

    run_db(&state, move |db| {
        let receiver = receiver_by_login(db, &username)?;
        db.delete_comment(author.id, receiver.id)
    })
    .await?;

    Ok(Json(MessageResponse::new("Comment deleted")))
}

fn to_response(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.id,
        author: view.author_name,
        content: view.content,
        is_owner_liked: view.owner_acknowledged,
        is_liked: view.viewer_reaction == Some(ReactionKind::Like),
        is_disliked: view.viewer_reaction == Some(ReactionKind::Dislike),
        is_mine: view.authored_by_viewer,
        likes: view.counts.likes,
        dislikes: view.counts.dislikes,
    }
}
