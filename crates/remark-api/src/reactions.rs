use axum::{
    Extension, Json,
    extract::{Path, State},
};

use remark_db::models::CommentId;
use remark_types::api::{Claims, CountsResponse, MessageResponse, ReactionStateResponse, SetReactionRequest};
use remark_types::models::ReactionKind;

use crate::error::ApiError;
use crate::middleware::require_user;
use crate::state::{AppState, run_db};

async fn add(
    state: AppState,
    session: Option<Claims>,
    comment_id: CommentId,
    kind: ReactionKind,
) -> Result<(), ApiError> {
    let user = require_user(&state, session).await?;
    run_db(&state, move |db| db.add_reaction(comment_id, user.id, kind)).await
}

async fn remove(
    state: AppState,
    session: Option<Claims>,
    comment_id: CommentId,
    kind: ReactionKind,
) -> Result<(), ApiError> {
    let user = require_user(&state, session).await?;
    run_db(&state, move |db| db.remove_reaction(comment_id, user.id, kind)).await
}

async fn acknowledge(
    state: AppState,
    session: Option<Claims>,
    comment_id: CommentId,
    value: bool,
) -> Result<(), ApiError> {
    let user = require_user(&state, session).await?;
    run_db(&state, move |db| db.set_owner_acknowledged(comment_id, user.id, value)).await
}

/// POST /api/like/like/{comment_id}
pub async fn like(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    add(state, session, comment_id, ReactionKind::Like).await?;
    Ok(Json(MessageResponse::new("Comment liked")))
}

/// POST /api/like/remove-like/{comment_id}
pub async fn remove_like(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    remove(state, session, comment_id, ReactionKind::Like).await?;
    Ok(Json(MessageResponse::new("Like removed")))
}

/// POST /api/like/dislike/{comment_id}
pub async fn dislike(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    add(state, session, comment_id, ReactionKind::Dislike).await?;
    Ok(Json(MessageResponse::new("Comment disliked")))
}

/// POST /api/like/remove-dislike/{comment_id}
pub async fn remove_dislike(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    remove(state, session, comment_id, ReactionKind::Dislike).await?;
    Ok(Json(MessageResponse::new("Dislike removed")))
}

/// POST /api/like/owner-like/{comment_id}: receiver highlights a comment.
pub async fn owner_like(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    acknowledge(state, session, comment_id, true).await?;
    Ok(Json(MessageResponse::new("Comment liked")))
}

/// POST /api/like/owner-remove-like/{comment_id}
pub async fn owner_remove_like(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
) -> Result<Json<MessageResponse>, ApiError> {
    acknowledge(state, session, comment_id, false).await?;
    Ok(Json(MessageResponse::new("Like removed")))
}

/// PUT /api/comments/{comment_id}/reaction: atomic like/dislike/clear.
pub async fn set_reaction(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
    Extension(session): Extension<Option<Claims>>,
    Json(req): Json<SetReactionRequest>,
) -> Result<Json<ReactionStateResponse>, ApiError> {
    let user = require_user(&state, session).await?;
    let target = req.kind;

    run_db(&state, move |db| db.set_reaction(comment_id, user.id, target)).await?;

    Ok(Json(ReactionStateResponse { kind: target }))
}

/// GET /api/comments/{comment_id}/counts
pub async fn counts(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
) -> Result<Json<CountsResponse>, ApiError> {
    let counts = run_db(&state, move |db| db.counts_for(comment_id)).await?;

    Ok(Json(CountsResponse {
        likes: counts.likes,
        dislikes: counts.dislikes,
    }))
}
