use serde::{Deserialize, Serialize};

use crate::models::ReactionKind;

// -- Session Claims --

/// Claims carried in the session cookie. `sub` is the internal numeric user id,
/// never the GitHub id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub login: String,
    pub exp: usize,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub user_id: String,
    pub logged_in: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub github_id: String,
    pub github_login: String,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub is_owner_liked: bool,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub is_mine: bool,
    pub likes: u32,
    pub dislikes: u32,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetReactionRequest {
    pub kind: Option<ReactionKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionStateResponse {
    pub kind: Option<ReactionKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountsResponse {
    pub likes: u32,
    pub dislikes: u32,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
