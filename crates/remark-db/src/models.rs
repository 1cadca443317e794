//! Row types for the SQLite tables, plus the joined comment view used by the
//! listing and badge paths. Kept separate from the remark-types wire models.

use remark_types::models::ReactionKind;

pub type UserId = i64;
pub type CommentId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    /// GitHub numeric id, stored as text. Never changes for a given user.
    pub external_id: String,
    /// GitHub login; refreshed on every sign-in.
    pub display_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub id: CommentId,
    pub receiver_id: UserId,
    pub author_id: UserId,
    /// HTML-escaped at creation time.
    pub content: String,
    pub owner_acknowledged: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionCounts {
    pub likes: u32,
    pub dislikes: u32,
}

impl ReactionCounts {
    pub fn net(&self) -> i64 {
        i64::from(self.likes) - i64::from(self.dislikes)
    }
}

/// A comment joined with its author's name, live reaction counts and the
/// viewer's relationship to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub id: CommentId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub owner_acknowledged: bool,
    pub counts: ReactionCounts,
    pub authored_by_viewer: bool,
    pub viewer_reaction: Option<ReactionKind>,
}

impl CommentView {
    pub fn net_score(&self) -> i64 {
        self.counts.net()
    }
}
