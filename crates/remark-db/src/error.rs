use remark_types::models::ReactionKind;
use rusqlite::ffi;
use thiserror::Error;

/// Failure taxonomy of the comment store and reaction ledger.
///
/// Every variant except `Internal` is an expected, caller-facing outcome; the
/// HTTP layer maps each to a stable status code.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Internal(e.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("user already has a comment")]
    CommentExists,

    #[error("you have already {} this comment", .0.past_tense())]
    AlreadyReacted(ReactionKind),

    #[error("{}", acknowledgement_message(*.0))]
    AcknowledgementUnchanged(bool),

    #[error("{}", reaction_message(*.0))]
    ReactionUnchanged(Option<ReactionKind>),
}

fn acknowledgement_message(value: bool) -> &'static str {
    if value {
        "you have already liked this comment"
    } else {
        "you have not liked this comment"
    }
}

fn reaction_message(kind: Option<ReactionKind>) -> String {
    match kind {
        Some(kind) => format!("you have already {} this comment", kind.past_tense()),
        None => "you have not reacted to this comment".to_string(),
    }
}

fn extended_code(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
        _ => None,
    }
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        extended_code(e),
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) | Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

pub(crate) fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    extended_code(e) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}
