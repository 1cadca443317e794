use remark_types::models::ReactionKind;
use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

use crate::{Database, begin_write};
use crate::comments::query_comment;
use crate::error::{Conflict, StoreError, is_foreign_key_violation, is_unique_violation};
use crate::models::{CommentId, CommentRow, ReactionCounts, UserId};

impl Database {
    /// Likes or dislikes a comment. A user holds at most one reaction per
    /// comment; if one of either kind exists the call fails with
    /// [`Conflict::AlreadyReacted`] naming the kind already held.
    pub fn add_reaction(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            let comment = reactable_comment(&tx, comment_id, user_id)?;

            if let Some(held) = query_reaction(&tx, comment.id, user_id)? {
                return Err(Conflict::AlreadyReacted(held).into());
            }

            insert_reaction(&tx, comment.id, user_id, kind)?;
            tx.commit()?;

            info!("User {} {} comment {}", user_id, kind.past_tense(), comment_id);
            Ok(())
        })
    }

    /// Withdraws a reaction of exactly `kind`. Removing a like that is not
    /// there (including when the user holds a dislike) is `InvalidInput`.
    pub fn remove_reaction(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            if query_comment(&tx, comment_id)?.is_none() {
                return Err(StoreError::NotFound("comment"));
            }

            let removed = tx.execute(
                "DELETE FROM reactions WHERE comment_id = ?1 AND user_id = ?2 AND kind = ?3",
                (comment_id, user_id, kind.as_str()),
            )?;
            if removed == 0 {
                return Err(StoreError::InvalidInput(format!("comment not {}", kind.past_tense())));
            }
            tx.commit()?;

            info!("User {} removed {} from comment {}", user_id, kind, comment_id);
            Ok(())
        })
    }

    /// Moves a user's reaction on a comment to `target` in one transaction,
    /// so no other reader can observe the intermediate "no reaction" state of
    /// a like/dislike swap. Returns the reaction held before the call.
    ///
    /// Asking for the state already held is a [`Conflict::ReactionUnchanged`].
    pub fn set_reaction(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        target: Option<ReactionKind>,
    ) -> Result<Option<ReactionKind>, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            let comment = reactable_comment(&tx, comment_id, user_id)?;
            let previous = query_reaction(&tx, comment.id, user_id)?;

            if previous == target {
                return Err(Conflict::ReactionUnchanged(previous).into());
            }

            if previous.is_some() {
                tx.execute(
                    "DELETE FROM reactions WHERE comment_id = ?1 AND user_id = ?2",
                    (comment_id, user_id),
                )?;
            }
            if let Some(kind) = target {
                insert_reaction(&tx, comment_id, user_id, kind)?;
            }
            tx.commit()?;

            debug!(
                "User {} reaction on comment {}: {:?} -> {:?}",
                user_id, comment_id, previous, target
            );
            Ok(previous)
        })
    }

    pub fn reaction_of(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>, StoreError> {
        self.with_conn(|conn| query_reaction(conn, comment_id, user_id))
    }

    /// Fresh like/dislike counts for a comment. Unknown (or deleted) comments
    /// are `NotFound` rather than zero.
    pub fn counts_for(&self, comment_id: CommentId) -> Result<ReactionCounts, StoreError> {
        self.with_conn(|conn| {
            if query_comment(conn, comment_id)?.is_none() {
                return Err(StoreError::NotFound("comment"));
            }

            let (likes, dislikes): (u32, u32) = conn.query_row(
                "SELECT COALESCE(SUM(kind = 'like'), 0), COALESCE(SUM(kind = 'dislike'), 0)
                 FROM reactions WHERE comment_id = ?1",
                [comment_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(ReactionCounts { likes, dislikes })
        })
    }
}

/// Loads the comment and applies the rules shared by every reaction write:
/// it must exist and must not be the caller's own.
fn reactable_comment(
    tx: &Transaction<'_>,
    comment_id: CommentId,
    user_id: UserId,
) -> Result<CommentRow, StoreError> {
    let comment = query_comment(tx, comment_id)?.ok_or(StoreError::NotFound("comment"))?;
    if comment.author_id == user_id {
        return Err(StoreError::Forbidden("you can't react to your own comment"));
    }
    Ok(comment)
}

fn insert_reaction(
    tx: &Transaction<'_>,
    comment_id: CommentId,
    user_id: UserId,
    kind: ReactionKind,
) -> Result<(), StoreError> {
    match tx.execute(
        "INSERT INTO reactions (comment_id, user_id, kind) VALUES (?1, ?2, ?3)",
        (comment_id, user_id, kind.as_str()),
    ) {
        Ok(_) => Ok(()),
        // Another writer on the same file got there first.
        Err(e) if is_unique_violation(&e) => {
            let held = query_reaction(tx, comment_id, user_id)?.unwrap_or(kind);
            Err(Conflict::AlreadyReacted(held).into())
        }
        Err(e) if is_foreign_key_violation(&e) => Err(StoreError::NotFound("user")),
        Err(e) => Err(e.into()),
    }
}

fn query_reaction(
    conn: &Connection,
    comment_id: CommentId,
    user_id: UserId,
) -> Result<Option<ReactionKind>, StoreError> {
    let kind: Option<String> = conn
        .query_row(
            "SELECT kind FROM reactions WHERE comment_id = ?1 AND user_id = ?2",
            (comment_id, user_id),
            |row| row.get(0),
        )
        .optional()?;

    kind.map(parse_kind).transpose()
}

/// Decodes a stored `reactions.kind`. The column is CHECK-constrained, so an
/// unknown value means a corrupt row.
pub(crate) fn parse_kind(stored: String) -> Result<ReactionKind, StoreError> {
    stored
        .parse::<ReactionKind>()
        .map_err(|e| StoreError::Internal(anyhow::anyhow!("bad reaction kind: {}", e)))
}
