use std::cmp::Ordering;

use anyhow::anyhow;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

use crate::{Database, begin_write};
use crate::content;
use crate::error::{Conflict, StoreError, is_foreign_key_violation, is_unique_violation};
use crate::models::{CommentId, CommentRow, CommentView, ReactionCounts, UserId};
use crate::reactions::parse_kind;
use crate::users::query_user_by_id;

const COMMENT_COLUMNS: &str = "id, receiver_id, author_id, content, owner_acknowledged, created_at";

impl Database {
    /// Posts `raw_content` from `author_id` onto `receiver_id`'s profile.
    ///
    /// The `UNIQUE(author_id, receiver_id)` constraint is what serializes
    /// competing creations for the same pair: the loser's insert fails and is
    /// reported as [`Conflict::CommentExists`].
    pub fn create_comment(
        &self,
        author_id: UserId,
        receiver_id: UserId,
        raw_content: &str,
    ) -> Result<CommentRow, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            if query_user_by_id(&tx, receiver_id)?.is_none() {
                return Err(StoreError::NotFound("user"));
            }

            let content = content::sanitize(raw_content)?;

            match tx.execute(
                "INSERT INTO comments (receiver_id, author_id, content) VALUES (?1, ?2, ?3)",
                (receiver_id, author_id, &content),
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Err(Conflict::CommentExists.into()),
                Err(e) if is_foreign_key_violation(&e) => return Err(StoreError::NotFound("user")),
                Err(e) => return Err(e.into()),
            }

            let id = tx.last_insert_rowid();
            let row = query_comment(&tx, id)?
                .ok_or_else(|| anyhow!("Comment {} missing after insert", id))?;
            tx.commit()?;

            info!("Comment {} created by user {} on user {}", id, author_id, receiver_id);
            Ok(row)
        })
    }

    pub fn get_comment(&self, id: CommentId) -> Result<Option<CommentRow>, StoreError> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    /// All comments on `receiver_id`'s profile with author names and live
    /// reaction counts, in display order (see [`rank_comments`]).
    pub fn list_comments(
        &self,
        receiver_id: UserId,
        viewer: Option<UserId>,
    ) -> Result<Vec<CommentView>, StoreError> {
        let mut views = self.with_conn(|conn| {
            // JOIN users to fetch the author name in one query
            let mut stmt = conn.prepare(
                "SELECT c.id, c.author_id, u.display_name, c.content, c.owner_acknowledged,
                        (SELECT COUNT(*) FROM reactions r
                          WHERE r.comment_id = c.id AND r.kind = 'like'),
                        (SELECT COUNT(*) FROM reactions r
                          WHERE r.comment_id = c.id AND r.kind = 'dislike'),
                        (SELECT r.kind FROM reactions r
                          WHERE r.comment_id = c.id AND r.user_id = ?2)
                 FROM comments c
                 JOIN users u ON u.id = c.author_id
                 WHERE c.receiver_id = ?1
                 ORDER BY c.id",
            )?;

            let rows = stmt
                .query_map((receiver_id, viewer), |row| {
                    let author_id: UserId = row.get(1)?;
                    let reaction: Option<String> = row.get(7)?;
                    let view = CommentView {
                        id: row.get(0)?,
                        author_id,
                        author_name: row.get(2)?,
                        content: row.get(3)?,
                        owner_acknowledged: row.get(4)?,
                        counts: ReactionCounts {
                            likes: row.get(5)?,
                            dislikes: row.get(6)?,
                        },
                        authored_by_viewer: viewer == Some(author_id),
                        viewer_reaction: None,
                    };
                    Ok((view, reaction))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(mut view, reaction)| {
                    view.viewer_reaction = reaction.map(parse_kind).transpose()?;
                    Ok(view)
                })
                .collect::<Result<Vec<_>, StoreError>>()
        })?;

        rank_comments(&mut views);
        Ok(views)
    }

    /// Removes `author_id`'s comment on `receiver_id`. Its reactions go with it
    /// through `ON DELETE CASCADE`.
    pub fn delete_comment(
        &self,
        author_id: UserId,
        receiver_id: UserId,
    ) -> Result<CommentId, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            let id: CommentId = tx
                .query_row(
                    "SELECT id FROM comments WHERE author_id = ?1 AND receiver_id = ?2",
                    (author_id, receiver_id),
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(StoreError::NotFound("comment"))?;

            tx.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            tx.commit()?;

            info!("Comment {} deleted by author {}", id, author_id);
            Ok(id)
        })
    }

    /// Sets the receiver-only acknowledgement flag. Requests that would not
    /// change the flag are rejected with [`Conflict::AcknowledgementUnchanged`].
    pub fn set_owner_acknowledged(
        &self,
        comment_id: CommentId,
        requester_id: UserId,
        value: bool,
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            let comment = query_comment(&tx, comment_id)?.ok_or(StoreError::NotFound("comment"))?;

            if comment.receiver_id != requester_id {
                return Err(StoreError::Forbidden(
                    "only the profile owner can like or unlike this comment",
                ));
            }
            if comment.owner_acknowledged == value {
                return Err(Conflict::AcknowledgementUnchanged(value).into());
            }

            tx.execute(
                "UPDATE comments SET owner_acknowledged = ?1 WHERE id = ?2",
                (value, comment_id),
            )?;
            tx.commit()?;

            info!("Comment {} owner acknowledgement set to {}", comment_id, value);
            Ok(())
        })
    }
}

/// Display order for a profile's comments:
///
/// 1. the viewer's own comment,
/// 2. owner-acknowledged before the rest,
/// 3. higher net score (likes minus dislikes) first,
/// 4. older comment (lower id) first.
pub fn rank_comments(views: &mut [CommentView]) {
    views.sort_by(compare_for_display);
}

fn compare_for_display(a: &CommentView, b: &CommentView) -> Ordering {
    b.authored_by_viewer
        .cmp(&a.authored_by_viewer)
        .then_with(|| b.owner_acknowledged.cmp(&a.owner_acknowledged))
        .then_with(|| b.net_score().cmp(&a.net_score()))
        .then_with(|| a.id.cmp(&b.id))
}

pub(crate) fn query_comment(
    conn: &Connection,
    id: CommentId,
) -> Result<Option<CommentRow>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
            [id],
            comment_from_row,
        )
        .optional()?;
    Ok(row)
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        receiver_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        owner_acknowledged: row.get(4)?,
        created_at: row.get(5)?,
    })
}
