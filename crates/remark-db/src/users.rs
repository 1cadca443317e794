use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::{Database, begin_write};
use crate::models::{UserId, UserRow};

const USER_COLUMNS: &str = "id, external_id, display_name, created_at";

impl Database {
    /// Records a successful sign-in. The first sighting of `external_id`
    /// creates the user; later sightings refresh the display name if it
    /// changed (GitHub logins can be renamed).
    pub fn upsert_user(&self, external_id: &str, display_name: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let tx = begin_write(conn)?;

            match query_user_by_external_id(&tx, external_id)? {
                None => {
                    tx.execute(
                        "INSERT INTO users (external_id, display_name) VALUES (?1, ?2)",
                        (external_id, display_name),
                    )?;
                    info!("New user {} (external id {})", display_name, external_id);
                }
                Some(existing) if existing.display_name != display_name => {
                    tx.execute(
                        "UPDATE users SET display_name = ?1 WHERE id = ?2",
                        (display_name, existing.id),
                    )?;
                    info!(
                        "User {} renamed {} -> {}",
                        existing.id, existing.display_name, display_name
                    );
                }
                Some(_) => debug!("Returning user {}", display_name),
            }

            let row = query_user_by_external_id(&tx, external_id)?
                .ok_or_else(|| anyhow!("User {} vanished during upsert", external_id))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Case-insensitive lookup by login. If a rename ever leaves two rows with
    /// the same login, the most recently created one wins.
    pub fn get_user_by_login(&self, login: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {USER_COLUMNS} FROM users
                         WHERE display_name = ?1 COLLATE NOCASE
                         ORDER BY id DESC LIMIT 1"
                    ),
                    [login],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: UserId) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            user_from_row,
        )
        .optional()?;
    Ok(row)
}

fn query_user_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"),
            [external_id],
            user_from_row,
        )
        .optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        external_id: row.get(1)?,
        display_name: row.get(2)?,
        created_at: row.get(3)?,
    })
}
