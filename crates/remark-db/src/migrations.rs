use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, comments, reactions)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id     TEXT NOT NULL UNIQUE,
                display_name    TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_users_display_name
                ON users(display_name COLLATE NOCASE);

            CREATE TABLE comments (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                receiver_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content             TEXT NOT NULL,
                owner_acknowledged  INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(author_id, receiver_id)
            );

            CREATE INDEX idx_comments_receiver
                ON comments(receiver_id);

            CREATE TABLE reactions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                comment_id  INTEGER NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind        TEXT NOT NULL CHECK (kind IN ('like', 'dislike')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(comment_id, user_id)
            );

            CREATE INDEX idx_reactions_comment
                ON reactions(comment_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
