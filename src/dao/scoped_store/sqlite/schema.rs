use sqlx::SqlitePool;

use super::error::{SqlDaoError, SqlResult};

pub const COMMENTS_TABLE: &str = "comments";
pub const RECORDS_TABLE: &str = "leaderboard_records";

const SCHEMA: [(&str, &str); 4] = [
    (
        "comments",
        "CREATE TABLE IF NOT EXISTS comments (
            comment_name TEXT NOT NULL,
            parent_type TEXT NOT NULL,
            parent_name TEXT NOT NULL,
            author TEXT NOT NULL,
            time INTEGER NOT NULL,
            content TEXT NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (comment_name, parent_type, parent_name)
        )",
    ),
    (
        "idx_comments_parent",
        "CREATE INDEX IF NOT EXISTS idx_comments_parent
            ON comments (parent_type, parent_name, time DESC)",
    ),
    (
        "leaderboard_records",
        "CREATE TABLE IF NOT EXISTS leaderboard_records (
            record_name TEXT NOT NULL,
            parent_type TEXT NOT NULL,
            parent_name TEXT NOT NULL,
            leaderboard_name TEXT NOT NULL,
            rank TEXT NOT NULL,
            player TEXT NOT NULL,
            value TEXT NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (record_name, parent_type, parent_name, leaderboard_name)
        )",
    ),
    (
        "idx_leaderboard_records_parent",
        "CREATE INDEX IF NOT EXISTS idx_leaderboard_records_parent
            ON leaderboard_records (parent_type, parent_name, leaderboard_name, rank)",
    ),
];

/// Create the tables and the per-scope ordering indexes when missing.
pub async fn ensure_schema(pool: &SqlitePool) -> SqlResult<()> {
    for (object, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|source| SqlDaoError::EnsureSchema { object, source })?;
    }
    Ok(())
}
