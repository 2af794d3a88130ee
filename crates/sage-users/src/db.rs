use rusqlite::{Connection, Result};

/// Initialise the users table. Safe to call on every startup — CREATE IF NOT
/// EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id               TEXT PRIMARY KEY,
            username         TEXT,
            discriminator    TEXT,
            joined_at        DATETIME DEFAULT CURRENT_TIMESTAMP,
            message_count    INTEGER DEFAULT 0,
            last_interaction DATETIME
        );",
    )
}
