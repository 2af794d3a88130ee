use std::sync::Mutex;

use rusqlite::Connection;
use tracing::instrument;

use crate::error::{Result, UserError};

/// A tracked user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    pub joined_at: Option<String>,
    pub message_count: u64,
    pub last_interaction: Option<String>,
}

/// Aggregate statistics for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub message_count: u64,
    pub joined_at: Option<String>,
    pub last_interaction: Option<String>,
}

/// Thread-safe store for per-user interaction statistics.
///
/// Wraps a single SQLite connection in a `Mutex` — sufficient for the
/// single-node target.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Retrieve a user by id, returning `None` if never seen.
    #[instrument(skip(self))]
    pub fn get(&self, user_id: &str) -> Result<Option<User>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT id, username, discriminator, joined_at, message_count, last_interaction
             FROM users WHERE id = ?1",
            rusqlite::params![user_id],
            row_to_user,
        ) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(UserError::Database(e)),
        }
    }

    /// Record one interaction: insert the user on first sight, otherwise
    /// refresh the name fields, bump `message_count` and `last_interaction`.
    #[instrument(skip(self, username, discriminator))]
    pub fn record_message(
        &self,
        user_id: &str,
        username: &str,
        discriminator: Option<&str>,
    ) -> Result<()> {
        let discriminator = discriminator.unwrap_or("");
        let db = self.db.lock().unwrap();
        let updated = db.execute(
            "UPDATE users
             SET username = ?1, discriminator = ?2,
                 message_count = message_count + 1,
                 last_interaction = CURRENT_TIMESTAMP
             WHERE id = ?3",
            rusqlite::params![username, discriminator, user_id],
        )?;
        if updated == 0 {
            db.execute(
                "INSERT INTO users (id, username, discriminator, message_count, last_interaction)
                 VALUES (?1, ?2, ?3, 1, CURRENT_TIMESTAMP)",
                rusqlite::params![user_id, username, discriminator],
            )?;
        }
        Ok(())
    }

    /// Aggregate stats for a user, `None` if never seen.
    #[instrument(skip(self))]
    pub fn stats(&self, user_id: &str) -> Result<Option<UserStats>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT message_count, joined_at, last_interaction FROM users WHERE id = ?1",
            rusqlite::params![user_id],
            |row| {
                Ok(UserStats {
                    message_count: row.get::<_, i64>(0)? as u64,
                    joined_at: row.get(1)?,
                    last_interaction: row.get(2)?,
                })
            },
        ) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(UserError::Database(e)),
        }
    }
}

/// Map a SELECT row (column order as in `get`) to a `User`.
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        discriminator: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        joined_at: row.get(3)?,
        message_count: row.get::<_, i64>(4)? as u64,
        last_interaction: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn store() -> UserStore {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        UserStore::new(conn)
    }

    #[test]
    fn unknown_user_is_none() {
        let s = store();
        assert!(s.get("1").unwrap().is_none());
        assert!(s.stats("1").unwrap().is_none());
    }

    #[test]
    fn first_message_inserts_with_count_one() {
        let s = store();
        s.record_message("1", "alice", Some("0001")).unwrap();
        let u = s.get("1").unwrap().unwrap();
        assert_eq!(u.username, "alice");
        assert_eq!(u.message_count, 1);
        assert!(u.last_interaction.is_some());
    }

    #[test]
    fn later_messages_increment_and_refresh_name() {
        let s = store();
        s.record_message("1", "alice", None).unwrap();
        s.record_message("1", "alice-renamed", None).unwrap();
        s.record_message("1", "alice-renamed", None).unwrap();
        let stats = s.stats("1").unwrap().unwrap();
        assert_eq!(stats.message_count, 3);
        let u = s.get("1").unwrap().unwrap();
        assert_eq!(u.username, "alice-renamed");
    }
}
