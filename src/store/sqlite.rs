//! SQLite-backed conversation store.
//!
//! DB location: `~/.smartcloud/cloud_history.db` unless `database_path` is configured.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{ConversationStore, SessionSummary};
use crate::agents::state::{ConversationState, RouteDecision};
use crate::core::error::SmartCloudError;
use crate::providers::{Message, Role};

/// One long-lived connection guarded by a mutex; rusqlite's `Connection` is not `Sync`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run migrations.
    pub fn open(db_path: &Path) -> Result<Self, SmartCloudError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        Self::migrate(&conn)?;
        debug!(path = %db_path.display(), "opened conversation store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> Result<(), SmartCloudError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                 id TEXT PRIMARY KEY,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL,
                 next_agent TEXT
             );

             CREATE TABLE IF NOT EXISTS messages (
                 session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                 seq INTEGER NOT NULL,
                 role TEXT NOT NULL,
                 content TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 PRIMARY KEY (session_id, seq)
             );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SmartCloudError> {
        self.conn
            .lock()
            .map_err(|_| SmartCloudError::Store("connection mutex poisoned".to_string()))
    }
}

impl ConversationStore for SqliteStore {
    fn load(&self, session_id: &str) -> Result<Option<ConversationState>, SmartCloudError> {
        let conn = self.lock()?;

        let next_agent: Option<Option<String>> = conn
            .query_row(
                "SELECT next_agent FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(next_agent) = next_agent else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT role, content FROM messages WHERE session_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content) = row?;
            let role = Role::parse(&role).ok_or_else(|| {
                SmartCloudError::Store(format!("unknown role '{}' in session {}", role, session_id))
            })?;
            messages.push(Message { role, content });
        }

        Ok(Some(ConversationState {
            messages,
            next_agent: next_agent.as_deref().and_then(RouteDecision::parse),
        }))
    }

    fn append(&self, session_id: &str, messages: &[Message]) -> Result<(), SmartCloudError> {
        if let Some(m) = messages.iter().find(|m| m.role == Role::System) {
            return Err(SmartCloudError::Input(format!(
                "system messages are not part of the conversation log: {}",
                m.content
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at",
            params![session_id, now],
        )?;

        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO messages (session_id, seq, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (offset, message) in messages.iter().enumerate() {
                insert.execute(params![
                    session_id,
                    next_seq + offset as i64,
                    message.role.as_str(),
                    message.content,
                    now
                ])?;
            }
        }

        tx.commit()?;
        debug!(session_id, count = messages.len(), "appended messages");
        Ok(())
    }

    fn set_next_agent(
        &self,
        session_id: &str,
        next_agent: Option<RouteDecision>,
    ) -> Result<(), SmartCloudError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sessions (id, created_at, updated_at, next_agent) VALUES (?1, ?2, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET next_agent = excluded.next_agent, updated_at = excluded.updated_at",
            params![session_id, now, next_agent.map(|d| d.as_str())],
        )?;
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<SessionSummary>, SmartCloudError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT s.id, COUNT(m.seq), s.updated_at
             FROM sessions s LEFT JOIN messages m ON m.session_id = s.id
             GROUP BY s.id
             ORDER BY s.updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionSummary {
                id: row.get(0)?,
                message_count: row.get::<_, i64>(1)? as usize,
                updated_at: row.get(2)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    fn delete_session(&self, session_id: &str) -> Result<bool, SmartCloudError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        let removed = tx.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("history.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn unknown_session_loads_as_none() {
        let (_dir, store) = temp_store();
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn appends_accumulate_in_order() {
        let (_dir, store) = temp_store();
        store
            .append("s1", &[Message::user("what's my CPU usage?")])
            .unwrap();
        store
            .append("s1", &[Message::assistant("Monitoring Agent: CPU 12%")])
            .unwrap();

        let state = store.load("s1").unwrap().unwrap();
        assert_eq!(
            state.messages,
            vec![
                Message::user("what's my CPU usage?"),
                Message::assistant("Monitoring Agent: CPU 12%"),
            ]
        );
        assert_eq!(state.next_agent, None);
    }

    #[test]
    fn repeated_loads_are_identical() {
        let (_dir, store) = temp_store();
        store
            .append("s1", &[Message::user("a"), Message::assistant("b")])
            .unwrap();
        store
            .set_next_agent("s1", Some(RouteDecision::Finish))
            .unwrap();

        let first = store.load("s1").unwrap();
        let second = store.load("s1").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.unwrap().next_agent, Some(RouteDecision::Finish));
    }

    #[test]
    fn state_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.append("terminal_user", &[Message::user("hi")]).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let state = store.load("terminal_user").unwrap().unwrap();
        assert_eq!(state.messages, vec![Message::user("hi")]);
    }

    #[test]
    fn sessions_are_partitioned() {
        let (_dir, store) = temp_store();
        store.append("a", &[Message::user("one")]).unwrap();
        store.append("b", &[Message::user("two"), Message::assistant("x")]).unwrap();

        assert_eq!(store.load("a").unwrap().unwrap().messages.len(), 1);
        let mut listed = store.list_sessions().unwrap();
        listed.sort_by(|l, r| l.id.cmp(&r.id));
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].id, "b");
        assert_eq!(listed[1].message_count, 2);
    }

    #[test]
    fn system_messages_are_rejected() {
        let (_dir, store) = temp_store();
        let err = store
            .append("s1", &[Message::system("You are a router")])
            .unwrap_err();
        assert!(matches!(err, SmartCloudError::Input(_)));
        assert!(store.load("s1").unwrap().is_none());
    }

    #[test]
    fn delete_removes_session_and_log() {
        let (_dir, store) = temp_store();
        store.append("gone", &[Message::user("bye")]).unwrap();
        assert!(store.delete_session("gone").unwrap());
        assert!(store.load("gone").unwrap().is_none());
        assert!(!store.delete_session("gone").unwrap());
    }
}
