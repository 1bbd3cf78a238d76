// store/sqlite.rs - SQLite backend.
//
// Each relation lives in its own table with a UNIQUE index on the logical
// key. The index is what enforces "at most one record per key" across
// threads and processes: a racing insert fails with a UNIQUE violation,
// which is reported as `Insertion::Conflict`.
//
// The store holds one connection per relation so the two relations lock
// independently. For `open_in_memory()` each connection is its own
// database, which is fine because the tables never join.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::action::Action;
use crate::error::StoreError;
use crate::graph::ControlEdge;
use crate::identity::UserId;
use crate::registry::DenialRecord;
use crate::store::{ControlStore, DenialStore, Insertion};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DENIALS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS denied_actions (
        id        TEXT PRIMARY KEY,
        user_id   TEXT NOT NULL,
        action    TEXT NOT NULL,
        denied_at TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_denied_actions_user_action
        ON denied_actions (user_id, action);
";

const CONTROL_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS control_edges (
        id         TEXT PRIMARY KEY,
        authorizer TEXT NOT NULL,
        authorizee TEXT NOT NULL,
        granted_at TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_control_edges_pair
        ON control_edges (authorizer, authorizee);
    CREATE INDEX IF NOT EXISTS idx_control_edges_authorizee
        ON control_edges (authorizee);
";

/// Persistent store backed by a SQLite database file.
#[derive(Debug)]
pub struct SqliteStore {
    denials: Mutex<Connection>,
    edges: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let denials = Self::connect(&path, DENIALS_SCHEMA)?;
        let edges = Self::connect(&path, CONTROL_SCHEMA)?;
        tracing::debug!(path = %path.display(), "opened sqlite authorization store");

        Ok(Self {
            denials: Mutex::new(denials),
            edges: Mutex::new(edges),
            path: Some(path),
        })
    }

    /// Open a private in-memory database. Nothing is persisted.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let denials = Connection::open_in_memory()?;
        denials.execute_batch(DENIALS_SCHEMA)?;
        let edges = Connection::open_in_memory()?;
        edges.execute_batch(CONTROL_SCHEMA)?;
        Ok(Self {
            denials: Mutex::new(denials),
            edges: Mutex::new(edges),
            path: None,
        })
    }

    /// Path of the database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connect(path: &Path, schema: &str) -> Result<Connection, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(schema)?;
        Ok(conn)
    }

    fn denials(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.denials.lock().map_err(|_| StoreError::Poisoned {
            relation: "denials",
        })
    }

    fn edges(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.edges.lock().map_err(|_| StoreError::Poisoned {
            relation: "control edges",
        })
    }
}

/// Map an insert result onto `Insertion`. Only a UNIQUE index violation is a
/// conflict; other constraint failures (primary key, NOT NULL) are errors.
fn insertion(result: rusqlite::Result<usize>) -> Result<Insertion, StoreError> {
    match result {
        Ok(_) => Ok(Insertion::Inserted),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(Insertion::Conflict)
        }
        Err(err) => Err(err.into()),
    }
}

fn parse_id(table: &'static str, raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::CorruptRow {
        table,
        reason: format!("bad id '{}': {}", raw, e),
    })
}

fn parse_timestamp(table: &'static str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table,
            reason: format!("bad timestamp '{}': {}", raw, e),
        })
}

type DenialRow = (String, String, String, String);
type EdgeRow = (String, String, String, String);

fn decode_denial(row: DenialRow) -> Result<DenialRecord, StoreError> {
    let (id, user, action, denied_at) = row;
    let action = action
        .parse::<Action>()
        .map_err(|e| StoreError::CorruptRow {
            table: "denied_actions",
            reason: e.to_string(),
        })?;
    Ok(DenialRecord {
        id: parse_id("denied_actions", &id)?,
        user: UserId::from(user),
        action,
        denied_at: parse_timestamp("denied_actions", &denied_at)?,
    })
}

fn decode_edge(row: EdgeRow) -> Result<ControlEdge, StoreError> {
    let (id, authorizer, authorizee, granted_at) = row;
    Ok(ControlEdge {
        id: parse_id("control_edges", &id)?,
        authorizer: UserId::from(authorizer),
        authorizee: UserId::from(authorizee),
        granted_at: parse_timestamp("control_edges", &granted_at)?,
    })
}

fn row_tuple(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

impl DenialStore for SqliteStore {
    fn insert_denial(&self, record: &DenialRecord) -> Result<Insertion, StoreError> {
        let conn = self.denials()?;
        insertion(conn.execute(
            "INSERT INTO denied_actions (id, user_id, action, denied_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id.to_string(),
                record.user.as_str(),
                record.action.as_str(),
                record.denied_at.to_rfc3339(),
            ],
        ))
    }

    fn remove_denials(&self, user: &UserId, action: Action) -> Result<usize, StoreError> {
        let conn = self.denials()?;
        let removed = conn.execute(
            "DELETE FROM denied_actions WHERE user_id = ?1 AND action = ?2",
            params![user.as_str(), action.as_str()],
        )?;
        Ok(removed)
    }

    fn find_denial(
        &self,
        user: &UserId,
        action: Action,
    ) -> Result<Option<DenialRecord>, StoreError> {
        let conn = self.denials()?;
        let row = conn
            .query_row(
                "SELECT id, user_id, action, denied_at FROM denied_actions \
                 WHERE user_id = ?1 AND action = ?2",
                params![user.as_str(), action.as_str()],
                row_tuple,
            )
            .optional()?;
        row.map(decode_denial).transpose()
    }

    fn denials_for(&self, user: &UserId) -> Result<Vec<DenialRecord>, StoreError> {
        let conn = self.denials()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, action, denied_at FROM denied_actions \
             WHERE user_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![user.as_str()], row_tuple)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode_denial).collect()
    }
}

impl SqliteStore {
    fn query_edges(&self, sql: &str, who: &UserId) -> Result<Vec<ControlEdge>, StoreError> {
        let conn = self.edges()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![who.as_str()], row_tuple)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode_edge).collect()
    }
}

impl ControlStore for SqliteStore {
    fn insert_edge(&self, edge: &ControlEdge) -> Result<Insertion, StoreError> {
        let conn = self.edges()?;
        insertion(conn.execute(
            "INSERT INTO control_edges (id, authorizer, authorizee, granted_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                edge.id.to_string(),
                edge.authorizer.as_str(),
                edge.authorizee.as_str(),
                edge.granted_at.to_rfc3339(),
            ],
        ))
    }

    fn remove_edge(&self, authorizer: &UserId, authorizee: &UserId) -> Result<usize, StoreError> {
        let conn = self.edges()?;
        let removed = conn.execute(
            "DELETE FROM control_edges WHERE authorizer = ?1 AND authorizee = ?2",
            params![authorizer.as_str(), authorizee.as_str()],
        )?;
        Ok(removed)
    }

    fn find_edge(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<Option<ControlEdge>, StoreError> {
        let conn = self.edges()?;
        let row = conn
            .query_row(
                "SELECT id, authorizer, authorizee, granted_at FROM control_edges \
                 WHERE authorizer = ?1 AND authorizee = ?2",
                params![authorizer.as_str(), authorizee.as_str()],
                row_tuple,
            )
            .optional()?;
        row.map(decode_edge).transpose()
    }

    fn edges_from(&self, authorizer: &UserId) -> Result<Vec<ControlEdge>, StoreError> {
        self.query_edges(
            "SELECT id, authorizer, authorizee, granted_at FROM control_edges \
             WHERE authorizer = ?1 ORDER BY rowid",
            authorizer,
        )
    }

    fn edges_to(&self, authorizee: &UserId) -> Result<Vec<ControlEdge>, StoreError> {
        self.query_edges(
            "SELECT id, authorizer, authorizee, granted_at FROM control_edges \
             WHERE authorizee = ?1 ORDER BY rowid",
            authorizee,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unique_index_turns_duplicates_into_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alice = UserId::from("alice");

        let first = DenialRecord::new(alice.clone(), Action::Post);
        assert_eq!(store.insert_denial(&first).unwrap(), Insertion::Inserted);
        let again = DenialRecord::new(alice.clone(), Action::Post);
        assert_eq!(store.insert_denial(&again).unwrap(), Insertion::Conflict);

        let listed = store.denials_for(&alice).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first.id);
    }

    #[test]
    fn primary_key_clash_is_an_error_not_a_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alice = UserId::from("alice");

        let first = DenialRecord::new(alice.clone(), Action::Post);
        store.insert_denial(&first).unwrap();
        let same_id = DenialRecord {
            action: Action::Message,
            ..first.clone()
        };
        let err = store.insert_denial(&same_id).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(store.find_denial(&alice, Action::Message).unwrap().is_none());

        let edge = ControlEdge::new(UserId::from("bob"), alice.clone());
        store.insert_edge(&edge).unwrap();
        let same_id = ControlEdge {
            authorizer: UserId::from("carol"),
            ..edge.clone()
        };
        assert!(matches!(store.insert_edge(&same_id), Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("nested").join("authz.db");
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        let record = DenialRecord::new(alice.clone(), Action::Nudge);
        {
            let store = SqliteStore::open(&db).unwrap();
            store.insert_denial(&record).unwrap();
            store
                .insert_edge(&ControlEdge::new(bob.clone(), alice.clone()))
                .unwrap();
        }

        let store = SqliteStore::open(&db).unwrap();
        assert_eq!(store.path(), Some(db.as_path()));
        let found = store.find_denial(&alice, Action::Nudge).unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.denied_at.timestamp(), record.denied_at.timestamp());
        assert!(store.find_edge(&bob, &alice).unwrap().is_some());
        assert_eq!(store.edges_to(&alice).unwrap().len(), 1);
    }

    #[test]
    fn listings_keep_insertion_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bob = UserId::from("bob");
        for name in ["zed", "amy", "kim"] {
            store
                .insert_edge(&ControlEdge::new(bob.clone(), UserId::from(name)))
                .unwrap();
        }
        let names: Vec<String> = store
            .edges_from(&bob)
            .unwrap()
            .into_iter()
            .map(|e| e.authorizee.to_string())
            .collect();
        assert_eq!(names, vec!["zed", "amy", "kim"]);
    }

    #[test]
    fn remove_reports_row_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alice = UserId::from("alice");
        assert_eq!(store.remove_denials(&alice, Action::Record).unwrap(), 0);
        store
            .insert_denial(&DenialRecord::new(alice.clone(), Action::Record))
            .unwrap();
        assert_eq!(store.remove_denials(&alice, Action::Record).unwrap(), 1);
        assert!(store.find_denial(&alice, Action::Record).unwrap().is_none());
    }

    #[test]
    fn unknown_stored_label_is_corrupt_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.denials().unwrap();
            conn.execute(
                "INSERT INTO denied_actions (id, user_id, action, denied_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    "alice",
                    "Teleport",
                    Utc::now().to_rfc3339()
                ],
            )
            .unwrap();
        }
        let err = store.denials_for(&UserId::from("alice")).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRow { table: "denied_actions", .. }));
    }
}
