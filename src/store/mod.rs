//! SQLite-backed participant assignments
//!
//! One row per (profile, participant). Allocation reads the profile's used
//! sets, picks the first free one and inserts the row inside a single
//! IMMEDIATE transaction, so concurrent joins can neither give one participant
//! two sets nor give two participants the same set.

pub mod schema;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::profile::Profile;

/// A participant's set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub profile: Profile,
    pub participant_id: String,
    pub set_path: String,
    /// False when the participant already held this set
    pub created: bool,
}

pub struct AssignmentStore {
    conn: Mutex<Connection>,
}

impl AssignmentStore {
    /// Open or create the assignment database
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening assignment database at {:?}", db_path);

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory assignment database");
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| Error::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// The participant's set, without allocating one.
    pub fn get(&self, profile: Profile, participant_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| get_set(conn, profile, participant_id))
    }

    /// Sets already held by some participant of `profile`.
    pub fn used_sets(&self, profile: Profile) -> Result<HashSet<String>> {
        self.with_conn(|conn| used_sets(conn, profile))
    }

    /// Participant ids known under `profile`.
    pub fn participant_ids(&self, profile: Profile) -> Result<Vec<String>> {
        self.with_conn(|conn| participant_ids(conn, profile))
    }

    /// Smallest positive integer not yet used as an id under `profile`.
    pub fn next_participant_id(&self, profile: Profile) -> Result<String> {
        self.with_conn(|conn| next_participant_id(conn, profile))
    }

    /// Resolve or allocate the participant's set.
    ///
    /// `available` is the profile's set list in allocation order. Returns the
    /// existing set unchanged on repeat calls, otherwise the first set no other
    /// participant holds. Fails with [`Error::SetsExhausted`] when every set is
    /// taken.
    pub fn assign(
        &self,
        profile: Profile,
        participant_id: &str,
        available: &[String],
    ) -> Result<String> {
        self.join(profile, Some(participant_id), available)
            .map(|a| a.set_path)
    }

    /// Like [`assign`](Self::assign), allocating the next numeric participant
    /// id in the same transaction when none is given.
    pub fn join(
        &self,
        profile: Profile,
        participant_id: Option<&str>,
        available: &[String],
    ) -> Result<Assignment> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let participant_id = match participant_id {
                Some(id) => id.to_string(),
                None => next_participant_id(&tx, profile)?,
            };

            if let Some(set_path) = get_set(&tx, profile, &participant_id)? {
                return Ok(Assignment {
                    profile,
                    participant_id,
                    set_path,
                    created: false,
                });
            }

            let used = used_sets(&tx, profile)?;
            let Some(set_path) = available.iter().find(|s| !used.contains(*s)).cloned() else {
                return Err(Error::SetsExhausted(profile));
            };

            tx.execute(
                "INSERT INTO assignments (profile, participant_id, set_path) VALUES (?1, ?2, ?3)",
                params![profile.as_str(), participant_id, set_path],
            )?;
            tx.commit()?;

            info!(
                profile = %profile,
                participant_id = %participant_id,
                set_path = %set_path,
                "Assigned set"
            );
            Ok(Assignment {
                profile,
                participant_id,
                set_path,
                created: true,
            })
        })
    }

    /// Drop every assignment. Returns how many were removed.
    pub fn reset(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let removed = tx.execute("DELETE FROM assignments", [])?;
            tx.commit()?;
            info!(removed, "Assignments reset");
            Ok(removed)
        })
    }
}

fn get_set(conn: &Connection, profile: Profile, participant_id: &str) -> Result<Option<String>> {
    let set_path = conn
        .prepare_cached(
            "SELECT set_path FROM assignments WHERE profile = ?1 AND participant_id = ?2",
        )?
        .query_row(params![profile.as_str(), participant_id], |row| row.get(0))
        .optional()?;
    Ok(set_path)
}

fn used_sets(conn: &Connection, profile: Profile) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare_cached("SELECT set_path FROM assignments WHERE profile = ?1")?;
    let sets = stmt
        .query_map(params![profile.as_str()], |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(sets)
}

fn participant_ids(conn: &Connection, profile: Profile) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT participant_id FROM assignments WHERE profile = ?1 ORDER BY participant_id",
    )?;
    let ids = stmt
        .query_map(params![profile.as_str()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

fn next_participant_id(conn: &Connection, profile: Profile) -> Result<String> {
    let taken: HashSet<u64> = participant_ids(conn, profile)?
        .iter()
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|id| id.parse().ok())
        .collect();
    let next = (1..).find(|n| !taken.contains(n)).unwrap_or(1);
    Ok(next.to_string())
}
