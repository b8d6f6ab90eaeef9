//! Assignment database schema

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

const ASSIGNMENTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assignments (
    profile TEXT NOT NULL,
    participant_id TEXT NOT NULL,
    set_path TEXT NOT NULL,
    PRIMARY KEY (profile, participant_id)
);
";

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version == 0 {
        info!("Creating assignment schema v{}", SCHEMA_VERSION);
        conn.execute_batch(ASSIGNMENTS_SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}
