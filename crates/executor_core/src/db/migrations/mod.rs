//! Governance schema migrations.
//!
//! - v1 `governance_state`: `extensions` (principal, enabled flag),
//!   `executed_proposals` (proposal, executed-at height) and the singleton
//!   `executive` row.
//! - v2 `event_journal`: append-only `governance_events` with an index on
//!   `(kind, id)` for per-kind listings.
//!
//! Versions are strictly increasing and mirrored to `PRAGMA user_version`.
//! Pending versions apply in one transaction, so a crash never leaves a
//! half-migrated file.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "governance_state",
        sql: include_str!("0001_governance_state.sql"),
    },
    Migration {
        version: 2,
        name: "event_journal",
        sql: include_str!("0002_event_journal.sql"),
    },
];

/// Schema version a fully migrated connection reports.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to `latest_version()`.
///
/// Fails with `DbError::UnsupportedSchemaVersion` for a file from a newer
/// build and leaves it untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let pending = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version);
    for migration in pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
