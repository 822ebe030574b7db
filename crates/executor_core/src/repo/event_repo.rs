//! Governance event journal repository.
//!
//! # Invariants
//! - Journal rows are append-only and listed in insertion order.
//! - Payloads are the JSON form of `GovernanceEvent`; `kind` mirrors its tag.

use crate::model::event::{GovernanceEvent, RecordedEvent};
use crate::model::records::BlockHeight;
use crate::repo::{ensure_connection_ready, height_from_db, height_to_db, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const EVENT_SELECT_SQL: &str = "SELECT id, block_height, kind, payload FROM governance_events";

/// Read access to the governance event journal.
pub trait EventJournal {
    fn list_events(&self) -> RepoResult<Vec<RecordedEvent>>;
    fn list_events_of_kind(&self, kind: &str) -> RepoResult<Vec<RecordedEvent>>;
}

/// SQLite-backed event journal.
pub struct SqliteEventJournal<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventJournal<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "governance_events")?;
        Ok(Self { conn })
    }
}

impl EventJournal for SqliteEventJournal<'_> {
    fn list_events(&self) -> RepoResult<Vec<RecordedEvent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn list_events_of_kind(&self, kind: &str) -> RepoResult<Vec<RecordedEvent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE kind = ?1 ORDER BY id ASC;"))?;
        let mut rows = stmt.query([kind])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

/// Appends one event on `conn`, which may be an open transaction.
pub(crate) fn append_event(
    conn: &Connection,
    block_height: BlockHeight,
    event: &GovernanceEvent,
) -> RepoResult<()> {
    let payload = serde_json::to_string(event)
        .map_err(|err| RepoError::InvalidData(format!("unserializable governance event: {err}")))?;
    conn.execute(
        "INSERT INTO governance_events (block_height, kind, payload) VALUES (?1, ?2, ?3);",
        params![height_to_db(block_height)?, event.kind(), payload],
    )?;
    Ok(())
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<RecordedEvent> {
    let payload: String = row.get("payload")?;
    let event: GovernanceEvent = serde_json::from_str(&payload).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid payload in governance_events.payload: {err}"
        ))
    })?;

    let kind: String = row.get("kind")?;
    if kind != event.kind() {
        return Err(RepoError::InvalidData(format!(
            "governance_events.kind `{kind}` does not match payload kind `{}`",
            event.kind()
        )));
    }

    Ok(RecordedEvent {
        seq: row.get("id")?,
        block_height: height_from_db(row.get("block_height")?, "governance_events.block_height")?,
        event,
    })
}
