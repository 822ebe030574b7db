//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per governance concern.
//! - Isolate SQLite query details from authorization/dispatch logic.
//!
//! # Invariants
//! - Repositories only open on fully migrated connections.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Multi-row writes and their journal events commit together.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::principal::Principal;
use crate::model::records::BlockHeight;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod event_repo;
pub mod executive_repo;
pub mod extension_repo;
pub mod ledger_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by governance persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Proposal identity already has a ledger record.
    AlreadyExecuted(Principal),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Host block height does not fit the storage column.
    HeightOutOfRange(BlockHeight),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::AlreadyExecuted(proposal) => {
                write!(f, "proposal already executed: {proposal}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table is missing: {table}"),
            Self::InvalidData(message) => write!(f, "invalid persisted governance data: {message}"),
            Self::HeightOutOfRange(height) => {
                write!(f, "block height {height} exceeds the storable range")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn ensure_connection_ready(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }
    Ok(())
}

pub(crate) fn parse_principal_column(value: &str, column: &str) -> RepoResult<Principal> {
    value
        .parse()
        .map_err(|err| RepoError::InvalidData(format!("invalid principal `{value}` in {column}: {err}")))
}

pub(crate) fn height_to_db(height: BlockHeight) -> RepoResult<i64> {
    i64::try_from(height).map_err(|_| RepoError::HeightOutOfRange(height))
}

pub(crate) fn height_from_db(value: i64, column: &str) -> RepoResult<BlockHeight> {
    BlockHeight::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative block height `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
