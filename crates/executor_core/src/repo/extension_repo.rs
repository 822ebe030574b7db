//! Extension registry repository.
//!
//! # Responsibility
//! - Persist principal -> enabled mapping.
//! - Journal one `extension` event per applied entry.
//!
//! # Invariants
//! - Absent entry reads as "not an extension".
//! - Entries are upserted, never deleted.
//! - A batch is applied in order inside one transaction; later entries for
//!   the same principal override earlier ones.

use crate::model::event::GovernanceEvent;
use crate::model::principal::Principal;
use crate::model::records::{BlockHeight, ExtensionEntry};
use crate::repo::event_repo::append_event;
use crate::repo::{bool_to_int, ensure_connection_ready, parse_principal_column, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for the extension registry.
pub trait ExtensionRepository {
    /// Returns `true` only for a present entry with `enabled = true`.
    fn is_extension(&self, principal: &Principal) -> RepoResult<bool>;
    fn get_extension(&self, principal: &Principal) -> RepoResult<Option<ExtensionEntry>>;
    /// Lists every entry ordered by principal.
    fn list_extensions(&self) -> RepoResult<Vec<ExtensionEntry>>;
    /// Upserts all entries atomically at `block_height`.
    fn apply_entries(&self, entries: &[ExtensionEntry], block_height: BlockHeight)
        -> RepoResult<()>;
}

/// SQLite-backed extension registry.
pub struct SqliteExtensionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExtensionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "extensions")?;
        Ok(Self { conn })
    }
}

impl ExtensionRepository for SqliteExtensionRepository<'_> {
    fn is_extension(&self, principal: &Principal) -> RepoResult<bool> {
        Ok(self
            .get_extension(principal)?
            .is_some_and(|entry| entry.enabled))
    }

    fn get_extension(&self, principal: &Principal) -> RepoResult<Option<ExtensionEntry>> {
        let enabled: Option<i64> = self
            .conn
            .query_row(
                "SELECT enabled FROM extensions WHERE principal = ?1;",
                [principal.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match enabled {
            None => Ok(None),
            Some(0) => Ok(Some(ExtensionEntry::new(principal.clone(), false))),
            Some(1) => Ok(Some(ExtensionEntry::new(principal.clone(), true))),
            Some(other) => Err(RepoError::InvalidData(format!(
                "invalid enabled value `{other}` in extensions.enabled"
            ))),
        }
    }

    fn list_extensions(&self) -> RepoResult<Vec<ExtensionEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT principal, enabled FROM extensions ORDER BY principal ASC;")?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let principal_text: String = row.get("principal")?;
            let principal = parse_principal_column(&principal_text, "extensions.principal")?;
            let enabled = match row.get::<_, i64>("enabled")? {
                0 => false,
                1 => true,
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid enabled value `{other}` in extensions.enabled"
                    )));
                }
            };
            entries.push(ExtensionEntry::new(principal, enabled));
        }
        Ok(entries)
    }

    fn apply_entries(
        &self,
        entries: &[ExtensionEntry],
        block_height: BlockHeight,
    ) -> RepoResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO extensions (principal, enabled) VALUES (?1, ?2)
                 ON CONFLICT (principal) DO UPDATE SET enabled = excluded.enabled;",
            )?;
            for entry in entries {
                upsert.execute(params![entry.principal.to_string(), bool_to_int(entry.enabled)])?;
                append_event(
                    &tx,
                    block_height,
                    &GovernanceEvent::Extension {
                        extension: entry.principal.clone(),
                        enabled: entry.enabled,
                    },
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
