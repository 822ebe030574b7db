//! Execution ledger repository.
//!
//! # Responsibility
//! - Persist proposal -> executed-at-height records.
//! - Journal one `execute` event per record.
//!
//! # Invariants
//! - At most one record per proposal identity; its height never changes.
//! - Check-then-insert is a single conflict-guarded statement, so no caller
//!   can observe a half-recorded proposal.

use crate::model::event::GovernanceEvent;
use crate::model::principal::Principal;
use crate::model::records::{BlockHeight, ExecutionRecord};
use crate::repo::event_repo::append_event;
use crate::repo::{
    ensure_connection_ready, height_from_db, height_to_db, parse_principal_column, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for the one-shot execution ledger.
pub trait ExecutionLedger {
    fn executed_at(&self, proposal: &Principal) -> RepoResult<Option<BlockHeight>>;
    /// Inserts a record or fails with `RepoError::AlreadyExecuted`.
    fn record_execution(&self, proposal: &Principal, block_height: BlockHeight) -> RepoResult<()>;

    fn list_executions(&self) -> RepoResult<Vec<ExecutionRecord>>;
}

/// SQLite-backed execution ledger.
pub struct SqliteExecutionLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExecutionLedger<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "executed_proposals")?;
        Ok(Self { conn })
    }
}

impl ExecutionLedger for SqliteExecutionLedger<'_> {
    fn executed_at(&self, proposal: &Principal) -> RepoResult<Option<BlockHeight>> {
        let height: Option<i64> = self
            .conn
            .query_row(
                "SELECT executed_at FROM executed_proposals WHERE proposal = ?1;",
                [proposal.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        height
            .map(|value| height_from_db(value, "executed_proposals.executed_at"))
            .transpose()
    }

    fn record_execution(&self, proposal: &Principal, block_height: BlockHeight) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO executed_proposals (proposal, executed_at) VALUES (?1, ?2)
             ON CONFLICT (proposal) DO NOTHING;",
            params![proposal.to_string(), height_to_db(block_height)?],
        )?;
        if inserted == 0 {
            return Err(RepoError::AlreadyExecuted(proposal.clone()));
        }

        append_event(
            &tx,
            block_height,
            &GovernanceEvent::Execute {
                proposal: proposal.clone(),
            },
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_executions(&self) -> RepoResult<Vec<ExecutionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT proposal, executed_at FROM executed_proposals
             ORDER BY executed_at ASC, proposal ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let proposal_text: String = row.get("proposal")?;
            records.push(ExecutionRecord {
                proposal: parse_principal_column(&proposal_text, "executed_proposals.proposal")?,
                executed_at: height_from_db(
                    row.get("executed_at")?,
                    "executed_proposals.executed_at",
                )?,
            });
        }
        Ok(records)
    }
}

/// Inserts one ledger record and its journal event on `conn`, which is
/// expected to be an open transaction.
pub(crate) fn insert_execution(
    conn: &Connection,
    proposal: &Principal,
    block_height: BlockHeight,
) -> RepoResult<()> {
    let inserted = conn.execute(
        "INSERT INTO executed_proposals (proposal, executed_at) VALUES (?1, ?2)
         ON CONFLICT (proposal) DO NOTHING;",
        params![proposal.to_string(), height_to_db(block_height)?],
    )?;
    if inserted == 0 {
        return Err(RepoError::AlreadyExecuted(proposal.clone()));
    }

    append_event(
        conn,
        block_height,
        &GovernanceEvent::Execute {
            proposal: proposal.clone(),
        },
    )
}
