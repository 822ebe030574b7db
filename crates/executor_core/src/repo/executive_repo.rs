//! Executive state repository.
//!
//! # Invariants
//! - The `executive` table holds at most one row (`id = 1`).
//! - Once seeded, the row is only replaced together with the ledger record
//!   of the proposal that the handover runs.

use crate::model::executive::{ExecutivePhase, ExecutiveState};
use crate::model::principal::Principal;
use crate::model::records::BlockHeight;
use crate::repo::ledger_repo::insert_execution;
use crate::repo::{ensure_connection_ready, parse_principal_column, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for the single executive slot.
pub trait ExecutiveRepository {
    fn load(&self) -> RepoResult<Option<ExecutiveState>>;
    /// Persists `initial` unless a state already exists; returns the
    /// effective state.
    fn seed(&self, initial: &ExecutiveState) -> RepoResult<ExecutiveState>;
    /// Replaces the state and records `proposal` as executed at
    /// `block_height`, both or neither.
    ///
    /// Fails with `RepoError::AlreadyExecuted` when the proposal already has
    /// a ledger record.
    fn store_with_execution(
        &self,
        state: &ExecutiveState,
        proposal: &Principal,
        block_height: BlockHeight,
    ) -> RepoResult<()>;
}

/// SQLite-backed executive slot.
pub struct SqliteExecutiveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExecutiveRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "executive")?;
        Ok(Self { conn })
    }
}

impl ExecutiveRepository for SqliteExecutiveRepository<'_> {
    fn load(&self) -> RepoResult<Option<ExecutiveState>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT principal, phase FROM executive WHERE id = 1;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((principal_text, phase_text)) = row else {
            return Ok(None);
        };
        let principal = parse_principal_column(&principal_text, "executive.principal")?;
        let state = match ExecutivePhase::parse(&phase_text) {
            Some(ExecutivePhase::Unconstructed) => ExecutiveState::Unconstructed {
                deployer: principal,
            },
            Some(ExecutivePhase::Constructed) => ExecutiveState::Constructed {
                executor: principal,
            },
            None => {
                return Err(RepoError::InvalidData(format!(
                    "invalid phase `{phase_text}` in executive.phase"
                )));
            }
        };
        Ok(Some(state))
    }

    fn seed(&self, initial: &ExecutiveState) -> RepoResult<ExecutiveState> {
        self.conn.execute(
            "INSERT INTO executive (id, principal, phase) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO NOTHING;",
            params![initial.holder().to_string(), initial.phase().as_str()],
        )?;
        self.load()?.ok_or_else(|| {
            RepoError::InvalidData("executive row missing right after seeding".to_string())
        })
    }

    fn store_with_execution(
        &self,
        state: &ExecutiveState,
        proposal: &Principal,
        block_height: BlockHeight,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        insert_execution(&tx, proposal, block_height)?;
        tx.execute(
            "INSERT INTO executive (id, principal, phase) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET
                principal = excluded.principal,
                phase = excluded.phase;",
            params![state.holder().to_string(), state.phase().as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }
}
