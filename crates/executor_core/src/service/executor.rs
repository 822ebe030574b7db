//! Governance executor dispatch engine.
//!
//! # Responsibility
//! - Expose the executor operation surface: registry writes, proposal
//!   execution, bootstrap construction and extension callbacks.
//! - Gate every mutation through the authority controller before touching
//!   state.
//!
//! # Invariants
//! - Authorization and already-executed checks run strictly before any
//!   nested invocation.
//! - The ledger record is committed before the proposal body runs and is
//!   never undone, whatever the body returns.
//! - Rejected operations leave registry, ledger and executive untouched.
//! - Callbacks never touch the ledger.

use crate::host::{EntryCall, Host};
use crate::model::event::RecordedEvent;
use crate::model::executive::{ExecutivePhase, ExecutiveState};
use crate::model::principal::Principal;
use crate::model::records::{BlockHeight, ExecutionRecord, ExtensionEntry};
use crate::repo::event_repo::{EventJournal, SqliteEventJournal};
use crate::repo::executive_repo::SqliteExecutiveRepository;
use crate::repo::extension_repo::{ExtensionRepository, SqliteExtensionRepository};
use crate::repo::ledger_repo::{ExecutionLedger, SqliteExecutionLedger};
use crate::service::authority::AuthorityController;
use crate::service::error::{ExecutorError, ExecutorResult};
use log::{info, warn};
use rusqlite::Connection;

/// Maximum number of entries accepted by one `set_extensions` call.
pub const MAX_EXTENSION_BATCH: usize = 200;
/// Maximum callback memo length in bytes.
pub const MAX_CALLBACK_MEMO_BYTES: usize = 34;

/// Governance executor bound to one database connection and host.
pub struct Executor<'a> {
    identity: Principal,
    host: &'a dyn Host,
    registry: SqliteExtensionRepository<'a>,
    ledger: SqliteExecutionLedger<'a>,
    authority: AuthorityController<SqliteExecutiveRepository<'a>>,
    journal: SqliteEventJournal<'a>,
}

impl<'a> Executor<'a> {
    /// Opens the executor deployed at `identity`.
    ///
    /// A fresh database is seeded with `deployer` as executive; an existing
    /// one keeps its persisted executive state.
    pub fn try_new(
        conn: &'a Connection,
        host: &'a dyn Host,
        identity: Principal,
        deployer: Principal,
    ) -> ExecutorResult<Self> {
        let (authority, state) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(conn)?,
            &ExecutiveState::deployed_by(deployer.clone()),
        )?;

        match &state {
            ExecutiveState::Unconstructed { deployer: persisted } if *persisted != deployer => {
                warn!(
                    "event=executor_open module=executor status=mismatch configured_deployer={} persisted_deployer={}",
                    deployer, persisted
                );
            }
            ExecutiveState::Constructed { executor } if *executor != identity => {
                warn!(
                    "event=executor_open module=executor status=mismatch identity={} persisted_executor={}",
                    identity, executor
                );
            }
            _ => {}
        }
        info!(
            "event=executor_open module=executor status=ok identity={} phase={} executive={}",
            identity,
            state.phase().as_str(),
            state.holder()
        );

        Ok(Self {
            identity,
            host,
            registry: SqliteExtensionRepository::try_new(conn)?,
            ledger: SqliteExecutionLedger::try_new(conn)?,
            authority,
            journal: SqliteEventJournal::try_new(conn)?,
        })
    }

    /// The executor's own principal.
    pub fn identity(&self) -> &Principal {
        &self.identity
    }

    pub fn block_height(&self) -> BlockHeight {
        self.host.block_height()
    }

    pub fn is_extension(&self, principal: &Principal) -> ExecutorResult<bool> {
        Ok(self.registry.is_extension(principal)?)
    }

    pub fn executed_at(&self, proposal: &Principal) -> ExecutorResult<Option<BlockHeight>> {
        Ok(self.ledger.executed_at(proposal)?)
    }

    pub fn executive(&self) -> ExecutorResult<ExecutiveState> {
        Ok(self.authority.state()?)
    }

    pub fn phase(&self) -> ExecutorResult<ExecutivePhase> {
        Ok(self.executive()?.phase())
    }

    pub fn is_executive(&self, caller: &Principal) -> ExecutorResult<bool> {
        Ok(self.authority.is_executive(caller)?)
    }

    pub fn is_authorized(&self, caller: &Principal) -> ExecutorResult<bool> {
        Ok(self.authority.is_authorized(caller, &self.registry)?)
    }

    /// Every registry entry, enabled or not, ordered by principal.
    pub fn extensions(&self) -> ExecutorResult<Vec<ExtensionEntry>> {
        Ok(self.registry.list_extensions()?)
    }

    pub fn executions(&self) -> ExecutorResult<Vec<ExecutionRecord>> {
        Ok(self.ledger.list_executions()?)
    }

    pub fn events(&self) -> ExecutorResult<Vec<RecordedEvent>> {
        Ok(self.journal.list_events()?)
    }

    /// Journal entries whose tag equals `kind` (`extension` or `execute`).
    pub fn events_of_kind(&self, kind: &str) -> ExecutorResult<Vec<RecordedEvent>> {
        Ok(self.journal.list_events_of_kind(kind)?)
    }

    /// Enables or disables one extension.
    pub fn set_extension(
        &self,
        caller: &Principal,
        extension: &Principal,
        enabled: bool,
    ) -> ExecutorResult<bool> {
        self.require_authorized(caller, "set_extension")?;
        self.registry.apply_entries(
            &[ExtensionEntry::new(extension.clone(), enabled)],
            self.host.block_height(),
        )?;
        info!(
            "event=extension_set module=executor status=ok caller={} extension={} enabled={}",
            caller, extension, enabled
        );
        Ok(true)
    }

    /// Applies a batch of registry writes in order, all or nothing.
    pub fn set_extensions(
        &self,
        caller: &Principal,
        entries: &[ExtensionEntry],
    ) -> ExecutorResult<bool> {
        self.require_authorized(caller, "set_extensions")?;
        if entries.len() > MAX_EXTENSION_BATCH {
            warn!(
                "event=extension_batch module=executor status=rejected caller={} entries={} error_code=batch_too_large",
                caller,
                entries.len()
            );
            return Err(ExecutorError::BatchTooLarge {
                len: entries.len(),
                max: MAX_EXTENSION_BATCH,
            });
        }

        self.registry
            .apply_entries(entries, self.host.block_height())?;
        info!(
            "event=extension_batch module=executor status=ok caller={} entries={}",
            caller,
            entries.len()
        );
        Ok(true)
    }

    /// Executes `proposal` once, forwarding `caller` as its sender.
    pub fn execute(&self, caller: &Principal, proposal: &Principal) -> ExecutorResult<bool> {
        self.require_authorized(caller, "execute")?;
        if let Some(height) = self.ledger.executed_at(proposal)? {
            return Err(self.reject_already_executed(proposal, height));
        }

        let height = self.host.block_height();
        self.ledger.record_execution(proposal, height)?;
        info!(
            "event=proposal_recorded module=executor status=ok proposal={} height={}",
            proposal, height
        );
        self.invoke_proposal(proposal, caller)
    }

    /// Hands the executive role to the executor and runs the bootstrap
    /// proposal.
    ///
    /// Only the current executive may call this. Before construction that is
    /// the deployer; afterwards only the executor itself qualifies. The
    /// handover and the bootstrap ledger record commit together before the
    /// proposal body runs.
    pub fn construct(&self, caller: &Principal, proposal: &Principal) -> ExecutorResult<bool> {
        if !self.authority.is_executive(caller)? {
            return Err(self.reject_unauthorized(caller, "construct"));
        }
        if let Some(height) = self.ledger.executed_at(proposal)? {
            return Err(self.reject_already_executed(proposal, height));
        }

        let height = self.host.block_height();
        let Some(state) = self
            .authority
            .hand_over(caller, &self.identity, proposal, height)?
        else {
            return Err(self.reject_unauthorized(caller, "construct"));
        };
        info!(
            "event=construct module=executor status=ok caller={} executive={} proposal={} height={}",
            caller,
            state.holder(),
            proposal,
            height
        );

        self.invoke_proposal(proposal, caller)
    }

    /// Lets an enabled extension call back into itself through the executor.
    pub fn request_extension_callback(
        &self,
        caller: &Principal,
        extension: &Principal,
        memo: &[u8],
    ) -> ExecutorResult<bool> {
        if caller != extension || !self.registry.is_extension(extension)? {
            warn!(
                "event=extension_callback module=executor status=rejected caller={} extension={} error_code=invalid_extension",
                caller, extension
            );
            return Err(ExecutorError::InvalidExtension(extension.clone()));
        }
        if memo.len() > MAX_CALLBACK_MEMO_BYTES {
            warn!(
                "event=extension_callback module=executor status=rejected extension={} memo_len={} error_code=memo_too_long",
                extension,
                memo.len()
            );
            return Err(ExecutorError::MemoTooLong {
                len: memo.len(),
                max: MAX_CALLBACK_MEMO_BYTES,
            });
        }

        let result = self.host.invoke(
            self,
            extension,
            EntryCall::Callback {
                sender: caller,
                memo,
            },
        );
        match result {
            Ok(value) => {
                info!(
                    "event=extension_callback module=executor status=ok extension={} memo_len={}",
                    extension,
                    memo.len()
                );
                Ok(value)
            }
            Err(source) => {
                warn!(
                    "event=extension_callback module=executor status=error extension={} error_code={}",
                    extension,
                    source.code()
                );
                Err(ExecutorError::CallbackFailed {
                    extension: extension.clone(),
                    source,
                })
            }
        }
    }

    fn invoke_proposal(&self, proposal: &Principal, sender: &Principal) -> ExecutorResult<bool> {
        match self
            .host
            .invoke(self, proposal, EntryCall::Execute { sender })
        {
            Ok(value) => {
                info!(
                    "event=proposal_execute module=executor status=ok proposal={} sender={}",
                    proposal, sender
                );
                Ok(value)
            }
            Err(source) => {
                warn!(
                    "event=proposal_execute module=executor status=error proposal={} error_code={} error={}",
                    proposal,
                    source.code(),
                    source
                );
                Err(ExecutorError::ProposalFailed {
                    proposal: proposal.clone(),
                    source,
                })
            }
        }
    }

    fn require_authorized(&self, caller: &Principal, op: &'static str) -> ExecutorResult<()> {
        if self.authority.is_authorized(caller, &self.registry)? {
            return Ok(());
        }
        Err(self.reject_unauthorized(caller, op))
    }

    fn reject_unauthorized(&self, caller: &Principal, op: &'static str) -> ExecutorError {
        warn!(
            "event=authz module=executor status=rejected op={} caller={} error_code=unauthorized",
            op, caller
        );
        ExecutorError::Unauthorized(caller.clone())
    }

    fn reject_already_executed(&self, proposal: &Principal, height: BlockHeight) -> ExecutorError {
        warn!(
            "event=proposal_execute module=executor status=rejected proposal={} executed_at={} error_code=already_executed",
            proposal, height
        );
        ExecutorError::AlreadyExecuted(proposal.clone())
    }
}
