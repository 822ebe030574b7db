//! In-process host with a deployable contract table.
//!
//! # Responsibility
//! - Resolve principals to locally deployed `Contract` implementations.
//! - Provide a manually advanced block height.
//!
//! # Invariants
//! - A principal can be deployed at most once.
//! - No table borrow is held while a contract runs, so contracts may
//!   re-enter the executor freely.

use crate::host::{Contract, EntryCall, Host, InvocationError, InvocationResult};
use crate::model::principal::Principal;
use crate::model::records::BlockHeight;
use crate::service::executor::Executor;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Local host registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalHostError {
    AlreadyDeployed(Principal),
}

impl Display for LocalHostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyDeployed(principal) => {
                write!(f, "contract already deployed at {principal}")
            }
        }
    }
}

impl Error for LocalHostError {}

/// Single-threaded host used by tests and embedding front ends.
pub struct LocalHost {
    height: Cell<BlockHeight>,
    contracts: RefCell<BTreeMap<Principal, Rc<dyn Contract>>>,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHost {
    /// Creates a host at block height 1 with no deployed contracts.
    pub fn new() -> Self {
        Self {
            height: Cell::new(1),
            contracts: RefCell::new(BTreeMap::new()),
        }
    }

    /// Deploys `contract` at `principal`.
    pub fn deploy(
        &self,
        principal: Principal,
        contract: impl Contract + 'static,
    ) -> Result<(), LocalHostError> {
        let mut contracts = self.contracts.borrow_mut();
        if contracts.contains_key(&principal) {
            return Err(LocalHostError::AlreadyDeployed(principal));
        }
        debug!("event=contract_deploy module=host status=ok target={principal}");
        contracts.insert(principal, Rc::new(contract));
        Ok(())
    }

    /// Advances the chain by `blocks` and returns the new height.
    pub fn mine_blocks(&self, blocks: u64) -> BlockHeight {
        let next = self.height.get().saturating_add(blocks);
        self.height.set(next);
        next
    }

    fn resolve(&self, target: &Principal) -> Option<Rc<dyn Contract>> {
        self.contracts.borrow().get(target).cloned()
    }
}

impl Host for LocalHost {
    fn block_height(&self) -> BlockHeight {
        self.height.get()
    }

    fn invoke(
        &self,
        executor: &Executor<'_>,
        target: &Principal,
        call: EntryCall<'_>,
    ) -> InvocationResult {
        let Some(contract) = self.resolve(target) else {
            debug!(
                "event=contract_invoke module=host status=error target={target} entry_point={} error_code=unknown_target",
                call.entry_point()
            );
            return Err(InvocationError::UnknownTarget(target.clone()));
        };

        let result = match call {
            EntryCall::Execute { sender } => contract.execute(executor, sender),
            EntryCall::Callback { sender, memo } => contract.callback(executor, sender, memo),
        };
        debug!(
            "event=contract_invoke module=host status={} target={target} entry_point={}",
            if result.is_ok() { "ok" } else { "error" },
            call.entry_point()
        );
        result
    }
}

/// Proposal backed by a closure.
pub struct ProposalFn<F>(F);

impl<F> ProposalFn<F>
where
    F: Fn(&Executor<'_>, &Principal) -> InvocationResult,
{
    pub fn new(body: F) -> Self {
        Self(body)
    }
}

impl<F> Contract for ProposalFn<F>
where
    F: Fn(&Executor<'_>, &Principal) -> InvocationResult,
{
    fn execute(&self, executor: &Executor<'_>, sender: &Principal) -> InvocationResult {
        (self.0)(executor, sender)
    }
}

/// Extension callback backed by a closure.
pub struct ExtensionFn<F>(F);

impl<F> ExtensionFn<F>
where
    F: Fn(&Executor<'_>, &Principal, &[u8]) -> InvocationResult,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> Contract for ExtensionFn<F>
where
    F: Fn(&Executor<'_>, &Principal, &[u8]) -> InvocationResult,
{
    fn callback(
        &self,
        executor: &Executor<'_>,
        sender: &Principal,
        memo: &[u8],
    ) -> InvocationResult {
        (self.0)(executor, sender, memo)
    }
}
