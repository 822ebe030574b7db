//! Host chain collaborators consumed by the executor.
//!
//! # Responsibility
//! - Abstract the current block height and dynamic dispatch to arbitrary
//!   callable principals.
//! - Let tests and embedders plug in fake targets that deterministically
//!   succeed or fail.
//!
//! # Invariants
//! - Invocations are synchronous; a nested call finishes before control
//!   returns to the executor.
//! - Targets receive the executor itself, so nested governance calls run
//!   under the executor's identity.

use crate::model::principal::Principal;
use crate::model::records::BlockHeight;
use crate::service::error::{ExecutorError, ERR_MISSING_ENTRY_POINT, ERR_UNKNOWN_TARGET};
use crate::service::executor::Executor;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod local;

pub use local::{ExtensionFn, LocalHost, LocalHostError, ProposalFn};

/// Outcome of one nested entry point invocation.
pub type InvocationResult = Result<bool, InvocationError>;

/// Entry point selected on the target principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCall<'a> {
    /// Proposal body, invoked once through `execute`.
    Execute { sender: &'a Principal },
    /// Extension callback requested through `request-extension-callback`.
    Callback {
        sender: &'a Principal,
        memo: &'a [u8],
    },
}

impl EntryCall<'_> {
    pub fn entry_point(&self) -> &'static str {
        match self {
            Self::Execute { .. } => "execute",
            Self::Callback { .. } => "callback",
        }
    }
}

/// Host environment: chain clock plus dynamic dispatch.
pub trait Host {
    fn block_height(&self) -> BlockHeight;

    fn invoke(
        &self,
        executor: &Executor<'_>,
        target: &Principal,
        call: EntryCall<'_>,
    ) -> InvocationResult;
}

/// Callable unit deployed at a principal.
///
/// Both entry points default to `MissingEntryPoint`, so a unit only answers
/// the calls it implements.
pub trait Contract {
    fn execute(&self, _executor: &Executor<'_>, _sender: &Principal) -> InvocationResult {
        Err(InvocationError::MissingEntryPoint("execute"))
    }

    fn callback(
        &self,
        _executor: &Executor<'_>,
        _sender: &Principal,
        _memo: &[u8],
    ) -> InvocationResult {
        Err(InvocationError::MissingEntryPoint("callback"))
    }
}

/// Failure of a nested invocation.
#[derive(Debug)]
pub enum InvocationError {
    /// Nothing is deployed at the target principal.
    UnknownTarget(Principal),
    /// Target does not implement the requested entry point.
    MissingEntryPoint(&'static str),
    /// Target logic returned its own error code.
    Failed { code: u64 },
    /// Target called back into the executor and that call failed.
    Executor(Box<ExecutorError>),
}

impl InvocationError {
    /// Numeric code surfaced to callers.
    pub fn code(&self) -> u64 {
        match self {
            Self::UnknownTarget(_) => ERR_UNKNOWN_TARGET,
            Self::MissingEntryPoint(_) => ERR_MISSING_ENTRY_POINT,
            Self::Failed { code } => *code,
            Self::Executor(err) => err.code(),
        }
    }
}

impl Display for InvocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTarget(target) => write!(f, "no contract deployed at {target}"),
            Self::MissingEntryPoint(name) => write!(f, "target has no `{name}` entry point"),
            Self::Failed { code } => write!(f, "target failed with code u{code}"),
            Self::Executor(err) => write!(f, "nested executor call failed: {err}"),
        }
    }
}

impl Error for InvocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Executor(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ExecutorError> for InvocationError {
    fn from(value: ExecutorError) -> Self {
        Self::Executor(Box::new(value))
    }
}
