//! Executor error kinds and their numeric codes.
//!
//! # Invariants
//! - Every rejected operation maps to exactly one distinguishable kind.
//! - Codes are stable; callers may match on them.

use crate::host::InvocationError;
use crate::model::principal::Principal;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ERR_UNAUTHORIZED: u64 = 1000;
pub const ERR_ALREADY_EXECUTED: u64 = 1001;
pub const ERR_INVALID_EXTENSION: u64 = 1002;
pub const ERR_BATCH_TOO_LARGE: u64 = 1003;
pub const ERR_MEMO_TOO_LONG: u64 = 1004;
pub const ERR_UNKNOWN_TARGET: u64 = 1005;
pub const ERR_MISSING_ENTRY_POINT: u64 = 1006;
pub const ERR_STORAGE: u64 = 1007;

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors returned by executor operations.
#[derive(Debug)]
pub enum ExecutorError {
    /// Caller is neither the executive nor an enabled extension.
    Unauthorized(Principal),
    /// Proposal identity already has a ledger record.
    AlreadyExecuted(Principal),
    /// Callback requested by or for a principal that is not an enabled
    /// extension calling on its own behalf.
    InvalidExtension(Principal),
    BatchTooLarge { len: usize, max: usize },
    MemoTooLong { len: usize, max: usize },
    /// Proposal body failed; its ledger record stays in place.
    ProposalFailed {
        proposal: Principal,
        source: InvocationError,
    },
    /// Extension callback failed.
    CallbackFailed {
        extension: Principal,
        source: InvocationError,
    },
    Repo(RepoError),
}

impl ExecutorError {
    pub fn code(&self) -> u64 {
        match self {
            Self::Unauthorized(_) => ERR_UNAUTHORIZED,
            Self::AlreadyExecuted(_) => ERR_ALREADY_EXECUTED,
            Self::InvalidExtension(_) => ERR_INVALID_EXTENSION,
            Self::BatchTooLarge { .. } => ERR_BATCH_TOO_LARGE,
            Self::MemoTooLong { .. } => ERR_MEMO_TOO_LONG,
            Self::ProposalFailed { source, .. } | Self::CallbackFailed { source, .. } => {
                source.code()
            }
            Self::Repo(_) => ERR_STORAGE,
        }
    }
}

impl Display for ExecutorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(caller) => write!(f, "unauthorized caller: {caller}"),
            Self::AlreadyExecuted(proposal) => write!(f, "proposal already executed: {proposal}"),
            Self::InvalidExtension(extension) => write!(f, "invalid extension: {extension}"),
            Self::BatchTooLarge { len, max } => {
                write!(f, "extension batch has {len} entries; at most {max} allowed")
            }
            Self::MemoTooLong { len, max } => {
                write!(f, "callback memo has {len} bytes; at most {max} allowed")
            }
            Self::ProposalFailed { proposal, source } => {
                write!(f, "proposal {proposal} failed: {source}")
            }
            Self::CallbackFailed { extension, source } => {
                write!(f, "extension callback {extension} failed: {source}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExecutorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ProposalFailed { source, .. } | Self::CallbackFailed { source, .. } => {
                Some(source)
            }
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ExecutorError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AlreadyExecuted(proposal) => Self::AlreadyExecuted(proposal),
            other => Self::Repo(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutorError, ERR_ALREADY_EXECUTED, ERR_STORAGE, ERR_UNAUTHORIZED};
    use crate::host::InvocationError;
    use crate::model::principal::Principal;
    use crate::repo::RepoError;

    fn proposal() -> Principal {
        Principal::contract("ST1DEPLOYER", "edp001").unwrap()
    }

    #[test]
    fn repo_already_executed_maps_to_executor_kind() {
        let err = ExecutorError::from(RepoError::AlreadyExecuted(proposal()));
        assert!(matches!(err, ExecutorError::AlreadyExecuted(ref p) if *p == proposal()));
        assert_eq!(err.code(), ERR_ALREADY_EXECUTED);
    }

    #[test]
    fn other_repo_errors_are_storage_errors() {
        let err = ExecutorError::from(RepoError::InvalidData("bad row".to_string()));
        assert_eq!(err.code(), ERR_STORAGE);
    }

    #[test]
    fn proposal_failure_surfaces_target_code() {
        let err = ExecutorError::ProposalFailed {
            proposal: proposal(),
            source: InvocationError::Failed { code: 42 },
        };
        assert_eq!(err.code(), 42);

        let nested = ExecutorError::ProposalFailed {
            proposal: proposal(),
            source: InvocationError::from(ExecutorError::Unauthorized(proposal())),
        };
        assert_eq!(nested.code(), ERR_UNAUTHORIZED);
    }
}
