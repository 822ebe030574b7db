//! Governance executor core.
//!
//! Maintains the extension registry, executes proposals at most once, and
//! routes extension callbacks, all behind one authority controller. This
//! crate is the single source of truth for those invariants.

pub mod config;
pub mod db;
pub mod host;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ExecutorConfig};
pub use host::{
    Contract, EntryCall, ExtensionFn, Host, InvocationError, InvocationResult, LocalHost,
    LocalHostError, ProposalFn,
};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::event::{GovernanceEvent, RecordedEvent};
pub use model::executive::{ExecutivePhase, ExecutiveState};
pub use model::principal::{Principal, PrincipalParseError};
pub use model::records::{BlockHeight, ExecutionRecord, ExtensionEntry};
pub use repo::{RepoError, RepoResult};
pub use service::error::{
    ExecutorError, ExecutorResult, ERR_ALREADY_EXECUTED, ERR_BATCH_TOO_LARGE,
    ERR_INVALID_EXTENSION, ERR_MEMO_TOO_LONG, ERR_MISSING_ENTRY_POINT, ERR_STORAGE,
    ERR_UNAUTHORIZED, ERR_UNKNOWN_TARGET,
};
pub use service::executor::{Executor, MAX_CALLBACK_MEMO_BYTES, MAX_EXTENSION_BATCH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
