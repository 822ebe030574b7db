//! Registry and ledger records.

use crate::model::principal::Principal;
use serde::{Deserialize, Serialize};

/// Block height as reported by the host chain.
pub type BlockHeight = u64;

/// One extension registry row.
///
/// Entries are upserted by `set-extension(s)` and toggled, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    #[serde(rename = "extension")]
    pub principal: Principal,
    pub enabled: bool,
}

impl ExtensionEntry {
    pub fn new(principal: Principal, enabled: bool) -> Self {
        Self { principal, enabled }
    }
}

/// Permanent marker that a proposal identity has been executed.
///
/// Written once, before the proposal body runs; its height never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub proposal: Principal,
    pub executed_at: BlockHeight,
}
