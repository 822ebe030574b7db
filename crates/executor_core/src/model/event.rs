//! Governance event journal model.
//!
//! Events mirror what the executor prints on chain: one `extension` event per
//! registry write and one `execute` event per recorded execution.

use crate::model::principal::Principal;
use crate::model::records::BlockHeight;
use serde::{Deserialize, Serialize};

/// Structured payload of one governance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    Extension { extension: Principal, enabled: bool },
    Execute { proposal: Principal },
}

impl GovernanceEvent {
    /// Stable kind string stored next to the JSON payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extension { .. } => "extension",
            Self::Execute { .. } => "execute",
        }
    }
}

/// Persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Monotonic journal sequence number.
    pub seq: i64,
    pub block_height: BlockHeight,
    pub event: GovernanceEvent,
}
