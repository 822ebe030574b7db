//! Executive authority state machine.
//!
//! # Responsibility
//! - Model the bootstrap handover as an explicit two-state machine.
//!
//! # Invariants
//! - Exactly one executive principal exists at any time.
//! - `Constructed` is terminal: no transition leads back to `Unconstructed`.

use crate::model::principal::Principal;
use serde::{Deserialize, Serialize};

/// Bootstrap phase of the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutivePhase {
    /// Deploying authority still holds the executive role.
    Unconstructed,
    /// Executive role has been handed to the executor itself.
    Constructed,
}

impl ExecutivePhase {
    /// Stable string id used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unconstructed => "unconstructed",
            Self::Constructed => "constructed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unconstructed" => Some(Self::Unconstructed),
            "constructed" => Some(Self::Constructed),
            _ => None,
        }
    }
}

/// Current executive holder together with its bootstrap phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ExecutiveState {
    Unconstructed { deployer: Principal },
    Constructed { executor: Principal },
}

impl ExecutiveState {
    /// Initial state right after deployment.
    pub fn deployed_by(deployer: Principal) -> Self {
        Self::Unconstructed { deployer }
    }

    pub fn phase(&self) -> ExecutivePhase {
        match self {
            Self::Unconstructed { .. } => ExecutivePhase::Unconstructed,
            Self::Constructed { .. } => ExecutivePhase::Constructed,
        }
    }

    /// Principal currently holding the executive role.
    pub fn holder(&self) -> &Principal {
        match self {
            Self::Unconstructed { deployer } => deployer,
            Self::Constructed { executor } => executor,
        }
    }

    pub fn is_held_by(&self, caller: &Principal) -> bool {
        self.holder() == caller
    }

    /// Hands the executive role to `executor`.
    ///
    /// Applying the handover to an already constructed state keeps it
    /// constructed under the given executor identity.
    pub fn hand_over(self, executor: Principal) -> Self {
        Self::Constructed { executor }
    }
}
