//! Governance domain model.
//!
//! # Responsibility
//! - Define the identities and records shared by registry, ledger and
//!   authority logic.
//! - Keep storage-agnostic shapes that repositories map to SQL rows.
//!
//! # Invariants
//! - Every record is keyed by a `Principal`.
//! - Ledger records are append-only; registry entries are never deleted.

pub mod event;
pub mod executive;
pub mod principal;
pub mod records;
