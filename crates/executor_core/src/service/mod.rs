//! Governance use-case services.
//!
//! # Responsibility
//! - Compose registry, ledger and executive repositories into the executor
//!   operation surface.
//! - Keep host dispatch behind the `Host` trait.

pub mod authority;
pub mod error;
pub mod executor;
