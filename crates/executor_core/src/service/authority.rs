//! Authority controller.
//!
//! # Responsibility
//! - Answer "is this caller the executive" and "is this caller authorized".
//! - Drive the one-way bootstrap handover of the executive role.
//!
//! # Invariants
//! - `is_authorized` is the single predicate gating every mutating
//!   operation except `construct`.
//! - The handover only fires for the current executive and always lands in
//!   `ExecutivePhase::Constructed`.

use crate::model::executive::ExecutiveState;
use crate::model::principal::Principal;
use crate::model::records::BlockHeight;
use crate::repo::executive_repo::ExecutiveRepository;
use crate::repo::extension_repo::ExtensionRepository;
use crate::repo::{RepoError, RepoResult};

/// Executive slot plus the authorization predicates built on it.
pub struct AuthorityController<E: ExecutiveRepository> {
    repo: E,
}

impl<E: ExecutiveRepository> AuthorityController<E> {
    /// Wraps `repo`, seeding it with `initial` when no state exists yet.
    pub fn seeded(repo: E, initial: &ExecutiveState) -> RepoResult<(Self, ExecutiveState)> {
        let effective = repo.seed(initial)?;
        Ok((Self { repo }, effective))
    }

    pub fn state(&self) -> RepoResult<ExecutiveState> {
        self.repo
            .load()?
            .ok_or_else(|| RepoError::InvalidData("executive state is not seeded".to_string()))
    }

    pub fn is_executive(&self, caller: &Principal) -> RepoResult<bool> {
        Ok(self.state()?.is_held_by(caller))
    }

    /// Executive or any currently enabled extension.
    pub fn is_authorized(
        &self,
        caller: &Principal,
        registry: &impl ExtensionRepository,
    ) -> RepoResult<bool> {
        if self.is_executive(caller)? {
            return Ok(true);
        }
        registry.is_extension(caller)
    }

    /// Hands the executive role to `executor` when `caller` holds it,
    /// recording `bootstrap` as executed in the same write.
    ///
    /// Returns `None` and leaves state untouched when `caller` is not the
    /// executive. Any storage failure leaves both the executive and the
    /// ledger unchanged.
    pub fn hand_over(
        &self,
        caller: &Principal,
        executor: &Principal,
        bootstrap: &Principal,
        block_height: BlockHeight,
    ) -> RepoResult<Option<ExecutiveState>> {
        let current = self.state()?;
        if !current.is_held_by(caller) {
            return Ok(None);
        }
        let next = current.hand_over(executor.clone());
        self.repo.store_with_execution(&next, bootstrap, block_height)?;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::AuthorityController;
    use crate::db::open_db_in_memory;
    use crate::model::executive::{ExecutivePhase, ExecutiveState};
    use crate::model::principal::Principal;
    use crate::model::records::ExtensionEntry;
    use crate::repo::executive_repo::SqliteExecutiveRepository;
    use crate::repo::extension_repo::{ExtensionRepository, SqliteExtensionRepository};
    use crate::repo::ledger_repo::{ExecutionLedger, SqliteExecutionLedger};
    use crate::repo::RepoError;

    fn deployer() -> Principal {
        Principal::standard("ST1DEPLOYER").unwrap()
    }

    fn executor() -> Principal {
        Principal::contract("ST1DEPLOYER", "executor-dao").unwrap()
    }

    fn bootstrap() -> Principal {
        Principal::contract("ST1DEPLOYER", "edp000-bootstrap").unwrap()
    }

    #[test]
    fn executive_and_extensions_are_authorized() {
        let conn = open_db_in_memory().unwrap();
        let registry = SqliteExtensionRepository::try_new(&conn).unwrap();
        let (authority, _) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(&conn).unwrap(),
            &ExecutiveState::deployed_by(deployer()),
        )
        .unwrap();

        let extension = Principal::contract("ST1DEPLOYER", "edx-treasury").unwrap();
        let stranger = Principal::standard("ST2STRANGER").unwrap();

        assert!(authority.is_authorized(&deployer(), &registry).unwrap());
        assert!(!authority.is_authorized(&extension, &registry).unwrap());

        registry
            .apply_entries(&[ExtensionEntry::new(extension.clone(), true)], 1)
            .unwrap();
        assert!(authority.is_authorized(&extension, &registry).unwrap());
        assert!(!authority.is_executive(&extension).unwrap());
        assert!(!authority.is_authorized(&stranger, &registry).unwrap());
    }

    #[test]
    fn hand_over_requires_current_executive() {
        let conn = open_db_in_memory().unwrap();
        let (authority, _) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(&conn).unwrap(),
            &ExecutiveState::deployed_by(deployer()),
        )
        .unwrap();

        let stranger = Principal::standard("ST2STRANGER").unwrap();
        assert_eq!(
            authority
                .hand_over(&stranger, &executor(), &bootstrap(), 1)
                .unwrap(),
            None
        );
        assert_eq!(
            authority.state().unwrap().phase(),
            ExecutivePhase::Unconstructed
        );

        let next = authority
            .hand_over(&deployer(), &executor(), &bootstrap(), 1)
            .unwrap()
            .expect("deployer holds the executive role");
        assert_eq!(next.phase(), ExecutivePhase::Constructed);
        assert!(authority.is_executive(&executor()).unwrap());
        assert!(!authority.is_executive(&deployer()).unwrap());

        assert_eq!(
            authority
                .hand_over(&deployer(), &executor(), &bootstrap(), 2)
                .unwrap(),
            None
        );
    }

    #[test]
    fn hand_over_records_bootstrap_in_the_same_write() {
        let conn = open_db_in_memory().unwrap();
        let ledger = SqliteExecutionLedger::try_new(&conn).unwrap();
        let (authority, _) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(&conn).unwrap(),
            &ExecutiveState::deployed_by(deployer()),
        )
        .unwrap();

        authority
            .hand_over(&deployer(), &executor(), &bootstrap(), 4)
            .unwrap()
            .expect("deployer holds the executive role");
        assert_eq!(ledger.executed_at(&bootstrap()).unwrap(), Some(4));
    }

    #[test]
    fn failed_hand_over_write_keeps_previous_executive() {
        let conn = open_db_in_memory().unwrap();
        let ledger = SqliteExecutionLedger::try_new(&conn).unwrap();
        let (authority, _) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(&conn).unwrap(),
            &ExecutiveState::deployed_by(deployer()),
        )
        .unwrap();

        let err = authority
            .hand_over(&deployer(), &executor(), &bootstrap(), u64::MAX)
            .unwrap_err();
        assert!(matches!(err, RepoError::HeightOutOfRange(u64::MAX)));
        assert!(authority.is_executive(&deployer()).unwrap());

        ledger.record_execution(&bootstrap(), 2).unwrap();
        let err = authority
            .hand_over(&deployer(), &executor(), &bootstrap(), 3)
            .unwrap_err();
        assert!(matches!(err, RepoError::AlreadyExecuted(_)));
        assert!(authority.is_executive(&deployer()).unwrap());
        assert_eq!(ledger.executed_at(&bootstrap()).unwrap(), Some(2));
    }

    #[test]
    fn seeding_keeps_existing_state() {
        let conn = open_db_in_memory().unwrap();
        let (authority, _) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(&conn).unwrap(),
            &ExecutiveState::deployed_by(deployer()),
        )
        .unwrap();
        authority
            .hand_over(&deployer(), &executor(), &bootstrap(), 1)
            .unwrap();

        let other = Principal::standard("ST3OTHER").unwrap();
        let (_, effective) = AuthorityController::seeded(
            SqliteExecutiveRepository::try_new(&conn).unwrap(),
            &ExecutiveState::deployed_by(other),
        )
        .unwrap();
        assert_eq!(effective.holder(), &executor());
    }
}
