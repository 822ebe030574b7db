use executor_core::db::open_db_in_memory;
use executor_core::{
    Executor, ExecutorError, ExtensionEntry, GovernanceEvent, LocalHost, Principal,
    ERR_BATCH_TOO_LARGE, ERR_UNAUTHORIZED, MAX_EXTENSION_BATCH,
};
use rusqlite::Connection;

fn deployer() -> Principal {
    "ST1DEPLOYER".parse().unwrap()
}

fn executor_id() -> Principal {
    "ST1DEPLOYER.executor-dao".parse().unwrap()
}

fn contract(name: &str) -> Principal {
    Principal::contract("ST1DEPLOYER", name).unwrap()
}

fn open<'a>(conn: &'a Connection, host: &'a LocalHost) -> Executor<'a> {
    Executor::try_new(conn, host, executor_id(), deployer()).unwrap()
}

#[test]
fn absent_entry_is_not_an_extension() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);

    assert!(!dao.is_extension(&contract("edx-unknown")).unwrap());
    assert!(dao.extensions().unwrap().is_empty());
}

#[test]
fn executive_can_enable_and_disable_extensions() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);
    let treasury = contract("edx-treasury");

    assert!(dao.set_extension(&deployer(), &treasury, true).unwrap());
    assert!(dao.set_extension(&deployer(), &treasury, true).unwrap());
    assert!(dao.is_extension(&treasury).unwrap());

    dao.set_extension(&deployer(), &treasury, false).unwrap();
    assert!(!dao.is_extension(&treasury).unwrap());
    assert_eq!(
        dao.extensions().unwrap(),
        vec![ExtensionEntry::new(treasury, false)]
    );
}

#[test]
fn enabled_extension_may_manage_the_registry() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);
    let admin = contract("edx-admin");
    let voting = contract("edx-voting");

    dao.set_extension(&deployer(), &admin, true).unwrap();
    dao.set_extension(&admin, &voting, true).unwrap();
    assert!(dao.is_extension(&voting).unwrap());

    dao.set_extension(&voting, &admin, false).unwrap();
    let err = dao.set_extension(&admin, &voting, false).unwrap_err();
    assert!(matches!(err, ExecutorError::Unauthorized(ref caller) if *caller == admin));
    assert!(dao.is_extension(&voting).unwrap());
}

#[test]
fn unauthorized_callers_never_mutate_the_registry() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);
    let stranger: Principal = "ST2STRANGER".parse().unwrap();
    let target = contract("edx-target");

    let err = dao.set_extension(&stranger, &target, true).unwrap_err();
    assert_eq!(err.code(), ERR_UNAUTHORIZED);

    let err = dao
        .set_extensions(&stranger, &[ExtensionEntry::new(target.clone(), true)])
        .unwrap_err();
    assert!(matches!(err, ExecutorError::Unauthorized(_)));

    let disabled = contract("edx-disabled");
    dao.set_extension(&deployer(), &disabled, false).unwrap();
    let err = dao.set_extension(&disabled, &target, true).unwrap_err();
    assert!(matches!(err, ExecutorError::Unauthorized(_)));

    assert!(!dao.is_extension(&target).unwrap());
    assert_eq!(dao.extensions().unwrap().len(), 1);
}

#[test]
fn empty_batch_succeeds_without_changes() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);

    assert!(dao.set_extensions(&deployer(), &[]).unwrap());
    assert!(dao.extensions().unwrap().is_empty());
    assert!(dao.events().unwrap().is_empty());
}

#[test]
fn batch_applies_in_order_and_later_duplicates_win() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);
    let a = contract("edx-a");
    let b = contract("edx-b");

    dao.set_extensions(
        &deployer(),
        &[
            ExtensionEntry::new(a.clone(), true),
            ExtensionEntry::new(b.clone(), true),
            ExtensionEntry::new(a.clone(), false),
        ],
    )
    .unwrap();

    assert!(!dao.is_extension(&a).unwrap());
    assert!(dao.is_extension(&b).unwrap());
}

#[test]
fn batch_of_maximum_size_is_applied() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);

    let entries: Vec<ExtensionEntry> = (0..MAX_EXTENSION_BATCH)
        .map(|index| ExtensionEntry::new(contract(&format!("edx-{index:03}")), index % 2 == 0))
        .collect();
    dao.set_extensions(&deployer(), &entries).unwrap();

    let stored = dao.extensions().unwrap();
    assert_eq!(stored.len(), MAX_EXTENSION_BATCH);
    assert!(dao.is_extension(&contract("edx-000")).unwrap());
    assert!(!dao.is_extension(&contract("edx-199")).unwrap());
}

#[test]
fn oversized_batch_is_rejected_without_changes() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);

    let entries: Vec<ExtensionEntry> = (0..=MAX_EXTENSION_BATCH)
        .map(|index| ExtensionEntry::new(contract(&format!("edx-{index:03}")), true))
        .collect();
    let err = dao.set_extensions(&deployer(), &entries).unwrap_err();
    assert_eq!(err.code(), ERR_BATCH_TOO_LARGE);
    assert!(dao.extensions().unwrap().is_empty());
}

#[test]
fn registry_writes_are_journaled_with_block_height() {
    let conn = open_db_in_memory().unwrap();
    let host = LocalHost::new();
    let dao = open(&conn, &host);
    let treasury = contract("edx-treasury");

    host.mine_blocks(9);
    dao.set_extension(&deployer(), &treasury, true).unwrap();

    let events = dao.events().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block_height, 10);
    assert_eq!(
        events[0].event,
        GovernanceEvent::Extension {
            extension: treasury,
            enabled: true,
        }
    );
}
