// access_control.rs - End-to-end behavior of the access-control core.
//
// Runs the reference scenarios against both backends, then hammers the
// uniqueness invariant from several threads at once: exactly one writer
// may win for a given key, every other writer must see the conflict error,
// and the relation must hold a single row afterwards.

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::tempdir;

use cadence_authz::{
    describe, Action, Authorizing, AuthzConfig, AuthzError, Confirmation, ErrorKind, MemoryStore,
    Operation, SqliteStore, StoreBackend, UserId, Verbatim,
};

const RACERS: usize = 8;

fn backends() -> Vec<(&'static str, Authorizing)> {
    vec![
        ("memory", Authorizing::in_memory()),
        (
            "sqlite",
            Authorizing::with_store(Arc::new(SqliteStore::open_in_memory().unwrap())),
        ),
    ]
}

#[test]
fn scenario_deny_twice_then_allow() {
    for (name, authz) in backends() {
        let alice = UserId::from("alice");
        let registry = authz.registry();

        registry.deny(&alice, Action::Post).unwrap();
        assert_eq!(registry.denials_for(&alice).unwrap().len(), 1, "{name}");

        let err = registry.deny(&alice, Action::Post).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyDenied, "{name}");
        assert_eq!(registry.denials_for(&alice).unwrap().len(), 1, "{name}");

        registry.allow(&alice, Action::Post).unwrap();
        assert!(registry.denials_for(&alice).unwrap().is_empty(), "{name}");
        assert!(!registry.is_denied(&alice, Action::Post).unwrap(), "{name}");
    }
}

#[test]
fn scenario_control_assertions() {
    for (name, authz) in backends() {
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let carol = UserId::from("carol");

        authz.graph().grant(&bob, &alice).unwrap();
        authz.guard().assert_is_authorizer(&bob, &alice).unwrap();

        let err = authz
            .guard()
            .assert_is_authorizer(&carol, &alice)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientControl, "{name}");
    }
}

#[test]
fn scenario_revoke_missing_edge() {
    for (name, authz) in backends() {
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        let err = authz.graph().revoke(&bob, &alice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EdgeNotFound, "{name}");
        assert!(authz.graph().authorizers_of(&alice).unwrap().is_empty(), "{name}");
        assert!(authz.graph().authorizees_of(&bob).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn guard_agrees_with_registry_for_every_action() {
    for (name, authz) in backends() {
        let alice = UserId::from("alice");
        authz.registry().deny(&alice, Action::Nudge).unwrap();
        authz.registry().deny(&alice, Action::Record).unwrap();

        for action in Action::ALL {
            let denied = authz.registry().is_denied(&alice, action).unwrap();
            let guarded = authz.guard().assert_action_allowed(&alice, action);
            assert_eq!(guarded.is_ok(), !denied, "{name}: {action}");
        }
    }
}

fn race<T, F>(authz: &Authorizing, attempt: F) -> Vec<Result<T, AuthzError>>
where
    T: Send + 'static,
    F: Fn(&Authorizing) -> Result<T, AuthzError> + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(RACERS));
    let attempt = Arc::new(attempt);
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let authz = authz.clone();
            let barrier = Arc::clone(&barrier);
            let attempt = Arc::clone(&attempt);
            thread::spawn(move || {
                barrier.wait();
                attempt(&authz)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("racer panicked"))
        .collect()
}

#[test]
fn concurrent_denies_leave_exactly_one_record() {
    for (name, authz) in backends() {
        let results = race(&authz, |authz| {
            authz.registry().deny(&UserId::from("alice"), Action::Message)
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AuthzError::AlreadyDenied { .. })))
            .count();
        assert_eq!(winners, 1, "{name}");
        assert_eq!(conflicts, RACERS - 1, "{name}");
        assert_eq!(
            authz
                .registry()
                .denials_for(&UserId::from("alice"))
                .unwrap()
                .len(),
            1,
            "{name}"
        );
    }
}

#[test]
fn concurrent_grants_leave_exactly_one_edge() {
    for (name, authz) in backends() {
        let results = race(&authz, |authz| {
            authz
                .graph()
                .grant(&UserId::from("bob"), &UserId::from("alice"))
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AuthzError::EdgeAlreadyExists { .. })))
            .count();
        assert_eq!(winners, 1, "{name}");
        assert_eq!(conflicts, RACERS - 1, "{name}");
        assert_eq!(
            authz
                .graph()
                .authorizees_of(&UserId::from("bob"))
                .unwrap()
                .len(),
            1,
            "{name}"
        );
    }
}

#[test]
fn concurrent_allows_succeed_once() {
    for (name, authz) in backends() {
        authz
            .registry()
            .deny(&UserId::from("alice"), Action::Post)
            .unwrap();
        let results = race(&authz, |authz| {
            authz.registry().allow(&UserId::from("alice"), Action::Post)
        });
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "{name}");
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::AlreadyAllowed));
    }
}

#[test]
fn separate_handles_on_one_database_share_the_constraint() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("authz.db");
    let first = Authorizing::with_store(Arc::new(SqliteStore::open(&db).unwrap()));
    let second = Authorizing::with_store(Arc::new(SqliteStore::open(&db).unwrap()));
    let alice = UserId::from("alice");

    first.registry().deny(&alice, Action::Record).unwrap();
    let err = second.registry().deny(&alice, Action::Record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyDenied);

    second.registry().allow(&alice, Action::Record).unwrap();
    assert!(!first.registry().is_denied(&alice, Action::Record).unwrap());
}

#[test]
fn configured_project_persists_between_opens() {
    let dir = tempdir().unwrap();
    let config = AuthzConfig::load(dir.path()).unwrap();
    assert_eq!(config.backend, StoreBackend::Sqlite);

    let alice = UserId::from("alice");
    let bob = UserId::from("bob");
    {
        let authz = Authorizing::open(&config).unwrap();
        authz.give_control(&alice, &bob).unwrap();
        authz.deny_on_behalf(&bob, &alice, Action::Message).unwrap();
    }

    let authz = Authorizing::open(&config).unwrap();
    assert!(config.database_path.exists());
    let op = Operation::SendMessage {
        sender: bob.clone(),
        receiver: alice.clone(),
    };
    let err = authz.guard().assert_operation(&op).unwrap_err();
    assert_eq!(
        describe(&err, &Verbatim),
        "alice is not allowed to perform action Message!"
    );
    assert_eq!(authz.control_summary(&bob).unwrap().authorizees, vec![alice]);
}

#[test]
fn delegated_round_trip_produces_confirmations() {
    let authz = Authorizing::with_store(Arc::new(MemoryStore::new()));
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");

    let given = Confirmation::control_given(authz.give_control(&alice, &bob).unwrap());
    assert_eq!(given.msg(), "Control successfully given!");

    let denied = Confirmation::denied(authz.deny_on_behalf(&bob, &alice, Action::Nudge).unwrap());
    assert_eq!(denied.msg(), "Action successfully denied!");

    let allowed =
        Confirmation::allowed(authz.allow_on_behalf(&bob, &alice, Action::Nudge).unwrap());
    assert_eq!(allowed.msg(), "Action successfully allowed!");

    authz.relinquish_control(&bob, &alice).unwrap();
    let err = authz
        .deny_on_behalf(&bob, &alice, Action::Nudge)
        .unwrap_err();
    assert!(err.is_authorization_denial());
}
