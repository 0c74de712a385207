use std::future::{poll_fn, Future};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kafka_admin_core::storage::keys;
use kafka_admin_core::{AdminError, ClusterProfile, ConnectionManager, ConnectionState};
use log::LevelFilter;

mod common;
use common::fake_admin::FakeAdminApi;

fn init_logs() {
    //   Logs will appear only when you run with `-- --nocapture`
    //   or when the test fails.
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn profile(id: &str, bootstrap: &str) -> ClusterProfile {
    let mut p = ClusterProfile::new(id).with_property(keys::BOOTSTRAP_SERVERS, bootstrap);
    p.id = id.to_string();
    p
}

#[tokio::test]
async fn missing_bootstrap_fails_validation_without_any_call() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());

    let err = manager
        .connect(&ClusterProfile::new("empty"))
        .await
        .expect_err("a profile without bootstrap servers must be rejected");

    assert!(
        matches!(err, AdminError::Validation { ref field, .. } if field == keys::BOOTSTRAP_SERVERS),
        "unexpected error: {err:?}"
    );
    assert_eq!(api.calls.total(), 0, "no Admin API call may happen");
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn local_profile_connects_then_reconnect_closes_first_handle_once() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());

    // ── Connect with "local" ────────────────────────────────────────────
    let local = profile("local", "localhost:9092");
    let first = manager.connect(&local).await.expect("connect should succeed");
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(api.calls.opens(), 1);
    assert_eq!(api.calls.probes(), 1, "liveness probe must run once");
    assert_eq!(
        api.calls.open_properties.lock().unwrap()[0][keys::BOOTSTRAP_SERVERS],
        "localhost:9092"
    );

    // ── Disconnect ─────────────────────────────────────────────────────
    manager.disconnect().await.expect("disconnect should succeed");
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(api.calls.closed_ids(), [1]);
    assert!(first.is_closed());

    // ── Connect with another profile ───────────────────────────────────
    let other = profile("staging", "staging:9092");
    let second = manager.connect(&other).await.expect("second connect");
    assert_eq!(api.calls.opens(), 2);
    assert_eq!(api.calls.closed_ids(), [1], "first handle closed exactly once");
    assert_eq!(second.profile_id(), "staging");
}

#[tokio::test]
async fn sequential_reconnects_close_every_previous_session() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let p = profile("local", "localhost:9092");

    manager.connect(&p).await.unwrap();
    const RECONNECTS: usize = 5;
    for _ in 0..RECONNECTS {
        manager.connect(&p).await.unwrap();
    }

    assert_eq!(api.calls.closes(), RECONNECTS);
    assert!(api.calls.opens() <= RECONNECTS + 1);
    // Close-before-replace: client n is closed before client n+1 exists.
    assert_eq!(api.calls.closed_ids(), (1..=RECONNECTS).collect::<Vec<_>>());
}

#[tokio::test]
async fn stale_handle_is_rejected_after_reconnect() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let p = profile("local", "localhost:9092");

    let old = manager.connect(&p).await.unwrap();
    let new = manager.connect(&p).await.unwrap();

    assert!(!old.same_session(&new));
    assert!(matches!(
        old.list_topics().await,
        Err(AdminError::NotConnected)
    ));
    assert!(new.list_topics().await.is_ok());
    let current = manager.current_session().await.expect("a live session");
    assert!(current.same_session(&new));
}

#[tokio::test]
async fn failed_probe_closes_handle_and_leaves_failed_state() {
    init_logs();
    let api = FakeAdminApi::new();
    api.set(&api.switches.fail_probe, true);
    let manager = ConnectionManager::new(api.clone());

    let err = manager
        .connect(&profile("local", "localhost:9092"))
        .await
        .expect_err("probe failure must fail the connect");

    match err {
        AdminError::Connection { profile_id, reason } => {
            assert_eq!(profile_id, "local");
            assert_eq!(reason, "Timed out waiting to send the call");
        }
        other => panic!("expected a connection error, got {other:?}"),
    }
    assert_eq!(api.calls.closed_ids(), [1], "unverified handle must be closed");
    assert_eq!(manager.state(), ConnectionState::Failed);
    assert!(manager.current_session().await.is_none());

    // Failed -> Connecting -> Connected on retry.
    api.set(&api.switches.fail_probe, false);
    manager
        .connect(&profile("local", "localhost:9092"))
        .await
        .expect("retry should succeed");
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn failed_open_after_close_leaves_no_session() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let p = profile("local", "localhost:9092");
    manager.connect(&p).await.unwrap();

    api.set(&api.switches.fail_open, true);
    let err = manager.connect(&p).await.unwrap_err();
    assert!(matches!(err, AdminError::Connection { .. }));
    assert_eq!(api.calls.closed_ids(), [1], "old session closed before the attempt");
    assert_eq!(manager.state(), ConnectionState::Failed);
    assert!(manager.current_session().await.is_none());
}

#[tokio::test]
async fn close_failure_does_not_block_reconnect() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let p = profile("local", "localhost:9092");
    manager.connect(&p).await.unwrap();

    api.set(&api.switches.fail_close, true);
    manager
        .connect(&p)
        .await
        .expect("reconnect must proceed despite the close error");
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(api.calls.opens(), 2);
}

#[tokio::test]
async fn validation_failure_keeps_existing_session() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let live = manager
        .connect(&profile("local", "localhost:9092"))
        .await
        .unwrap();

    let bad = profile("bad", "localhost:9092").with_property(keys::SECURITY_PROTOCOL, "SASL_SSL");
    assert!(matches!(
        manager.connect(&bad).await,
        Err(AdminError::Validation { .. })
    ));
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(!live.is_closed());
    assert_eq!(api.calls.closes(), 0);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());

    manager.disconnect().await.expect("no-op when never connected");
    manager.connect(&profile("local", "localhost:9092")).await.unwrap();
    manager.disconnect().await.unwrap();
    manager.disconnect().await.expect("second disconnect is a no-op");

    assert_eq!(api.calls.closes(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn concurrent_connect_is_rejected_while_one_is_in_flight() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let (entered, release) = api.hold_open();

    let background = manager.clone();
    let p = profile("local", "localhost:9092");
    let in_flight = tokio::spawn(async move { background.connect(&p).await });

    entered.notified().await;
    assert!(manager.is_busy());
    assert_eq!(manager.state(), ConnectionState::Connecting);

    let second = manager.connect(&profile("other", "other:9092")).await;
    assert!(matches!(second, Err(AdminError::Busy)));
    assert!(matches!(manager.disconnect().await, Err(AdminError::Busy)));

    release.notify_one();
    let session = in_flight.await.unwrap().expect("first connect completes");
    assert_eq!(session.profile_id(), "local");
    assert!(!manager.is_busy());
    assert_eq!(api.calls.opens(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_sleeps_until_running_connect_finishes() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let (entered, release) = api.hold_open();

    let background = manager.clone();
    let p = profile("local", "localhost:9092");
    let in_flight = tokio::spawn(async move { background.connect(&p).await });
    entered.notified().await;

    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let exiting = manager.clone();
    let shutdown = tokio::spawn(async move {
        let mut fut = Box::pin(exiting.shutdown());
        poll_fn(|cx| {
            counter.fetch_add(1, Ordering::SeqCst);
            fut.as_mut().poll(cx)
        })
        .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!shutdown.is_finished());
    assert!(polls.load(Ordering::SeqCst) <= 2, "shutdown must park, not spin");

    release.notify_one();
    let session = in_flight.await.unwrap().expect("connect completes");
    shutdown.await.unwrap();

    assert!(session.is_closed());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(api.calls.closes(), 1);
    assert!(!manager.is_busy());
}

#[tokio::test]
async fn disconnect_if_bound_only_tears_down_matching_profile() {
    init_logs();
    let api = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    manager.connect(&profile("local", "localhost:9092")).await.unwrap();

    assert!(!manager.disconnect_if_bound("someone-else").await.unwrap());
    assert_eq!(manager.state(), ConnectionState::Connected);

    assert!(manager.disconnect_if_bound("local").await.unwrap());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(api.calls.closes(), 1);
}

#[tokio::test]
async fn state_changes_are_observable_and_shutdown_closes_session() {
    init_logs();
    let api: Arc<FakeAdminApi> = FakeAdminApi::new();
    let manager = ConnectionManager::new(api.clone());
    let mut states = manager.subscribe_state();

    manager.connect(&profile("local", "localhost:9092")).await.unwrap();
    assert_eq!(*states.borrow_and_update(), ConnectionState::Connected);

    manager.shutdown().await;
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
    assert_eq!(api.calls.closes(), 1);
}
