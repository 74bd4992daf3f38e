//! Background schedule lifecycle

use std::sync::Arc;
use std::time::Duration;

use mirror_core::{Error, SchedulerStatus, SyncEngine};
use mirror_test_utils::{MemoryRemoteStore, TestTree};
use tokio::sync::watch;

fn wait_until(
    status: &mut watch::Receiver<SchedulerStatus>,
    done: impl FnMut(&SchedulerStatus) -> bool,
) -> SchedulerStatus {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    runtime.block_on(async {
        let reached = tokio::time::timeout(Duration::from_secs(10), status.wait_for(done))
            .await
            .expect("Scheduler should reach the expected status in time")
            .expect("Status channel should stay open");
        reached.clone()
    })
}

fn engine(tree: &TestTree, remote: &MemoryRemoteStore) -> Arc<SyncEngine> {
    Arc::new(tree.engine(remote))
}

#[test]
fn test_schedule_runs_cycles_until_stopped() {
    let tree = TestTree::new();
    tree.write("a.txt", "a");
    let remote = MemoryRemoteStore::new();
    let engine = engine(&tree, &remote);

    let mut status = engine
        .start_sync(Duration::from_millis(20))
        .expect("Schedule should start");
    wait_until(&mut status, |s| s.cycles() >= 2);

    let last = engine.stop_sync().unwrap().expect("A schedule was running");
    assert!(matches!(last, SchedulerStatus::Stopped { cycles } if cycles >= 2));
    assert!(remote.exists("/a.txt"));
    assert_eq!(engine.stop_sync().unwrap(), None);
}

#[test]
fn test_starting_twice_is_rejected() {
    let tree = TestTree::new();
    let engine = engine(&tree, &MemoryRemoteStore::new());

    engine.start_sync(Duration::from_secs(3600)).unwrap();
    let err = engine.start_sync(Duration::from_secs(3600)).unwrap_err();

    assert!(matches!(err, Error::SchedulerRunning));
    assert_eq!(engine.sync_status().unwrap(), Some(SchedulerStatus::Idle));
}

#[test]
fn test_zero_interval_is_rejected() {
    let tree = TestTree::new();
    let engine = engine(&tree, &MemoryRemoteStore::new());

    let err = engine.start_sync(Duration::ZERO).unwrap_err();
    assert!(matches!(err, Error::Scheduler { .. }));
    assert_eq!(engine.sync_status().unwrap(), None);
}

#[test]
fn test_lost_connection_halts_the_schedule() {
    let tree = TestTree::new();
    let remote = MemoryRemoteStore::new();
    let engine = engine(&tree, &remote);

    let mut status = engine.start_sync(Duration::from_millis(20)).unwrap();
    wait_until(&mut status, |s| s.cycles() >= 1);
    remote.fail_noop(true);

    let halted = wait_until(&mut status, SchedulerStatus::is_terminal);
    let SchedulerStatus::Halted { reason, .. } = halted else {
        panic!("expected a halt, got {halted}");
    };
    assert!(reason.contains("Connection lost"), "got: {reason}");
}

#[test]
fn test_per_item_errors_do_not_halt() {
    let tree = TestTree::new();
    tree.write("photos/a.jpg", "a");
    let remote = MemoryRemoteStore::new();
    remote.fail_make_directory("photos");
    let engine = engine(&tree, &remote);

    let mut status = engine.start_sync(Duration::from_millis(20)).unwrap();
    let reached = wait_until(&mut status, |s| s.cycles() >= 3 || s.is_terminal());

    assert!(matches!(reached, SchedulerStatus::Running { .. }), "got: {reached}");
}

#[test]
fn test_dropping_the_engine_stops_the_schedule() {
    let tree = TestTree::new();
    let remote = MemoryRemoteStore::new();
    let engine = engine(&tree, &remote);

    let mut status = engine.start_sync(Duration::from_millis(20)).unwrap();
    drop(engine);

    let last = wait_until(&mut status, SchedulerStatus::is_terminal);
    assert!(matches!(last, SchedulerStatus::Stopped { .. }), "got: {last}");
}
