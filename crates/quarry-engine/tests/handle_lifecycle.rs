//! Integration test: asynchronous handles are started once and terminated
//! exactly once on every exit path of a threaded run, and real
//! `ControllerHandle` workers drive a match end to end.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use quarry_core::{ControllerError, HandleLifecycle, Side};
use quarry_engine::{Executor, ExecutorConfig, PollingConfig, StopReason};
use quarry_test_utils::{
    FixedController, ManualClock, PanickingController, ScriptedHandle, StubMove, StubSession,
};

// ── Scripted handles on a virtual clock ──────────────────────────────

fn scripted_executor(
    clock: &Arc<ManualClock>,
    end_at: Option<u64>,
    limit: Option<u64>,
) -> Executor<StubSession> {
    let config = ExecutorConfig::<StubSession>::builder()
        .seed(5)
        .clock(clock.clone())
        .tick_limit(limit)
        .build()
        .unwrap();
    Executor::new(config, StubSession::factory(end_at))
}

fn pair(clock: &Arc<ManualClock>) -> (ScriptedHandle<StubMove>, ScriptedHandle<StubMove>) {
    (
        ScriptedHandle::new(Side::Entity, StubMove(0), clock.clone()),
        ScriptedHandle::new(Side::Group, StubMove(0), clock.clone()),
    )
}

fn assert_once(entity: &ScriptedHandle<StubMove>, group: &ScriptedHandle<StubMove>) {
    for counters in [entity.counters(), group.counters()] {
        assert_eq!(counters.starts(), 1);
        assert_eq!(counters.terminates(), 1);
    }
}

#[test]
fn terminated_once_after_game_over() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = scripted_executor(&clock, Some(4), None);
    let (mut entity, mut group) = pair(&clock);
    let outcome = exec.run_game_timed(&mut entity, &mut group).unwrap();
    assert_eq!(outcome.reason, StopReason::GameOver);
    assert_once(&entity, &group);
}

#[test]
fn terminated_once_after_tick_limit() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = scripted_executor(&clock, None, Some(4));
    let (mut entity, mut group) = pair(&clock);
    let stats = exec
        .run_game_timed_speed_optimised(&mut entity, &mut group, true, "limit")
        .unwrap();
    assert_eq!(stats.n(), 1);
    assert_once(&entity, &group);
}

#[test]
fn terminated_once_when_update_panics() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = scripted_executor(&clock, None, Some(10));
    let (mut entity, _) = pair(&clock);
    let mut group =
        ScriptedHandle::new(Side::Group, StubMove(0), clock.clone()).panicking_on_update(3);
    let entity_counters = entity.counters();
    let group_counters = group.counters();

    let result = catch_unwind(AssertUnwindSafe(|| {
        exec.run_game_timed(&mut entity, &mut group)
    }));

    assert!(result.is_err());
    assert_eq!(group_counters.updates(), 3);
    assert_eq!(entity_counters.terminates(), 1);
    assert_eq!(group_counters.terminates(), 1);
}

#[test]
fn terminated_once_when_entity_fails_to_start() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = scripted_executor(&clock, Some(4), None);
    let mut entity =
        ScriptedHandle::new(Side::Entity, StubMove(0), clock.clone()).failing_start();
    let mut group = ScriptedHandle::new(Side::Group, StubMove(0), clock.clone());

    let err = exec.run_game_timed(&mut entity, &mut group).unwrap_err();

    assert!(matches!(err, ControllerError::SpawnFailed { side: Side::Entity, .. }));
    // The group was never started but is still terminated.
    assert_eq!(group.counters().starts(), 0);
    assert_eq!(group.counters().terminates(), 1);
    assert_eq!(entity.counters().terminates(), 1);
}

// ── Real worker threads ──────────────────────────────────────────────

fn threaded_executor(limit: u64) -> Executor<StubSession> {
    let config = ExecutorConfig::<StubSession>::builder()
        .seed(8)
        .tick_limit(Some(limit))
        .polling(PollingConfig::new(
            Duration::from_millis(200),
            Duration::from_millis(1),
        ))
        .join_budget(Duration::from_secs(1))
        .build()
        .unwrap();
    Executor::new(config, StubSession::factory(None))
}

#[test]
fn controller_handles_drive_a_match() {
    let mut exec = threaded_executor(5);
    let entity_controller = FixedController::new(StubMove(1));
    let team = FixedController::new(StubMove(0));
    let mut entity = exec.entity_handle(entity_controller.clone());
    let mut group = exec.group_handle(&team);
    assert_eq!(entity.side(), Side::Entity);
    assert_eq!(group.side(), Side::Group);

    let stats = exec
        .run_game_timed_speed_optimised(&mut entity, &mut group, false, "threads")
        .unwrap();

    assert_eq!(stats.mean(), 50.0);
    assert!(entity_controller.calls() >= 1);
    assert_eq!(team.fork_flags(), vec![true]);
    assert!(!entity.is_running());
    assert!(!group.is_running());
}

#[test]
fn terminated_handle_cannot_restart() {
    let mut exec = threaded_executor(2);
    let mut entity = exec.entity_handle(FixedController::new(StubMove(0)));
    let mut group = exec.group_handle(&FixedController::new(StubMove(0)));
    exec.run_game_timed(&mut entity, &mut group).unwrap();

    let err = entity.start().unwrap_err();
    assert!(matches!(err, ControllerError::Terminated { side: Side::Entity }));
    // A second terminate is harmless.
    entity.terminate();
}

#[test]
fn worker_panic_forfeits_the_tick_but_not_the_run() {
    let mut exec = threaded_executor(4);
    let panicking = PanickingController::new(StubMove(3), 1);
    let calls = panicking.calls();
    let mut entity = exec.entity_handle(panicking);
    let mut group = exec.group_handle(&FixedController::new(StubMove(0)));

    let stats = exec
        .run_game_timed_speed_optimised(&mut entity, &mut group, false, "panic")
        .unwrap();

    assert_eq!(stats.mean(), 40.0);
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert!(!entity.is_running());
}
