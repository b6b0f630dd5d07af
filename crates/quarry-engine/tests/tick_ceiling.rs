//! Integration test: the tick ceiling is a hard stop in every loop.
//!
//! A session that never ends on its own must stop at exactly the
//! configured limit, never one tick past it, whether it is driven by the
//! blocking loop, the fixed-delay loop, or the polling loop.

use std::sync::Arc;
use std::time::Duration;

use quarry_core::Side;
use quarry_engine::{Executor, ExecutorConfig, PollingConfig, StopReason};
use quarry_test_utils::{FixedController, ManualClock, ScriptedHandle, StubMove, StubSession};

const LIMIT: u64 = 100;

fn executor(clock: &Arc<ManualClock>) -> Executor<StubSession> {
    let config = ExecutorConfig::<StubSession>::builder()
        .seed(7)
        .clock(clock.clone())
        .tick_limit(Some(LIMIT))
        .polling(PollingConfig::new(
            Duration::from_millis(40),
            Duration::from_millis(5),
        ))
        .build()
        .unwrap();
    // No end tick: only the ceiling can stop the run.
    Executor::new(config, StubSession::factory(None))
}

#[test]
fn blocking_loop_stops_at_limit() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = executor(&clock);
    let mut entity = FixedController::new(StubMove(1));
    let team = FixedController::new(StubMove(0));

    let outcome = exec.run_game(&mut entity, &team, Duration::ZERO);

    assert_eq!(outcome.ticks, LIMIT);
    assert_eq!(outcome.reason, StopReason::TickLimit);
    assert_eq!(outcome.score, 10 * LIMIT as i64);
    assert_eq!(entity.calls(), LIMIT as usize);
}

#[test]
fn fixed_delay_loop_stops_at_limit() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = executor(&clock);
    let mut entity = ScriptedHandle::new(Side::Entity, StubMove(1), clock.clone());
    let mut group = ScriptedHandle::new(Side::Group, StubMove(0), clock.clone());

    let outcome = exec.run_game_timed(&mut entity, &mut group).unwrap();

    assert_eq!(outcome.ticks, LIMIT);
    assert_eq!(outcome.reason, StopReason::TickLimit);
    assert_eq!(entity.counters().updates(), LIMIT as usize);
    assert_eq!(clock.elapsed(), Duration::from_millis(40) * LIMIT as u32);
}

#[test]
fn polling_loop_stops_at_limit() {
    let clock = Arc::new(ManualClock::new());
    let mut exec = executor(&clock);
    let mut entity = ScriptedHandle::new(Side::Entity, StubMove(1), clock.clone());
    let mut group = ScriptedHandle::new(Side::Group, StubMove(0), clock.clone());

    let stats = exec
        .run_game_timed_speed_optimised(&mut entity, &mut group, false, "ceiling")
        .unwrap();

    assert_eq!(stats.n(), 1);
    assert_eq!(stats.mean(), 10.0 * LIMIT as f64);
    assert_eq!(group.counters().updates(), LIMIT as usize);
}

#[test]
fn game_over_wins_over_later_limit() {
    let clock = Arc::new(ManualClock::new());
    let config = ExecutorConfig::<StubSession>::builder()
        .clock(clock.clone())
        .tick_limit(Some(LIMIT))
        .build()
        .unwrap();
    let mut exec = Executor::new(config, StubSession::factory(Some(12)));
    let mut entity = FixedController::new(StubMove(0));
    let team = FixedController::new(StubMove(0));

    let outcome = exec.run_game(&mut entity, &team, Duration::ZERO);

    assert_eq!(outcome.ticks, 12);
    assert_eq!(outcome.reason, StopReason::GameOver);
}

#[test]
fn zero_limit_never_advances() {
    let clock = Arc::new(ManualClock::new());
    let config = ExecutorConfig::<StubSession>::builder()
        .clock(clock.clone())
        .tick_limit(Some(0))
        .build()
        .unwrap();
    let mut exec = Executor::new(config, StubSession::factory(None));
    let mut entity = ScriptedHandle::new(Side::Entity, StubMove(0), clock.clone());
    let mut group = ScriptedHandle::new(Side::Group, StubMove(0), clock.clone());

    let outcome = exec.run_game_timed(&mut entity, &mut group).unwrap();

    assert_eq!(outcome.ticks, 0);
    assert_eq!(entity.counters().updates(), 0);
    assert_eq!(entity.counters().starts(), 1);
    assert_eq!(entity.counters().terminates(), 1);
    assert_eq!(clock.elapsed(), Duration::ZERO);
}
