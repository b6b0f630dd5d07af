//! Quarry corridor chase: every execution mode on one tiny game.
//!
//! Demonstrates:
//!   1. Implementing `Session` for a one-dimensional pellet corridor
//!   2. A blocking run with synchronous controllers
//!   3. A recorded real-time run with threaded `ControllerHandle`s
//!   4. Headless playback of the recording
//!   5. A trial batch with CSV statistics
//!
//! Run with:
//!   RUST_LOG=info cargo run --example corridor_chase

use std::io;
use std::time::Duration;

use quarry_core::{
    Controller, Deadline, NoMessenger, ObservabilityPolicy, PolicyKind, Session, SessionError,
    Side, TeamController,
};
use quarry_engine::{write_stats, Executor, ExecutorConfig, PollingConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

// ─── Corridor parameters ────────────────────────────────────────

const LENGTH: i64 = 40;
const CHASERS: usize = 2;
const PELLET_POINTS: i64 = 10;
const CAPTURE_PENALTY: i64 = 100;

// ─── Moves ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Step {
    Left,
    Right,
    #[default]
    Stay,
}

impl Step {
    fn delta(self) -> i64 {
        match self {
            Step::Left => -1,
            Step::Right => 1,
            Step::Stay => 0,
        }
    }

    fn toward(from: i64, to: i64) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Less => Step::Left,
            std::cmp::Ordering::Greater => Step::Right,
            std::cmp::Ordering::Equal => Step::Stay,
        }
    }
}

// ─── Session ────────────────────────────────────────────────────

/// A runner collecting pellets in a corridor while chasers close in.
#[derive(Clone, Debug)]
struct Corridor {
    tick: u64,
    score: i64,
    runner: Option<i64>,
    chasers: Vec<i64>,
    pellets: Vec<bool>,
    caught: bool,
    policy: ObservabilityPolicy,
}

impl Corridor {
    fn new(seed: u64, policy: &ObservabilityPolicy) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pellets = (0..LENGTH).map(|_| rng.gen_bool(0.5)).collect();
        let chasers = (0..CHASERS)
            .map(|_| rng.gen_range(LENGTH / 2..LENGTH))
            .collect();
        Self {
            tick: 0,
            score: 0,
            runner: Some(0),
            chasers,
            pellets,
            caught: false,
            policy: *policy,
        }
    }

    fn sees(&self, a: i64, b: i64) -> bool {
        self.policy.within_sight(a.abs_diff(b))
    }

    fn nearest_pellet(&self, from: i64) -> Option<i64> {
        (0..LENGTH)
            .filter(|&cell| self.pellets[cell as usize])
            .min_by_key(|&cell| cell.abs_diff(from))
    }
}

fn clamp(cell: i64) -> i64 {
    cell.clamp(0, LENGTH - 1)
}

fn malformed(detail: impl Into<String>) -> SessionError {
    SessionError::MalformedState {
        detail: detail.into(),
    }
}

impl Session for Corridor {
    type EntityMove = Step;
    type GroupMove = Vec<Step>;
    type Messenger = NoMessenger;

    fn restricted_copy(&self, viewer: Side) -> Self {
        let mut copy = self.clone();
        let Some(runner) = self.runner else {
            return copy;
        };
        match viewer {
            Side::Entity => copy.chasers.retain(|&c| self.sees(runner, c)),
            Side::Group => {
                if !self.chasers.iter().any(|&c| self.sees(runner, c)) {
                    copy.runner = None;
                }
            }
        }
        copy
    }

    fn advance(&mut self, entity: Step, group: Vec<Step>) {
        if let Some(runner) = self.runner.as_mut() {
            *runner = clamp(*runner + entity.delta());
            let cell = *runner as usize;
            if self.pellets[cell] {
                self.pellets[cell] = false;
                self.score += PELLET_POINTS;
            }
        }
        for (i, chaser) in self.chasers.iter_mut().enumerate() {
            let step = group.get(i).copied().unwrap_or_default();
            *chaser = clamp(*chaser + step.delta());
        }
        if self.runner.is_some_and(|r| self.chasers.contains(&r)) {
            self.caught = true;
            self.score -= CAPTURE_PENALTY;
        }
        self.tick += 1;
    }

    fn is_game_over(&self) -> bool {
        self.caught || self.pellets.iter().all(|p| !p)
    }

    fn score(&self) -> i64 {
        self.score
    }

    fn total_time(&self) -> u64 {
        self.tick
    }

    /// `tick;score;runner;chaser,chaser;pellet bits;caught`
    fn serialize_state(&self) -> String {
        let chasers: Vec<String> = self.chasers.iter().map(i64::to_string).collect();
        let pellets: String = self
            .pellets
            .iter()
            .map(|&p| if p { '1' } else { '0' })
            .collect();
        format!(
            "{};{};{};{};{};{}",
            self.tick,
            self.score,
            self.runner.unwrap_or(-1),
            chasers.join(","),
            pellets,
            u8::from(self.caught)
        )
    }

    fn load_state(&mut self, state: &str) -> Result<(), SessionError> {
        let fields: Vec<&str> = state.split(';').collect();
        let [tick, score, runner, chasers, pellets, caught] = fields.as_slice() else {
            return Err(malformed(format!("expected 6 fields, got {}", fields.len())));
        };
        let number = |s: &str| s.parse::<i64>().map_err(|e| malformed(format!("{s:?}: {e}")));
        self.tick = number(*tick)? as u64;
        self.score = number(*score)?;
        self.runner = Some(number(*runner)?).filter(|&r| r >= 0);
        self.chasers = chasers
            .split(',')
            .filter(|c| !c.is_empty())
            .map(number)
            .collect::<Result<_, _>>()?;
        self.pellets = pellets.chars().map(|c| c == '1').collect();
        if self.pellets.len() != LENGTH as usize {
            return Err(malformed("pellet row has the wrong length"));
        }
        self.caught = *caught == "1";
        Ok(())
    }
}

// ─── Controllers ────────────────────────────────────────────────

/// Heads for the nearest pellet, backing off from a visible chaser.
struct Greedy;

impl Controller<Corridor, Step> for Greedy {
    fn get_move(&mut self, view: Corridor, _deadline: Deadline) -> Step {
        let Some(me) = view.runner else {
            return Step::Stay;
        };
        if let Some(&threat) = view.chasers.iter().find(|&&c| c.abs_diff(me) <= 2) {
            return Step::toward(threat, me);
        }
        view.nearest_pellet(me)
            .map_or(Step::Stay, |target| Step::toward(me, target))
    }
}

/// Every chaser closes in when the runner is visible and waits otherwise.
#[derive(Clone)]
struct Pack;

impl Controller<Corridor, Vec<Step>> for Pack {
    fn get_move(&mut self, view: Corridor, _deadline: Deadline) -> Vec<Step> {
        view.chasers
            .iter()
            .map(|&c| view.runner.map_or(Step::Stay, |r| Step::toward(c, r)))
            .collect()
    }
}

impl TeamController<Corridor, Vec<Step>> for Pack {
    fn fork(&self, _partial_observability: bool) -> Self {
        Pack
    }
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ExecutorConfig::<Corridor>::builder()
        .seed(2024)
        .policy(ObservabilityPolicy::new(PolicyKind::Radius, 6))
        .tick_limit(Some(300))
        .polling(PollingConfig::new(
            Duration::from_millis(10),
            Duration::from_millis(1),
        ))
        .time_budget(Duration::from_millis(10))
        .peek(|c: &Corridor| format!("runner={:?} chasers={:?}", c.runner, c.chasers))
        .build()?;
    let mut exec = Executor::new(config, |seed: u64, policy: &ObservabilityPolicy, _: Option<NoMessenger>| {
        Corridor::new(seed, policy)
    });

    // 1. Blocking.
    let outcome = exec.run_game(&mut Greedy, &Pack, Duration::ZERO);
    println!(
        "blocking: score {} after {} ticks ({})",
        outcome.score, outcome.ticks, outcome.reason
    );

    // 2. Recorded real time with threaded handles.
    let path = std::env::temp_dir().join("quarry-corridor-chase.txt");
    let mut entity = exec.entity_handle(Greedy);
    let mut group = exec.group_handle(&Pack);
    let run = exec.run_game_timed_recorded(&mut entity, &mut group, &path)?;
    println!(
        "recorded: score {} after {} ticks, {} states saved={}",
        run.outcome.score,
        run.outcome.ticks,
        run.trace.len(),
        run.saved
    );

    // 3. Playback.
    let summary = exec.replay_game(&path, false)?;
    println!(
        "replayed: {} ticks, final score {:?}",
        summary.ticks_replayed, summary.final_score
    );

    // 4. Trial batch.
    let report = exec.run_experiment_ticks(&mut Greedy, &Pack, 20, "greedy-vs-pack");
    let mut stdout = io::stdout().lock();
    write_stats(&mut stdout, &report.scores, 0)?;
    write_stats(&mut stdout, &report.ticks, 1)?;
    Ok(())
}
