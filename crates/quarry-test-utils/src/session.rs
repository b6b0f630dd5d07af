//! A one-dimensional stub session with a single entity and a named group.
//!
//! Positions live on an integer line. The entity sees group members within
//! the policy's sight limit; the group sees the entity only when at least
//! one member is within sight of it. Everything else is hidden from
//! restricted copies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use quarry_core::{Messenger, ObservabilityPolicy, Session, SessionError, Side};

/// Move applied to a position: a signed step along the line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StubMove(pub i64);

/// Group messenger that logs messages and counts how often it was forked.
///
/// The fork counter is shared across every fork, the message log is not.
#[derive(Debug, Default)]
pub struct StubMessenger {
    log: Vec<String>,
    forks: Arc<AtomicUsize>,
}

impl StubMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.log
    }

    /// Total forks taken from this messenger or any of its forks.
    pub fn fork_count(&self) -> usize {
        self.forks.load(Ordering::SeqCst)
    }
}

impl Messenger for StubMessenger {
    fn fork(&self) -> Self {
        self.forks.fetch_add(1, Ordering::SeqCst);
        Self {
            log: self.log.clone(),
            forks: Arc::clone(&self.forks),
        }
    }
}

/// Group member names used by [`StubSession::new`].
pub const DEFAULT_MEMBERS: [&str; 4] = ["blinky", "pinky", "inky", "sue"];

/// Deterministic stub [`Session`].
///
/// Each tick the entity moves by its [`StubMove`], every group member moves
/// by the group's [`StubMove`], and the score grows by `points_per_tick`.
/// The game ends once `total_time` reaches the configured end tick.
#[derive(Debug)]
pub struct StubSession {
    seed: u64,
    tick: u64,
    score: i64,
    points_per_tick: i64,
    end_at: Option<u64>,
    policy: ObservabilityPolicy,
    entity: Option<i64>,
    group: IndexMap<String, i64>,
    viewer: Option<Side>,
    messenger: Option<StubMessenger>,
    advances: Arc<Mutex<u64>>,
}

impl StubSession {
    /// Entity at the origin, members scattered in `-100..=100` by `seed`.
    pub fn new(seed: u64, policy: ObservabilityPolicy, messenger: Option<StubMessenger>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let group = DEFAULT_MEMBERS
            .iter()
            .map(|name| (name.to_string(), rng.gen_range(-100..=100)))
            .collect();
        Self {
            seed,
            tick: 0,
            score: 0,
            points_per_tick: 10,
            end_at: None,
            policy,
            entity: Some(0),
            group,
            viewer: None,
            messenger,
            advances: Arc::new(Mutex::new(0)),
        }
    }

    /// A factory closure producing sessions that end at `end_at`.
    pub fn factory(
        end_at: Option<u64>,
    ) -> impl Fn(u64, &ObservabilityPolicy, Option<StubMessenger>) -> StubSession + Send + Sync + 'static
    {
        move |seed, policy, messenger| StubSession::new(seed, *policy, messenger).ending_at(end_at)
    }

    pub fn ending_at(mut self, end_at: Option<u64>) -> Self {
        self.end_at = end_at;
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn scoring(mut self, points_per_tick: i64) -> Self {
        self.points_per_tick = points_per_tick;
        self
    }

    pub fn with_entity_at(mut self, position: i64) -> Self {
        self.entity = Some(position);
        self
    }

    /// Replace the group with the given members, in order.
    pub fn with_group<'a>(mut self, members: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        self.group = members
            .into_iter()
            .map(|(name, pos)| (name.to_string(), pos))
            .collect();
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy(&self) -> ObservabilityPolicy {
        self.policy
    }

    pub fn entity_position(&self) -> Option<i64> {
        self.entity
    }

    pub fn group_positions(&self) -> &IndexMap<String, i64> {
        &self.group
    }

    /// `None` for a full-information copy, otherwise the side it was
    /// restricted for.
    pub fn viewer(&self) -> Option<Side> {
        self.viewer
    }

    pub fn messenger(&self) -> Option<&StubMessenger> {
        self.messenger.as_ref()
    }

    /// Number of `advance` calls made on this session or any clone of it.
    ///
    /// Lets tests prove that controllers only ever touched their own copy.
    pub fn shared_advances(&self) -> u64 {
        *self.advances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn distance(a: i64, b: i64) -> u64 {
        a.abs_diff(b)
    }
}

impl Clone for StubSession {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            tick: self.tick,
            score: self.score,
            points_per_tick: self.points_per_tick,
            end_at: self.end_at,
            policy: self.policy,
            entity: self.entity,
            group: self.group.clone(),
            viewer: self.viewer,
            messenger: self.messenger.as_ref().map(Messenger::fork),
            advances: Arc::clone(&self.advances),
        }
    }
}

impl Session for StubSession {
    type EntityMove = StubMove;
    type GroupMove = StubMove;
    type Messenger = StubMessenger;

    fn restricted_copy(&self, viewer: Side) -> Self {
        let mut copy = self.clone();
        copy.viewer = Some(viewer);
        match viewer {
            Side::Entity => {
                let policy = self.policy;
                match self.entity {
                    Some(me) => copy
                        .group
                        .retain(|_, pos| policy.within_sight(Self::distance(me, *pos))),
                    None => copy.group.clear(),
                }
                copy.messenger = None;
            }
            Side::Group => {
                let seen = self.entity.is_some_and(|me| {
                    self.group
                        .values()
                        .any(|pos| self.policy.within_sight(Self::distance(me, *pos)))
                });
                if !seen {
                    copy.entity = None;
                }
            }
        }
        copy
    }

    fn advance(&mut self, entity: StubMove, group: StubMove) {
        if let Some(pos) = self.entity.as_mut() {
            *pos += entity.0;
        }
        for pos in self.group.values_mut() {
            *pos += group.0;
        }
        self.tick += 1;
        self.score += self.points_per_tick;
        if let Some(messenger) = self.messenger.as_mut() {
            messenger.send(format!("tick {}", self.tick));
        }
        *self.advances.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn is_game_over(&self) -> bool {
        self.end_at.is_some_and(|end| self.tick >= end)
    }

    fn score(&self) -> i64 {
        self.score
    }

    fn total_time(&self) -> u64 {
        self.tick
    }

    /// `seed;tick;score;points;end;entity;name=pos,name=pos`, with `-` for
    /// absent values.
    fn serialize_state(&self) -> String {
        let end = self.end_at.map_or_else(|| "-".to_string(), |e| e.to_string());
        let entity = self.entity.map_or_else(|| "-".to_string(), |e| e.to_string());
        let group: Vec<String> = self
            .group
            .iter()
            .map(|(name, pos)| format!("{name}={pos}"))
            .collect();
        format!(
            "{};{};{};{};{};{};{}",
            self.seed,
            self.tick,
            self.score,
            self.points_per_tick,
            end,
            entity,
            group.join(",")
        )
    }

    fn load_state(&mut self, state: &str) -> Result<(), SessionError> {
        let fields: Vec<&str> = state.trim().split(';').collect();
        let [seed, tick, score, points, end, entity, group] = fields.as_slice() else {
            return Err(malformed(format!("expected 7 fields, got {}", fields.len())));
        };
        let seed = parse(seed, "seed")?;
        let tick = parse(tick, "tick")?;
        let score = parse(score, "score")?;
        let points = parse(points, "points")?;
        let end = parse_optional(end, "end")?;
        let entity = parse_optional(entity, "entity")?;
        let mut members = IndexMap::new();
        for entry in group.split(',').filter(|e| !e.is_empty()) {
            let (name, pos) = entry
                .split_once('=')
                .ok_or_else(|| malformed(format!("group entry `{entry}` has no `=`")))?;
            members.insert(name.to_string(), parse(pos, "group position")?);
        }

        self.seed = seed;
        self.tick = tick;
        self.score = score;
        self.points_per_tick = points;
        self.end_at = end;
        self.entity = entity;
        self.group = members;
        Ok(())
    }
}

fn malformed(detail: String) -> SessionError {
    SessionError::MalformedState { detail }
}

fn parse<T: std::str::FromStr>(field: &str, what: &str) -> Result<T, SessionError> {
    field
        .parse()
        .map_err(|_| malformed(format!("invalid {what}: `{field}`")))
}

fn parse_optional<T: std::str::FromStr>(field: &str, what: &str) -> Result<Option<T>, SessionError> {
    if field == "-" {
        Ok(None)
    } else {
        parse(field, what).map(Some)
    }
}
