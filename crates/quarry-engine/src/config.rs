//! Executor configuration, validation, and error types.
//!
//! [`ExecutorConfig`] is built once through [`ExecutorConfigBuilder`] and
//! is immutable afterwards: every run of an [`Executor`](crate::Executor)
//! reads it by reference. [`build()`](ExecutorConfigBuilder::build) checks
//! the structural invariants up front so no loop has to.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quarry_core::{
    Clock, ObservabilityPolicy, PolicyKind, RenderSettings, RendererFactory, Session, SystemClock,
    UnknownPolicy,
};
use quarry_replay::WriteMode;

/// Per-tick diagnostic observer. Receives the live session read-only and
/// returns a line that the executor logs.
pub type PeekHook<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

// ── PollingConfig ──────────────────────────────────────────────────

/// Tick pacing for the threaded loops.
///
/// `delay` is the real-time wait per tick (`D`). The speed-optimised loop
/// splits it into polls of `interval` (`W`); `D` must be a non-zero
/// multiple of `W`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    /// Per-tick delay budget. Default: 40 ms.
    pub delay: Duration,
    /// Poll granularity. Default: 1 ms.
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(40),
            interval: Duration::from_millis(1),
        }
    }
}

impl PollingConfig {
    /// Build a polling configuration.
    pub fn new(delay: Duration, interval: Duration) -> Self {
        Self { delay, interval }
    }

    /// Number of polls that fit in one tick (`D / W`).
    pub fn polls_per_tick(&self) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        (self.delay.as_nanos() / self.interval.as_nanos()) as u32
    }

    /// Check that `delay` is a non-zero multiple of a non-zero `interval`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let delay = self.delay.as_nanos();
        let interval = self.interval.as_nanos();
        if interval == 0 || delay == 0 || delay % interval != 0 || delay / interval > u32::MAX as u128
        {
            return Err(ConfigError::InvalidPolling {
                delay: self.delay,
                interval: self.interval,
            });
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`ExecutorConfigBuilder::build()`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The per-decision time budget is zero.
    #[error("time budget must be greater than zero")]
    ZeroTimeBudget,
    /// A sight-limited policy was configured with a zero sight limit.
    #[error("the {kind} policy needs a positive sight limit")]
    InvalidSightLimit {
        /// The policy kind that was configured.
        kind: PolicyKind,
    },
    /// Poll delay is not a non-zero multiple of the poll interval.
    #[error("poll delay {delay:?} must be a non-zero multiple of the poll interval {interval:?}")]
    InvalidPolling {
        /// Configured per-tick delay.
        delay: Duration,
        /// Configured poll interval.
        interval: Duration,
    },
    /// Scale factor is NaN, infinite, zero, or negative.
    #[error("scale factor must be finite and positive, got {value}")]
    InvalidScaleFactor {
        /// The invalid value.
        value: f64,
    },
    /// Visuals were enabled without a renderer factory.
    #[error("visuals are enabled but no renderer was configured")]
    MissingRenderer,
    /// A policy name did not parse.
    #[error(transparent)]
    UnknownPolicy(#[from] UnknownPolicy),
}

// ── ExecutorConfig ─────────────────────────────────────────────────

/// Complete, validated configuration for an [`Executor`](crate::Executor).
pub struct ExecutorConfig<S: Session> {
    entity_partial_observability: bool,
    group_partial_observability: bool,
    messenger: Option<S::Messenger>,
    visuals: bool,
    scale_factor: f64,
    render_daemon: bool,
    renderer: Option<Arc<dyn RendererFactory<S>>>,
    tick_limit: Option<u64>,
    time_budget: Duration,
    policy: ObservabilityPolicy,
    polling: PollingConfig,
    seed: Option<u64>,
    clock: Arc<dyn Clock>,
    peek: Option<PeekHook<S>>,
    join_budget: Duration,
    replay_write_mode: WriteMode,
}

impl<S: Session> ExecutorConfig<S> {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ExecutorConfigBuilder<S> {
        ExecutorConfigBuilder::new()
    }

    /// Whether the entity receives a restricted projection.
    pub fn entity_partial_observability(&self) -> bool {
        self.entity_partial_observability
    }

    /// Whether the group receives a restricted projection, and whether its
    /// team controller is forked in partial-observability mode.
    pub fn group_partial_observability(&self) -> bool {
        self.group_partial_observability
    }

    /// Whether group messaging is enabled.
    pub fn messaging(&self) -> bool {
        self.messenger.is_some()
    }

    /// The template messenger forked into every new session.
    pub fn messenger(&self) -> Option<&S::Messenger> {
        self.messenger.as_ref()
    }

    /// Whether timed runs open a renderer.
    pub fn visuals(&self) -> bool {
        self.visuals
    }

    /// Renderer settings for a view; `entity_point_of_view` is set for
    /// human-operated entities.
    pub fn render_settings(&self, entity_point_of_view: bool) -> RenderSettings {
        RenderSettings {
            scale_factor: self.scale_factor,
            daemon: self.render_daemon,
            entity_point_of_view,
        }
    }

    pub(crate) fn renderer(&self) -> Option<&Arc<dyn RendererFactory<S>>> {
        self.renderer.as_ref()
    }

    /// Hard tick ceiling; `None` runs until game over.
    pub fn tick_limit(&self) -> Option<u64> {
        self.tick_limit
    }

    /// Per-decision time budget handed to controllers as a deadline.
    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Projection rule parameters passed to the session factory.
    pub fn policy(&self) -> ObservabilityPolicy {
        self.policy
    }

    /// Tick pacing for the threaded loops and the replay player.
    pub fn polling(&self) -> PollingConfig {
        self.polling
    }

    /// Seed for the generator that draws per-run session seeds.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Time source used for deadlines and every sleep.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn peek(&self) -> Option<&PeekHook<S>> {
        self.peek.as_ref()
    }

    /// How long termination waits for a worker thread to exit.
    pub fn join_budget(&self) -> Duration {
        self.join_budget
    }

    /// Whether recorded replays overwrite or append to their destination.
    pub fn replay_write_mode(&self) -> WriteMode {
        self.replay_write_mode
    }
}

impl<S: Session> fmt::Debug for ExecutorConfig<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("entity_partial_observability", &self.entity_partial_observability)
            .field("group_partial_observability", &self.group_partial_observability)
            .field("messaging", &self.messaging())
            .field("visuals", &self.visuals)
            .field("scale_factor", &self.scale_factor)
            .field("render_daemon", &self.render_daemon)
            .field("tick_limit", &self.tick_limit)
            .field("time_budget", &self.time_budget)
            .field("policy", &self.policy)
            .field("polling", &self.polling)
            .field("seed", &self.seed)
            .field("peek", &self.peek.is_some())
            .field("join_budget", &self.join_budget)
            .field("replay_write_mode", &self.replay_write_mode)
            .finish_non_exhaustive()
    }
}

impl<S: Session> Default for ExecutorConfig<S> {
    fn default() -> Self {
        Self {
            entity_partial_observability: true,
            group_partial_observability: true,
            messenger: Some(S::Messenger::default()),
            visuals: false,
            scale_factor: 1.0,
            render_daemon: false,
            renderer: None,
            tick_limit: Some(4000),
            time_budget: Duration::from_millis(40),
            policy: ObservabilityPolicy::default(),
            polling: PollingConfig::default(),
            seed: None,
            clock: Arc::new(SystemClock),
            peek: None,
            join_budget: Duration::from_millis(200),
            replay_write_mode: WriteMode::Overwrite,
        }
    }
}

// ── ExecutorConfigBuilder ──────────────────────────────────────────

/// Builder for [`ExecutorConfig`]. Setters mirror the option table of the
/// executor; [`build`](Self::build) validates.
pub struct ExecutorConfigBuilder<S: Session> {
    config: ExecutorConfig<S>,
    policy_name: Option<String>,
}

impl<S: Session> ExecutorConfigBuilder<S> {
    /// Builder seeded with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ExecutorConfig::default(),
            policy_name: None,
        }
    }

    /// Restrict the entity's projection. Default: true.
    pub fn entity_partial_observability(mut self, on: bool) -> Self {
        self.config.entity_partial_observability = on;
        self
    }

    /// Restrict the group's projection. Default: true.
    pub fn group_partial_observability(mut self, on: bool) -> Self {
        self.config.group_partial_observability = on;
        self
    }

    /// Enable or disable group messaging. Enabling without a custom
    /// messenger attaches the messenger type's default.
    pub fn messaging(mut self, on: bool) -> Self {
        self.config.messenger = match (on, self.config.messenger.take()) {
            (false, _) => None,
            (true, Some(existing)) => Some(existing),
            (true, None) => Some(S::Messenger::default()),
        };
        self
    }

    /// Replace the messenger and turn messaging on.
    pub fn messenger(mut self, messenger: S::Messenger) -> Self {
        self.config.messenger = Some(messenger);
        self
    }

    /// Open a renderer for timed runs. Default: false.
    pub fn visuals(mut self, on: bool) -> Self {
        self.config.visuals = on;
        self
    }

    /// Renderer scale factor. Default: 1.0.
    pub fn scale_factor(mut self, scale: f64) -> Self {
        self.config.scale_factor = scale;
        self
    }

    /// Run the renderer on a daemon thread. Default: false.
    pub fn render_daemon(mut self, daemon: bool) -> Self {
        self.config.render_daemon = daemon;
        self
    }

    /// Factory used to open a view when visuals are on.
    pub fn renderer(mut self, factory: impl RendererFactory<S> + 'static) -> Self {
        self.config.renderer = Some(Arc::new(factory));
        self
    }

    /// Hard tick ceiling. Default: `Some(4000)`.
    pub fn tick_limit(mut self, limit: Option<u64>) -> Self {
        self.config.tick_limit = limit;
        self
    }

    /// Per-decision time budget. Default: 40 ms.
    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget = budget;
        self
    }

    /// Observability policy and sight limit. Default: line of sight, 50.
    pub fn policy(mut self, policy: ObservabilityPolicy) -> Self {
        self.config.policy = policy;
        self.policy_name = None;
        self
    }

    /// Select the policy kind by name (`"los"`, `"radius"`, `"full"`),
    /// keeping the current sight limit. Resolved in [`build`](Self::build).
    pub fn policy_name(mut self, name: impl Into<String>) -> Self {
        self.policy_name = Some(name.into());
        self
    }

    /// Sight limit for sight-limited policies. Default: 50.
    pub fn sight_limit(mut self, limit: u32) -> Self {
        self.config.policy.sight_limit = limit;
        self
    }

    /// Tick pacing. Default: 40 ms delay, 1 ms polls.
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.config.polling = polling;
        self
    }

    /// Seed for per-run session seeds. Default: from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Time source for deadlines and sleeps. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.config.clock = clock;
        self
    }

    /// Per-tick diagnostic observer.
    pub fn peek(mut self, hook: impl Fn(&S) -> String + Send + Sync + 'static) -> Self {
        self.config.peek = Some(Arc::new(hook));
        self
    }

    /// Worker join budget at termination. Default: 200 ms.
    pub fn join_budget(mut self, budget: Duration) -> Self {
        self.config.join_budget = budget;
        self
    }

    /// Destination handling for recorded replays. Default: overwrite.
    pub fn replay_write_mode(mut self, mode: WriteMode) -> Self {
        self.config.replay_write_mode = mode;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<ExecutorConfig<S>, ConfigError> {
        let mut config = self.config;
        // 1. Named policy resolves to a known kind.
        if let Some(name) = self.policy_name {
            config.policy.kind = name.parse()?;
        }
        // 2. Sight-limited kinds need something to see.
        if config.policy.kind.is_sight_limited() && config.policy.sight_limit == 0 {
            return Err(ConfigError::InvalidSightLimit {
                kind: config.policy.kind,
            });
        }
        // 3. Deadlines must lie in the future.
        if config.time_budget.is_zero() {
            return Err(ConfigError::ZeroTimeBudget);
        }
        // 4. D is a non-zero multiple of W.
        config.polling.validate()?;
        // 5. Scale factor is usable by a renderer.
        if !config.scale_factor.is_finite() || config.scale_factor <= 0.0 {
            return Err(ConfigError::InvalidScaleFactor {
                value: config.scale_factor,
            });
        }
        // 6. Visuals need somewhere to draw.
        if config.visuals && config.renderer.is_none() {
            return Err(ConfigError::MissingRenderer);
        }
        Ok(config)
    }
}

impl<S: Session> Default for ExecutorConfigBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
