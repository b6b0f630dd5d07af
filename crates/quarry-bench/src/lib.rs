//! Benchmark profiles and utilities for the Quarry match harness.
//!
//! Provides pre-built executors over the stub session:
//!
//! - [`reference_executor`]: 4 group members, 1000-tick ceiling
//! - [`stress_executor`]: 64 group members, same ceiling
//! - [`scatter_members`]: deterministic member placement via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use quarry_core::{ObservabilityPolicy, PolicyKind};
use quarry_engine::{ConfigError, Executor, ExecutorConfig};
use quarry_test_utils::{StubMessenger, StubSession};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tick ceiling shared by every profile.
pub const PROFILE_TICKS: u64 = 1000;

/// Build an executor whose sessions hold `members` group members and only
/// stop at [`PROFILE_TICKS`].
///
/// Radius policy with a sight limit of 50, both sides restricted, messaging
/// on with the default messenger.
pub fn profile_executor(seed: u64, members: usize) -> Result<Executor<StubSession>, ConfigError> {
    let config = ExecutorConfig::<StubSession>::builder()
        .seed(seed)
        .policy(ObservabilityPolicy::new(PolicyKind::Radius, 50))
        .tick_limit(Some(PROFILE_TICKS))
        .build()?;
    let group = scatter_members(members, seed);
    Ok(Executor::new(
        config,
        move |seed: u64, policy: &ObservabilityPolicy, messenger: Option<StubMessenger>| {
            StubSession::new(seed, *policy, messenger)
                .with_group(group.iter().map(|(name, pos)| (name.as_str(), *pos)))
        },
    ))
}

/// Reference profile: 4 members.
pub fn reference_executor(seed: u64) -> Result<Executor<StubSession>, ConfigError> {
    profile_executor(seed, 4)
}

/// Stress profile: 64 members.
pub fn stress_executor(seed: u64) -> Result<Executor<StubSession>, ConfigError> {
    profile_executor(seed, 64)
}

/// Generate `n` named members at deterministic positions in `-500..=500`.
pub fn scatter_members(n: usize, seed: u64) -> Vec<(String, i64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| (format!("member-{i}"), rng.gen_range(-500..=500)))
        .collect()
}
