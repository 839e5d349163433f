//! Seeded Monte Carlo cross-check of the exact chain.
//!
//! Trials are split into fixed batches; batch `i` draws from
//! `Rng::for_stream(seed, i)`. A tally therefore depends only on
//! `(seed, trials, batches)`, never on how many threads ran it.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::combat::catalog::StateId;
use crate::combat::rng::Rng;
use crate::combat::scenario::Battle;
use crate::config::AnalysisConfig;
use crate::error::BattleError;
use crate::markov::rational::{to_f64, Distribution};
use crate::parallel::{run_batches, WorkerPool};

/// Everything a tally needs besides the battle and the start state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    pub trials: usize,
    pub seed: u64,
    pub batches: usize,
    pub round_cap: u32,
    pub pool: WorkerPool,
}

impl SimulationPlan {
    pub fn new(trials: usize, seed: u64) -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            trials,
            seed,
            batches: defaults.batches,
            round_cap: defaults.round_cap,
            pool: WorkerPool::default_workers(),
        }
    }

    pub fn from_config(config: &AnalysisConfig, seed: u64) -> Self {
        Self {
            trials: config.trials,
            seed,
            batches: config.batches,
            round_cap: config.round_cap,
            pool: config.worker_pool(),
        }
    }

    /// Rejects plans that would run no trials at all.
    pub fn check(&self) -> Result<(), BattleError> {
        if self.trials == 0 {
            return Err(BattleError::EmptyPlan { field: "trial" });
        }
        if self.batches == 0 {
            return Err(BattleError::EmptyPlan { field: "batch" });
        }
        Ok(())
    }
}

/// Plays one combat from `start` until an absorbing state.
///
/// Returns the final state and the number of rounds played.
pub fn run_combat<B: Battle>(
    battle: &B,
    start: StateId,
    rng: &mut Rng,
    round_cap: u32,
) -> Result<(StateId, u32), BattleError> {
    let mut state = battle.catalog().check(start)?;
    let mut rounds = 0u32;
    while !battle.is_terminal(state) {
        if rounds >= round_cap {
            return Err(BattleError::RoundCapExceeded {
                start: start.get(),
                cap: round_cap,
            });
        }
        state = battle.combat_transition(state, rng)?;
        rounds += 1;
    }
    Ok((state, rounds))
}

/// Empirical one-step transitions from a single state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionTally {
    pub start: StateId,
    pub trials: usize,
    pub counts: BTreeMap<StateId, usize>,
}

impl TransitionTally {
    pub fn frequencies(&self) -> BTreeMap<StateId, f64> {
        frequencies(&self.counts, self.trials)
    }
}

/// Empirical absorption outcomes from a single start state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub start: StateId,
    pub trials: usize,
    pub counts: BTreeMap<StateId, usize>,
    pub total_rounds: u64,
}

impl OutcomeTally {
    pub fn frequencies(&self) -> BTreeMap<StateId, f64> {
        frequencies(&self.counts, self.trials)
    }

    pub fn mean_rounds(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.total_rounds as f64 / self.trials as f64
        }
    }
}

fn frequencies(counts: &BTreeMap<StateId, usize>, trials: usize) -> BTreeMap<StateId, f64> {
    if trials == 0 {
        return BTreeMap::new();
    }
    counts
        .iter()
        .map(|(state, count)| (*state, *count as f64 / trials as f64))
        .collect()
}

fn merge_counts(into: &mut BTreeMap<StateId, usize>, from: BTreeMap<StateId, usize>) {
    for (state, count) in from {
        *into.entry(state).or_insert(0) += count;
    }
}

/// Samples `plan.trials` single rounds from `start`.
pub fn tally_transitions<B: Battle>(
    battle: &B,
    start: StateId,
    plan: &SimulationPlan,
) -> Result<TransitionTally, BattleError> {
    let start = battle.catalog().check(start)?;
    plan.check()?;
    let batches = run_batches(plan.trials, plan.batches, &plan.pool, |index, begin, end| {
        let mut rng = Rng::for_stream(plan.seed, index as u64);
        let mut counts = BTreeMap::new();
        for _ in begin..end {
            let next = battle.combat_transition(start, &mut rng)?;
            *counts.entry(next).or_insert(0usize) += 1;
        }
        Ok::<_, BattleError>(counts)
    });

    let mut counts = BTreeMap::new();
    for batch in batches {
        merge_counts(&mut counts, batch?);
    }
    debug!(battle = battle.name(), %start, trials = plan.trials, "tallied transitions");
    Ok(TransitionTally {
        start,
        trials: plan.trials,
        counts,
    })
}

/// Plays `plan.trials` full combats from `start`.
pub fn tally_outcomes<B: Battle>(battle: &B, start: StateId, plan: &SimulationPlan) -> Result<OutcomeTally, BattleError> {
    let start = battle.catalog().check(start)?;
    plan.check()?;
    let batches = run_batches(plan.trials, plan.batches, &plan.pool, |index, begin, end| {
        let mut rng = Rng::for_stream(plan.seed, index as u64);
        let mut counts = BTreeMap::new();
        let mut rounds = 0u64;
        for _ in begin..end {
            let (outcome, played) = run_combat(battle, start, &mut rng, plan.round_cap)?;
            *counts.entry(outcome).or_insert(0usize) += 1;
            rounds += u64::from(played);
        }
        Ok::<_, BattleError>((counts, rounds))
    });

    let mut counts = BTreeMap::new();
    let mut total_rounds = 0u64;
    for batch in batches {
        let (batch_counts, rounds) = batch?;
        merge_counts(&mut counts, batch_counts);
        total_rounds += rounds;
    }
    info!(battle = battle.name(), %start, trials = plan.trials, seed = plan.seed, "tallied outcomes");
    Ok(OutcomeTally {
        start,
        trials: plan.trials,
        counts,
        total_rounds,
    })
}

/// Largest gap between sampled frequencies and an exact distribution,
/// over the states either one mentions.
pub fn max_deviation(observed: &BTreeMap<StateId, f64>, exact: &Distribution<StateId>) -> f64 {
    let mut worst = 0.0f64;
    for (state, p) in exact {
        let seen = observed.get(state).copied().unwrap_or(0.0);
        worst = worst.max((seen - to_f64(p)).abs());
    }
    for (state, seen) in observed {
        if !exact.contains_key(state) {
            worst = worst.max(seen.abs());
        }
    }
    worst
}

/// A seed from OS entropy. Falls back to the clock if entropy is unavailable.
pub fn fresh_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            warn!(%err, "OS entropy unavailable, seeding from the clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or(0)
        }
    }
}

/// Context attached to statistical assertions so a failing run can be replayed.
pub fn bad_seed_message(seed: u64, trials: usize) -> String {
    format!("Monte Carlo check failed with seed {seed} over {trials} trials; rerun with SPACEBATTLE_TEST_SEED={seed}")
}
