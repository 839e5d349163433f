//! The seam between a concrete battle and the generic solver/simulator.

use std::fmt;

use tracing::trace;

use crate::combat::catalog::{StateCatalog, StateId};
use crate::combat::rng::Rng;
use crate::error::BattleError;
use crate::markov::absorbing;
use crate::markov::matrix::Matrix;
use crate::markov::rational::{accumulate, ensure_distribution, Distribution};

pub type StateDistribution = Distribution<StateId>;

/// A battle modeled as an absorbing chain over a fixed state catalog.
pub trait Battle: Sync {
    /// Per-unit damage tuple.
    type Damage: Ord + Clone + fmt::Debug;

    fn name(&self) -> &'static str;

    fn catalog(&self) -> &StateCatalog<Self::Damage>;

    /// Every damage tuple within the units' thresholds.
    fn damage_space(&self) -> Vec<Self::Damage>;

    /// Exact distribution of the next-round damage from `damage`.
    fn damage_distribution(&self, damage: &Self::Damage) -> Result<Distribution<Self::Damage>, BattleError>;

    /// One sampled round from `damage`, rolling physical dice.
    fn combat_step(&self, damage: &Self::Damage, rng: &mut Rng) -> Result<Self::Damage, BattleError>;

    fn state_count(&self) -> usize {
        self.catalog().len()
    }

    fn transient_count(&self) -> usize {
        self.catalog().transient_count()
    }

    fn is_terminal(&self, state: StateId) -> bool {
        self.catalog().is_terminal(state)
    }

    fn state_for_damage(&self, damage: &Self::Damage) -> Result<StateId, BattleError> {
        self.catalog().state_for_damage(damage)
    }

    /// Distribution of the next state. Terminal states loop on themselves.
    fn transition_distribution(&self, state: StateId) -> Result<StateDistribution, BattleError> {
        let catalog = self.catalog();
        let state = catalog.check(state)?;
        if catalog.is_terminal(state) {
            return Ok(crate::markov::rational::point_mass(state));
        }
        let damage = catalog.representative(state)?;
        let next = self.damage_distribution(damage)?;
        let dist = reduce_to_states(catalog, &next)?;
        trace!(battle = self.name(), %state, successors = dist.len(), "transition distribution");
        Ok(dist)
    }

    /// Column `j` holds the transition distribution of state `j + 1`.
    fn transition_matrix(&self) -> Result<Matrix, BattleError> {
        absorbing::transition_matrix(self.state_count(), |state| self.transition_distribution(state))
    }

    /// Sampled successor of `state`. Terminal states return immediately
    /// without touching `rng`.
    fn combat_transition(&self, state: StateId, rng: &mut Rng) -> Result<StateId, BattleError> {
        let catalog = self.catalog();
        let state = catalog.check(state)?;
        if catalog.is_terminal(state) {
            return Ok(state);
        }
        let damage = catalog.representative(state)?;
        let next = self.combat_step(damage, rng)?;
        catalog.state_for_damage(&next)
    }
}

/// Folds a damage distribution onto the catalog's states.
pub fn reduce_to_states<D>(
    catalog: &StateCatalog<D>,
    damage: &Distribution<D>,
) -> Result<StateDistribution, BattleError>
where
    D: Ord + Clone + fmt::Debug,
{
    let mut states = StateDistribution::new();
    for (d, p) in damage {
        accumulate(&mut states, catalog.state_for_damage(d)?, p.clone());
    }
    ensure_distribution(&states, "state distribution")?;
    Ok(states)
}

/// Product distribution of two independent components.
pub fn combine<A, B, T, F>(
    lhs: &Distribution<A>,
    rhs: &Distribution<B>,
    stage: &'static str,
    join: F,
) -> Result<Distribution<T>, BattleError>
where
    T: Ord,
    F: Fn(&A, &B) -> T,
{
    let mut out = Distribution::new();
    for (a, p) in lhs {
        for (b, q) in rhs {
            accumulate(&mut out, join(a, b), p * q);
        }
    }
    ensure_distribution(&out, stage)?;
    Ok(out)
}
