//! Canonical state catalogs: which damage tuples each chain state stands for.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::BattleError;

/// One-based identifier of a chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StateId(usize);

impl StateId {
    /// `None` for zero; state numbering starts at 1.
    pub fn new(state: usize) -> Option<Self> {
        (state > 0).then_some(Self(state))
    }

    /// State for a zero-based matrix index.
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Zero-based matrix index.
    pub fn index(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed mapping from states to the damage tuples they fold together.
///
/// States `1..=transient` are transient; the rest absorb.
#[derive(Debug, Clone)]
pub struct StateCatalog<D> {
    states: Vec<BTreeSet<D>>,
    lookup: BTreeMap<D, StateId>,
    transient: usize,
}

impl<D> StateCatalog<D>
where
    D: Ord + Clone + fmt::Debug,
{
    /// Fails if two states share a damage tuple.
    pub fn new(states: Vec<BTreeSet<D>>, transient: usize) -> Result<Self, BattleError> {
        if transient > states.len() {
            return Err(BattleError::StateOutOfRange {
                state: transient,
                count: states.len(),
            });
        }
        let mut lookup = BTreeMap::new();
        for (index, members) in states.iter().enumerate() {
            let state = StateId::from_index(index);
            for damage in members {
                if let Some(first) = lookup.insert(damage.clone(), state) {
                    return Err(BattleError::DuplicateDamage {
                        damage: format!("{damage:?}"),
                        first: first.get(),
                        second: state.get(),
                    });
                }
            }
        }
        Ok(Self {
            states,
            lookup,
            transient,
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn transient_count(&self) -> usize {
        self.transient
    }

    /// Total number of damage tuples covered.
    pub fn damage_count(&self) -> usize {
        self.lookup.len()
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> {
        (0..self.states.len()).map(StateId::from_index)
    }

    pub fn is_terminal(&self, state: StateId) -> bool {
        state.get() > self.transient
    }

    pub fn check(&self, state: StateId) -> Result<StateId, BattleError> {
        if state.get() <= self.states.len() {
            Ok(state)
        } else {
            Err(BattleError::StateOutOfRange {
                state: state.get(),
                count: self.states.len(),
            })
        }
    }

    pub fn damages(&self, state: StateId) -> Result<&BTreeSet<D>, BattleError> {
        let state = self.check(state)?;
        Ok(&self.states[state.index()])
    }

    /// The single damage tuple behind a transient state.
    pub fn representative(&self, state: StateId) -> Result<&D, BattleError> {
        let members = self.damages(state)?;
        let mut iter = members.iter();
        match (iter.next(), iter.next()) {
            (Some(damage), None) => Ok(damage),
            _ => Err(BattleError::AmbiguousState {
                state: state.get(),
                members: members.len(),
            }),
        }
    }

    pub fn state_for_damage(&self, damage: &D) -> Result<StateId, BattleError> {
        self.lookup
            .get(damage)
            .copied()
            .ok_or_else(|| BattleError::NoStateForDamage(format!("{damage:?}")))
    }

    /// True when exactly the given tuples are covered, each once.
    pub fn covers_exactly<I>(&self, space: I) -> bool
    where
        I: IntoIterator<Item = D>,
    {
        let space: BTreeSet<D> = space.into_iter().collect();
        space.len() == self.lookup.len() && space.iter().all(|d| self.lookup.contains_key(d))
    }
}
