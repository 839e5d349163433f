//! A Y-wing and a corvette against a star destroyer.
//!
//! States 1-10 are the fights still in doubt. States 11-14 fold together
//! every damage tuple whose result is already decided:
//!
//! - 11: both rebels destroyed, destroyer still flying
//! - 12: destroyer damaged at least twice, some rebel alive
//! - 13: destroyer destroyed, some rebel alive
//! - 14: everything destroyed

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::combat::catalog::StateCatalog;
use crate::combat::damage::{apply_hits_to_destroyer, apply_hits_to_rebels};
use crate::combat::dice::{
    destroyed_hit_distribution, merge_hit_distributions, pool_distribution, roll_hits, HitDistribution, Hits,
};
use crate::combat::rng::Rng;
use crate::combat::scenario::{combine, Battle};
use crate::combat::units::Unit;
use crate::error::BattleError;
use crate::markov::rational::{accumulate, ensure_distribution, Distribution};

pub const EXCITING_STATE_COUNT: usize = 14;
pub const EXCITING_TRANSIENT_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ExcitingDamage {
    pub y_wing: u8,
    pub corvette: u8,
    pub destroyer: u8,
}

impl ExcitingDamage {
    pub const fn new(y_wing: u8, corvette: u8, destroyer: u8) -> Self {
        Self {
            y_wing,
            corvette,
            destroyer,
        }
    }
}

fn damages(tuples: &[(u8, u8, u8)]) -> BTreeSet<ExcitingDamage> {
    tuples.iter().map(|&(y, c, d)| ExcitingDamage::new(y, c, d)).collect()
}

#[derive(Debug, Clone)]
pub struct ExcitingBattle {
    catalog: StateCatalog<ExcitingDamage>,
    y_wing_hits: HitDistribution,
    corvette_hits: HitDistribution,
    destroyer_hits: HitDistribution,
}

impl ExcitingBattle {
    pub fn new() -> Result<Self, BattleError> {
        let catalog = StateCatalog::new(
            vec![
                damages(&[(0, 0, 0)]),
                damages(&[(0, 1, 0)]),
                damages(&[(0, 2, 0)]),
                damages(&[(0, 0, 1)]),
                damages(&[(0, 1, 1)]),
                damages(&[(0, 2, 1)]),
                damages(&[(1, 0, 0)]),
                damages(&[(1, 1, 0)]),
                damages(&[(1, 0, 1)]),
                damages(&[(1, 1, 1)]),
                damages(&[(1, 2, 0), (1, 2, 1), (1, 2, 2), (1, 2, 3)]),
                damages(&[
                    (0, 0, 2),
                    (0, 1, 2),
                    (0, 2, 2),
                    (1, 0, 2),
                    (1, 1, 2),
                    (0, 0, 3),
                    (0, 1, 3),
                    (0, 2, 3),
                    (1, 0, 3),
                    (1, 1, 3),
                ]),
                damages(&[(0, 0, 4), (0, 1, 4), (0, 2, 4), (1, 0, 4), (1, 1, 4)]),
                damages(&[(1, 2, 4)]),
            ],
            EXCITING_TRANSIENT_COUNT,
        )?;
        Ok(Self {
            catalog,
            y_wing_hits: pool_distribution(Unit::YWing.attack())?,
            corvette_hits: pool_distribution(Unit::Corvette.attack())?,
            destroyer_hits: pool_distribution(Unit::Destroyer.attack())?,
        })
    }

    fn attack(&self, unit: Unit, damage: u8) -> Result<HitDistribution, BattleError> {
        let pool = match unit {
            Unit::YWing => &self.y_wing_hits,
            Unit::Corvette => &self.corvette_hits,
            Unit::Destroyer => &self.destroyer_hits,
            Unit::TieFighter => {
                return Err(BattleError::UnitNotInBattle {
                    unit: unit.name(),
                    battle: self.name(),
                })
            }
        };
        if unit.is_destroyed(damage) {
            Ok(destroyed_hit_distribution(unit.dice()))
        } else {
            Ok(pool.clone())
        }
    }

    /// Combined hit distribution of every surviving rebel ship.
    pub fn rebel_hit_distribution(&self, damage: &ExcitingDamage) -> Result<HitDistribution, BattleError> {
        merge_hit_distributions(
            &self.attack(Unit::YWing, damage.y_wing)?,
            &self.attack(Unit::Corvette, damage.corvette)?,
        )
    }

    fn roll(unit: Unit, damage: u8, rng: &mut Rng) -> Result<Hits, BattleError> {
        if unit.is_destroyed(damage) {
            Ok(Hits::misses(unit.dice()))
        } else {
            roll_hits(unit.attack(), rng)
        }
    }
}

impl Battle for ExcitingBattle {
    type Damage = ExcitingDamage;

    fn name(&self) -> &'static str {
        "exciting"
    }

    fn catalog(&self) -> &StateCatalog<ExcitingDamage> {
        &self.catalog
    }

    fn damage_space(&self) -> Vec<ExcitingDamage> {
        let mut space = Vec::new();
        for y in 0..=Unit::YWing.threshold() {
            for c in 0..=Unit::Corvette.threshold() {
                for d in 0..=Unit::Destroyer.threshold() {
                    space.push(ExcitingDamage::new(y, c, d));
                }
            }
        }
        space
    }

    fn damage_distribution(&self, damage: &ExcitingDamage) -> Result<Distribution<ExcitingDamage>, BattleError> {
        let rebel_hits = self.rebel_hit_distribution(damage)?;
        let empire_hits = self.attack(Unit::Destroyer, damage.destroyer)?;
        ensure_distribution(&empire_hits, "destroyer hits")?;

        let mut rebel_damage: Distribution<(u8, u8)> = Distribution::new();
        for (hits, p) in &empire_hits {
            let next = apply_hits_to_rebels(damage.y_wing, damage.corvette, *hits)?;
            accumulate(&mut rebel_damage, next, p.clone());
        }
        ensure_distribution(&rebel_damage, "rebel damage")?;

        let mut destroyer_damage: Distribution<u8> = Distribution::new();
        for (hits, p) in &rebel_hits {
            accumulate(&mut destroyer_damage, apply_hits_to_destroyer(damage.destroyer, *hits), p.clone());
        }
        ensure_distribution(&destroyer_damage, "destroyer damage")?;

        debug!(
            ?damage,
            rebel_outcomes = rebel_damage.len(),
            destroyer_outcomes = destroyer_damage.len(),
            "exciting battle round"
        );
        combine(&rebel_damage, &destroyer_damage, "battle damage", |&(y, c), &d| {
            ExcitingDamage::new(y, c, d)
        })
    }

    fn combat_step(&self, damage: &ExcitingDamage, rng: &mut Rng) -> Result<ExcitingDamage, BattleError> {
        let y_wing_hits = Self::roll(Unit::YWing, damage.y_wing, rng)?;
        let corvette_hits = Self::roll(Unit::Corvette, damage.corvette, rng)?;
        let empire_hits = Self::roll(Unit::Destroyer, damage.destroyer, rng)?;

        let destroyer = apply_hits_to_destroyer(damage.destroyer, y_wing_hits + corvette_hits);
        let (y_wing, corvette) = apply_hits_to_rebels(damage.y_wing, damage.corvette, empire_hits)?;
        Ok(ExcitingDamage::new(y_wing, corvette, destroyer))
    }
}
