//! A lone Y-wing against a lone TIE fighter.
//!
//! | state | y-wing | tie fighter |
//! |-------|--------|-------------|
//! | 1     | alive  | alive       |
//! | 2     | dead   | alive       |
//! | 3     | dead   | dead        |
//! | 4     | alive  | dead        |

use std::collections::BTreeSet;

use serde::Serialize;

use crate::combat::catalog::StateCatalog;
use crate::combat::damage::{apply_hits_to_tie_fighter, apply_hits_to_y_wing};
use crate::combat::dice::{destroyed_hit_distribution, pool_distribution, roll_hits, HitDistribution, Hits};
use crate::combat::rng::Rng;
use crate::combat::scenario::{combine, Battle};
use crate::combat::units::Unit;
use crate::error::BattleError;
use crate::markov::rational::{accumulate, ensure_distribution, Distribution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DuelDamage {
    pub y_wing: u8,
    pub tie_fighter: u8,
}

impl DuelDamage {
    pub const fn new(y_wing: u8, tie_fighter: u8) -> Self {
        Self { y_wing, tie_fighter }
    }
}

#[derive(Debug, Clone)]
pub struct Duel {
    catalog: StateCatalog<DuelDamage>,
    y_wing_hits: HitDistribution,
    tie_fighter_hits: HitDistribution,
}

impl Duel {
    pub fn new() -> Result<Self, BattleError> {
        let catalog = StateCatalog::new(
            vec![
                BTreeSet::from([DuelDamage::new(0, 0)]),
                BTreeSet::from([DuelDamage::new(1, 0)]),
                BTreeSet::from([DuelDamage::new(1, 1)]),
                BTreeSet::from([DuelDamage::new(0, 1)]),
            ],
            1,
        )?;
        Ok(Self {
            catalog,
            y_wing_hits: pool_distribution(Unit::YWing.attack())?,
            tie_fighter_hits: pool_distribution(Unit::TieFighter.attack())?,
        })
    }

    fn attack(&self, unit: Unit, damage: u8) -> Result<HitDistribution, BattleError> {
        let pool = match unit {
            Unit::YWing => &self.y_wing_hits,
            Unit::TieFighter => &self.tie_fighter_hits,
            Unit::Corvette | Unit::Destroyer => {
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
}

fn damage_after<F>(hits: &HitDistribution, apply: F, stage: &'static str) -> Result<Distribution<u8>, BattleError>
where
    F: Fn(Hits) -> u8,
{
    let mut dist = Distribution::new();
    for (h, p) in hits {
        accumulate(&mut dist, apply(*h), p.clone());
    }
    ensure_distribution(&dist, stage)?;
    Ok(dist)
}

impl Battle for Duel {
    type Damage = DuelDamage;

    fn name(&self) -> &'static str {
        "duel"
    }

    fn catalog(&self) -> &StateCatalog<DuelDamage> {
        &self.catalog
    }

    fn damage_space(&self) -> Vec<DuelDamage> {
        (0..=Unit::YWing.threshold())
            .flat_map(|y| (0..=Unit::TieFighter.threshold()).map(move |t| DuelDamage::new(y, t)))
            .collect()
    }

    fn damage_distribution(&self, damage: &DuelDamage) -> Result<Distribution<DuelDamage>, BattleError> {
        let y_attack = self.attack(Unit::YWing, damage.y_wing)?;
        let tie_attack = self.attack(Unit::TieFighter, damage.tie_fighter)?;

        let y_damage = damage_after(&tie_attack, |h| apply_hits_to_y_wing(damage.y_wing, h), "y-wing damage")?;
        let tie_damage = damage_after(
            &y_attack,
            |h| apply_hits_to_tie_fighter(damage.tie_fighter, h),
            "tie fighter damage",
        )?;
        combine(&y_damage, &tie_damage, "duel damage", |y, t| DuelDamage::new(*y, *t))
    }

    fn combat_step(&self, damage: &DuelDamage, rng: &mut Rng) -> Result<DuelDamage, BattleError> {
        let y_hits = if Unit::YWing.is_destroyed(damage.y_wing) {
            Hits::misses(Unit::YWing.dice())
        } else {
            roll_hits(Unit::YWing.attack(), rng)?
        };
        let tie_hits = if Unit::TieFighter.is_destroyed(damage.tie_fighter) {
            Hits::misses(Unit::TieFighter.dice())
        } else {
            roll_hits(Unit::TieFighter.attack(), rng)?
        };
        Ok(DuelDamage::new(
            apply_hits_to_y_wing(damage.y_wing, tie_hits),
            apply_hits_to_tie_fighter(damage.tie_fighter, y_hits),
        ))
    }
}
