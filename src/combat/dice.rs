//! Attack dice and hit distributions.
//!
//! Both die colors are d6: faces 1-3 miss, 4-5 score a hit of the die's
//! own color, 6 is a critical.

use std::ops::Add;

use num_traits::{One, Signed};
use serde::Serialize;

use crate::combat::rng::Rng;
use crate::error::BattleError;
use crate::markov::rational::{accumulate, ensure_distribution, point_mass, ratio, total, Distribution, Probability};

pub const DIE_SIDES: u8 = 6;

/// Mutually exclusive outcome of one die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HitCategory {
    Black,
    Red,
    Critical,
    Miss,
}

impl HitCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Critical => "critical",
            Self::Miss => "miss",
        }
    }
}

/// Counts per category for one attack. The fields always sum to the
/// number of dice rolled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Hits {
    pub black: u8,
    pub red: u8,
    pub critical: u8,
    pub miss: u8,
}

impl Hits {
    pub const NONE: Hits = Hits::new(0, 0, 0, 0);

    pub const fn new(black: u8, red: u8, critical: u8, miss: u8) -> Self {
        Self {
            black,
            red,
            critical,
            miss,
        }
    }

    pub const fn misses(count: u8) -> Self {
        Self::new(0, 0, 0, count)
    }

    pub fn of(category: HitCategory) -> Self {
        let mut hits = Self::NONE;
        *hits.slot_mut(category) += 1;
        hits
    }

    pub fn count(&self, category: HitCategory) -> u8 {
        match category {
            HitCategory::Black => self.black,
            HitCategory::Red => self.red,
            HitCategory::Critical => self.critical,
            HitCategory::Miss => self.miss,
        }
    }

    /// Number of dice behind these hits.
    pub fn dice(&self) -> u8 {
        self.black + self.red + self.critical + self.miss
    }

    fn slot_mut(&mut self, category: HitCategory) -> &mut u8 {
        match category {
            HitCategory::Black => &mut self.black,
            HitCategory::Red => &mut self.red,
            HitCategory::Critical => &mut self.critical,
            HitCategory::Miss => &mut self.miss,
        }
    }
}

impl Add for Hits {
    type Output = Hits;

    fn add(self, rhs: Hits) -> Hits {
        Hits::new(
            self.black + rhs.black,
            self.red + rhs.red,
            self.critical + rhs.critical,
            self.miss + rhs.miss,
        )
    }
}

pub type HitDistribution = Distribution<Hits>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Die {
    Black,
    Red,
}

impl Die {
    /// Category shown by `face` (1-based).
    pub fn face(self, face: u8) -> Result<HitCategory, BattleError> {
        match (self, face) {
            (_, 1..=3) => Ok(HitCategory::Miss),
            (Die::Black, 4 | 5) => Ok(HitCategory::Black),
            (Die::Red, 4 | 5) => Ok(HitCategory::Red),
            (_, 6) => Ok(HitCategory::Critical),
            _ => Err(BattleError::InvalidDie(format!("{self:?} die has no face {face}"))),
        }
    }

    /// Categorical outcome probabilities from uniform faces.
    pub fn outcomes(self) -> Result<DieOutcomes, BattleError> {
        let mut weights: Distribution<HitCategory> = Distribution::new();
        for face in 1..=DIE_SIDES {
            accumulate(&mut weights, self.face(face)?, ratio(1, i64::from(DIE_SIDES))?);
        }
        DieOutcomes::new(weights.into_iter().collect())
    }

    /// One physical roll.
    pub fn roll(self, rng: &mut Rng) -> Result<HitCategory, BattleError> {
        self.face(rng.roll_die(DIE_SIDES))
    }
}

/// Validated categorical distribution for a single die or card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DieOutcomes {
    weights: Vec<(HitCategory, Probability)>,
}

impl DieOutcomes {
    /// Each weight must lie in `[0, 1]` and the weights must sum to 1.
    pub fn new(weights: Vec<(HitCategory, Probability)>) -> Result<Self, BattleError> {
        if let Some((category, weight)) = weights
            .iter()
            .find(|(_, w)| w.is_negative() || *w > Probability::one())
        {
            return Err(BattleError::InvalidDie(format!(
                "{} weight {weight} outside [0, 1]",
                category.as_str()
            )));
        }
        let sum = total(weights.iter().map(|(_, w)| w));
        if !sum.is_one() {
            return Err(BattleError::InvalidDie(format!("weights sum to {sum}, not 1")));
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &[(HitCategory, Probability)] {
        &self.weights
    }
}

/// Joint hit distribution for rolling every die in `pool` once.
///
/// Convolves one die at a time, which visits every face combination and
/// sums the probabilities of combinations with equal [Hits].
pub fn hit_distribution_for(pool: &[DieOutcomes]) -> Result<HitDistribution, BattleError> {
    let mut dist = point_mass(Hits::NONE);
    for die in pool {
        let mut next = HitDistribution::new();
        for (hits, p) in &dist {
            for (category, q) in die.weights() {
                accumulate(&mut next, *hits + Hits::of(*category), p * q);
            }
        }
        dist = next;
    }
    ensure_distribution(&dist, "dice pool")?;
    Ok(dist)
}

/// [hit_distribution_for] over physical dice.
pub fn pool_distribution(dice: &[Die]) -> Result<HitDistribution, BattleError> {
    let pool = dice
        .iter()
        .map(|die| die.outcomes())
        .collect::<Result<Vec<_>, _>>()?;
    hit_distribution_for(&pool)
}

/// What a destroyed unit contributes: all of its dice miss.
pub fn destroyed_hit_distribution(dice: u8) -> HitDistribution {
    point_mass(Hits::misses(dice))
}

/// Distribution of the component-wise sum of two independent attacks.
pub fn merge_hit_distributions(lhs: &HitDistribution, rhs: &HitDistribution) -> Result<HitDistribution, BattleError> {
    ensure_distribution(lhs, "merge input")?;
    ensure_distribution(rhs, "merge input")?;
    let mut merged = HitDistribution::new();
    for (l_hits, l_prob) in lhs {
        for (r_hits, r_prob) in rhs {
            accumulate(&mut merged, *l_hits + *r_hits, l_prob * r_prob);
        }
    }
    ensure_distribution(&merged, "merged hits")?;
    Ok(merged)
}

/// Rolls every die in `dice` and tallies the categories.
pub fn roll_hits(dice: &[Die], rng: &mut Rng) -> Result<Hits, BattleError> {
    dice.iter().try_fold(Hits::NONE, |hits, die| Ok(hits + Hits::of(die.roll(rng)?)))
}
