//! Exact probabilities.
//!
//! Every probability in the solver path is a [BigRational]; floats only
//! appear when a value is printed or compared against a Monte Carlo
//! frequency.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{BattleError, MatrixError};

pub type Probability = BigRational;

/// Probability mass function keyed by outcome.
pub type Distribution<K> = BTreeMap<K, Probability>;

/// `numer / denom` as an exact rational.
pub fn ratio(numer: i64, denom: i64) -> Result<Probability, MatrixError> {
    if denom == 0 {
        return Err(MatrixError::ZeroDenominator);
    }
    Ok(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
}

pub fn zero() -> Probability {
    Probability::zero()
}

pub fn one() -> Probability {
    Probability::one()
}

pub fn total<'a, I>(values: I) -> Probability
where
    I: IntoIterator<Item = &'a Probability>,
{
    values.into_iter().fold(zero(), |acc, p| acc + p)
}

/// True when the masses sum to exactly one.
pub fn is_distribution<K>(dist: &Distribution<K>) -> bool {
    total(dist.values()).is_one()
}

/// Checks [is_distribution] and names the pipeline stage on failure.
pub fn ensure_distribution<K>(dist: &Distribution<K>, stage: &'static str) -> Result<(), BattleError> {
    let sum = total(dist.values());
    if sum.is_one() {
        Ok(())
    } else {
        Err(BattleError::NotADistribution {
            stage,
            total: sum.to_string(),
        })
    }
}

/// Adds `mass` to the entry for `key`.
pub fn accumulate<K: Ord>(dist: &mut Distribution<K>, key: K, mass: Probability) {
    *dist.entry(key).or_insert_with(zero) += mass;
}

/// Point mass on `key`.
pub fn point_mass<K: Ord>(key: K) -> Distribution<K> {
    let mut dist = Distribution::new();
    dist.insert(key, one());
    dist
}

/// Lossy conversion for display and statistical comparison.
pub fn to_f64(value: &Probability) -> f64 {
    let numer = value.numer().to_f64().unwrap_or(f64::NAN);
    let denom = value.denom().to_f64().unwrap_or(f64::NAN);
    numer / denom
}

/// Round half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
