//! Absorbing Markov chains in column-stochastic form.
//!
//! Column `j` of a transition matrix is the distribution of the next
//! state given current state `j + 1`. Transient states come first.

use std::collections::BTreeMap;

use num_traits::{One, Zero};
use tracing::debug;

use crate::combat::catalog::StateId;
use crate::error::{BattleError, MatrixError};
use crate::markov::matrix::Matrix;
use crate::markov::rational::{Distribution, Probability};

/// Builds the `states x states` matrix whose column `j` is
/// `transition_distribution(j + 1)`.
pub fn transition_matrix<F>(states: usize, mut transition_distribution: F) -> Result<Matrix, BattleError>
where
    F: FnMut(StateId) -> Result<Distribution<StateId>, BattleError>,
{
    let mut p = Matrix::zeros(states, states);
    for col in 0..states {
        let from = StateId::from_index(col);
        let dist = transition_distribution(from)?;
        for (to, prob) in dist {
            if to.get() == 0 || to.get() > states {
                return Err(BattleError::StateOutOfRange {
                    state: to.get(),
                    count: states,
                });
            }
            p[(to.index(), col)] = prob;
        }
    }
    Ok(p)
}

/// Assembles the canonical absorbing matrix `[[Q, 0], [R, I]]`.
pub fn markov(q: &Matrix, r: &Matrix) -> Result<Matrix, MatrixError> {
    if q.cols() != r.cols() {
        return Err(MatrixError::ShapeMismatch {
            op: "markov",
            left: q.shape(),
            right: r.shape(),
        });
    }
    if !q.is_square() {
        return Err(MatrixError::NotSquare {
            rows: q.rows(),
            cols: q.cols(),
        });
    }
    let top = q.row_join(&Matrix::zeros(q.rows(), r.rows()))?;
    let bottom = r.row_join(&Matrix::identity(r.rows()))?;
    top.col_join(&bottom)
}

/// Fundamental matrix `N = (I - Q)^-1`.
pub fn markov_n(q: &Matrix) -> Result<Matrix, MatrixError> {
    if !q.is_square() {
        return Err(MatrixError::NotSquare {
            rows: q.rows(),
            cols: q.cols(),
        });
    }
    Matrix::identity(q.rows()).sub(q)?.inverse()
}

/// `lim_{k -> oo} P^k` for an absorbing chain.
///
/// Absorbing states are those whose column is a unit self-loop; they may
/// appear anywhere in `p`. The limit keeps the original ordering.
pub fn to_infinity(p: &Matrix) -> Result<Matrix, MatrixError> {
    if !p.is_square() {
        return Err(MatrixError::NotSquare {
            rows: p.rows(),
            cols: p.cols(),
        });
    }
    ensure_stochastic(p)?;

    let n = p.rows();
    let (absorbing, transient): (Vec<usize>, Vec<usize>) = (0..n).partition(|&s| is_self_loop(p, s));
    if absorbing.is_empty() && !transient.is_empty() {
        return Err(MatrixError::NotAbsorbing);
    }

    let q = p.select(&transient, &transient)?;
    let r = p.select(&absorbing, &transient)?;
    let fundamental = markov_n(&q).map_err(|err| match err {
        MatrixError::Singular => MatrixError::NotAbsorbing,
        other => other,
    })?;
    let rn = r.mul(&fundamental)?;

    let mut limit = Matrix::zeros(n, n);
    for (i, &a) in absorbing.iter().enumerate() {
        limit[(a, a)] = Probability::one();
        for (j, &t) in transient.iter().enumerate() {
            limit[(a, t)] = rn[(i, j)].clone();
        }
    }
    Ok(limit)
}

/// Dense column for a sparse distribution over states `1..=state_count`.
pub fn distribution_to_column(state_count: usize, distribution: &BTreeMap<StateId, f64>) -> Vec<f64> {
    (1..=state_count)
        .map(|s| {
            StateId::new(s)
                .and_then(|id| distribution.get(&id).copied())
                .unwrap_or(0.0)
        })
        .collect()
}

fn is_self_loop(p: &Matrix, state: usize) -> bool {
    (0..p.rows()).all(|row| {
        let value = &p[(row, state)];
        if row == state {
            value.is_one()
        } else {
            value.is_zero()
        }
    })
}

fn ensure_stochastic(p: &Matrix) -> Result<(), MatrixError> {
    for (column, sum) in p.column_sums().into_iter().enumerate() {
        if !sum.is_one() {
            return Err(MatrixError::NotStochastic {
                column,
                total: sum.to_string(),
            });
        }
    }
    Ok(())
}

/// The solved chain: `P` split into `Q` (transient to transient) and `R`
/// (transient to absorbing), plus everything derived from `N`.
#[derive(Debug, Clone)]
pub struct AbsorbingChain {
    p: Matrix,
    q: Matrix,
    r: Matrix,
    fundamental: Matrix,
    absorption: Matrix,
    expected_rounds: Matrix,
}

impl AbsorbingChain {
    /// Splits `p` after the first `transient` states and solves it.
    pub fn solve(p: Matrix, transient: usize) -> Result<Self, MatrixError> {
        if !p.is_square() {
            return Err(MatrixError::NotSquare {
                rows: p.rows(),
                cols: p.cols(),
            });
        }
        if transient > p.rows() {
            return Err(MatrixError::ShapeMismatch {
                op: "partition",
                left: p.shape(),
                right: (transient, transient),
            });
        }
        ensure_stochastic(&p)?;
        let n = p.rows();
        if let Some(state) = (transient..n).find(|&s| !is_self_loop(&p, s)) {
            debug!(state = state + 1, "absorbing block is not an identity");
            return Err(MatrixError::NotAbsorbing);
        }

        let q = p.submatrix(0..transient, 0..transient)?;
        let r = p.submatrix(transient..n, 0..transient)?;
        let fundamental = markov_n(&q)?;
        let absorption = r.mul(&fundamental)?;
        let expected_rounds = Matrix::ones(1, transient).mul(&fundamental)?;
        debug!(transient, absorbing = n - transient, "solved absorbing chain");

        Ok(Self {
            p,
            q,
            r,
            fundamental,
            absorption,
            expected_rounds,
        })
    }

    pub fn transition_matrix(&self) -> &Matrix {
        &self.p
    }

    pub fn q(&self) -> &Matrix {
        &self.q
    }

    pub fn r(&self) -> &Matrix {
        &self.r
    }

    /// `N[i, j]`: expected visits to transient `i + 1` starting from transient `j + 1`.
    pub fn fundamental(&self) -> &Matrix {
        &self.fundamental
    }

    /// `R N`: entry `[a, i]` is the probability of ending in absorbing
    /// state `transient + a + 1` from transient state `i + 1`.
    pub fn absorption(&self) -> &Matrix {
        &self.absorption
    }

    /// `1^t N`: expected rounds until absorption from each transient state.
    pub fn expected_rounds(&self) -> &Matrix {
        &self.expected_rounds
    }

    pub fn transient_count(&self) -> usize {
        self.q.rows()
    }

    pub fn absorbing_count(&self) -> usize {
        self.r.rows()
    }

    /// Absorption distribution from `start`. Absorbing starts stay put.
    pub fn outcome_distribution(&self, start: StateId) -> Result<Distribution<StateId>, BattleError> {
        let t = self.transient_count();
        let count = t + self.absorbing_count();
        if start.get() == 0 || start.get() > count {
            return Err(BattleError::StateOutOfRange {
                state: start.get(),
                count,
            });
        }
        let mut dist = Distribution::new();
        if start.index() >= t {
            dist.insert(start, Probability::one());
            return Ok(dist);
        }
        for a in 0..self.absorbing_count() {
            let prob = &self.absorption[(a, start.index())];
            if !prob.is_zero() {
                dist.insert(StateId::from_index(t + a), prob.clone());
            }
        }
        Ok(dist)
    }

    /// Expected rounds from `start`; zero for absorbing states.
    pub fn expected_rounds_from(&self, start: StateId) -> Result<Probability, BattleError> {
        let t = self.transient_count();
        let count = t + self.absorbing_count();
        if start.get() == 0 || start.get() > count {
            return Err(BattleError::StateOutOfRange {
                state: start.get(),
                count,
            });
        }
        if start.index() >= t {
            return Ok(Probability::zero());
        }
        Ok(self.expected_rounds[(0, start.index())].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markov::rational::ratio;

    fn tie_y() -> Matrix {
        Matrix::rat_mat(&[&[5, 0, 0, 0], &[5, 12, 0, 0], &[1, 0, 12, 0], &[1, 0, 0, 12]], 12).unwrap()
    }

    #[test]
    fn markov_assembles_canonical_form() {
        let q = Matrix::rat_mat(&[&[1, 0], &[1, 1]], 4).unwrap();
        let r = Matrix::rat_mat(&[&[2, 3]], 4).unwrap();
        let p = markov(&q, &r).unwrap();
        assert_eq!(p, Matrix::rat_mat(&[&[1, 0, 0], &[1, 1, 0], &[2, 3, 4]], 4).unwrap());
    }

    #[test]
    fn markov_rejects_bad_shapes() {
        let q = Matrix::zeros(2, 2);
        let r = Matrix::zeros(1, 3);
        assert!(matches!(markov(&q, &r), Err(MatrixError::ShapeMismatch { .. })));
    }

    #[test]
    fn fundamental_matrix_round_trip() {
        let q = tie_y().submatrix(0..1, 0..1).unwrap();
        let n = markov_n(&q).unwrap();
        let i_minus_q = Matrix::identity(1).sub(&q).unwrap();
        assert_eq!(i_minus_q.mul(&n).unwrap(), Matrix::identity(1));
        assert_eq!(n[(0, 0)], ratio(12, 7).unwrap());
    }

    #[test]
    fn recurrent_transient_block_is_singular() {
        let q = Matrix::identity(2);
        assert_eq!(markov_n(&q), Err(MatrixError::Singular));
    }

    #[test]
    fn to_infinity_of_tie_y() {
        let limit = to_infinity(&tie_y()).unwrap();
        assert_eq!(
            limit.column(0).unwrap(),
            Matrix::rat_mat(&[&[0], &[5], &[1], &[1]], 7).unwrap()
        );
        assert_eq!(limit.column(2).unwrap(), Matrix::rat_mat(&[&[0], &[0], &[1], &[0]], 1).unwrap());
    }

    #[test]
    fn to_infinity_handles_interleaved_absorbing_states() {
        // state 1 absorbing, state 2 transient
        let p = Matrix::rat_mat(&[&[2, 1], &[0, 1]], 2).unwrap();
        let limit = to_infinity(&p).unwrap();
        assert_eq!(limit, Matrix::rat_mat(&[&[1, 1], &[0, 0]], 1).unwrap());
    }

    #[test]
    fn to_infinity_rejects_closed_transient_cycle() {
        let p = Matrix::rat_mat(&[&[0, 1, 0], &[1, 0, 0], &[0, 0, 1]], 1).unwrap();
        assert_eq!(to_infinity(&p), Err(MatrixError::NotAbsorbing));
    }

    #[test]
    fn non_stochastic_column_is_rejected() {
        let p = Matrix::rat_mat(&[&[1, 0], &[0, 2]], 2).unwrap();
        assert!(matches!(
            AbsorbingChain::solve(p, 1),
            Err(MatrixError::NotStochastic { column: 0, .. })
        ));
    }

    #[test]
    fn solve_tie_y() {
        let chain = AbsorbingChain::solve(tie_y(), 1).unwrap();
        assert_eq!(chain.absorption(), &Matrix::rat_mat(&[&[5], &[1], &[1]], 7).unwrap());
        assert_eq!(chain.expected_rounds(), &Matrix::rat_mat(&[&[12]], 7).unwrap());

        let outcome = chain.outcome_distribution(StateId::from_index(0)).unwrap();
        assert_eq!(outcome.len(), 3);
        let stay = chain.outcome_distribution(StateId::from_index(3)).unwrap();
        assert_eq!(stay.get(&StateId::from_index(3)), Some(&Probability::one()));
        assert!(chain.expected_rounds_from(StateId::from_index(2)).unwrap().is_zero());
        assert!(chain.outcome_distribution(StateId::from_index(9)).is_err());
    }

    #[test]
    fn distribution_to_column_fills_gaps() {
        let mut dist = BTreeMap::new();
        dist.insert(StateId::from_index(1), 0.25);
        dist.insert(StateId::from_index(3), 0.75);
        assert_eq!(distribution_to_column(4, &dist), vec![0.0, 0.25, 0.0, 0.75]);
    }
}
