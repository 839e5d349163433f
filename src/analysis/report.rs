use serde::Serialize;
use tracing::info;

use crate::combat::catalog::StateId;
use crate::combat::scenario::Battle;
use crate::error::BattleError;
use crate::markov::absorbing::AbsorbingChain;
use crate::markov::matrix::Matrix;
use crate::markov::rational::{to_f64, Distribution};

/// Exact solution of one battle's absorbing chain.
#[derive(Debug, Clone)]
pub struct BattleAnalysis {
    name: &'static str,
    chain: AbsorbingChain,
}

impl BattleAnalysis {
    /// Builds `P` for `battle` and solves it.
    pub fn analyze<B: Battle>(battle: &B) -> Result<Self, BattleError> {
        let p = battle.transition_matrix()?;
        let chain = AbsorbingChain::solve(p, battle.transient_count())?;
        info!(
            battle = battle.name(),
            states = battle.state_count(),
            transient = chain.transient_count(),
            "solved battle"
        );
        Ok(Self {
            name: battle.name(),
            chain,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn chain(&self) -> &AbsorbingChain {
        &self.chain
    }

    pub fn transition_matrix(&self) -> &Matrix {
        self.chain.transition_matrix()
    }

    pub fn outcome_distribution(&self, start: StateId) -> Result<Distribution<StateId>, BattleError> {
        self.chain.outcome_distribution(start)
    }

    pub fn expected_rounds_from(&self, start: StateId) -> Result<f64, BattleError> {
        Ok(to_f64(&self.chain.expected_rounds_from(start)?))
    }

    pub fn report(&self) -> SolveReport {
        SolveReport {
            battle: self.name,
            states: self.chain.transient_count() + self.chain.absorbing_count(),
            transient: self.chain.transient_count(),
            fundamental: MatrixReport::from(self.chain.fundamental()),
            absorption: MatrixReport::from(self.chain.absorption()),
            expected_rounds: MatrixReport::from(self.chain.expected_rounds()),
        }
    }
}

/// A matrix both as exact `p/q` strings and as floats.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub exact: Vec<Vec<String>>,
    pub approx: Vec<Vec<f64>>,
}

impl From<&Matrix> for MatrixReport {
    fn from(matrix: &Matrix) -> Self {
        Self {
            exact: matrix.to_string_rows(),
            approx: matrix.to_f64_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub battle: &'static str,
    pub states: usize,
    pub transient: usize,
    pub fundamental: MatrixReport,
    pub absorption: MatrixReport,
    pub expected_rounds: MatrixReport,
}

/// One absorbing state's exact and sampled probability.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRow {
    pub state: StateId,
    pub exact: String,
    pub exact_approx: f64,
    pub observed: f64,
}
