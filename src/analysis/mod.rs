//! Exact solutions and their Monte Carlo cross-check.

pub mod monte_carlo;
pub mod report;

pub use monte_carlo::{
    bad_seed_message, fresh_seed, max_deviation, run_combat, tally_outcomes, tally_transitions, OutcomeTally,
    SimulationPlan, TransitionTally,
};
pub use report::{BattleAnalysis, MatrixReport, OutcomeRow, SolveReport};
