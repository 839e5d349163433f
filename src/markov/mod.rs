//! Exact absorbing Markov chain machinery.

pub mod absorbing;
pub mod matrix;
pub mod rational;

pub use absorbing::{distribution_to_column, markov, markov_n, to_infinity, transition_matrix, AbsorbingChain};
pub use matrix::Matrix;
pub use rational::{ratio, Distribution, Probability};
