//! Exact analysis of dice-driven space battles as absorbing Markov chains.

pub mod analysis;
pub mod cli;
pub mod combat;
pub mod config;
pub mod error;
pub mod markov;
pub mod parallel;
