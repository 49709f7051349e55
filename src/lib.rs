//! Stochastic agent-based simulation of a predator and its host, with the
//! expected cost of a biological control release.

pub mod batch;
pub mod bayes;
pub mod census;
pub mod config;
pub mod engine;
pub mod laws;
pub mod manager;
pub mod model;
pub mod stats;
pub mod store;
