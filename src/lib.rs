//! Domain-agnostic Variable Neighborhood Search (VNS).
//!
//! An iterative local-search engine that escapes local optima by shaking
//! the current solution with increasing strength, refining the shaken
//! solution with local search, and keeping it through a pluggable
//! acceptance criterion. Single- and multi-objective problems are handled
//! uniformly through Pareto dominance.
//!
//! # Building blocks
//!
//! - [`Problem`] / [`Solution`]: objective functions, initial solution and
//!   immutable candidate values with cached objective vectors.
//! - [`NeighborhoodOperator`] / [`ShakeFunction`]: problem-specific moves,
//!   supplied by the caller.
//! - [`SearchFunction`]: [`NoopSearch`], [`FirstImprovement`],
//!   [`BestImprovement`], [`VariableNeighborhoodDescent`].
//! - [`AcceptanceCriterion`]: [`ParetoAcceptance`] (archive with optional
//!   buffer) and [`SkewedAcceptance`] (Skewed VNS).
//! - [`VnsOptimizer`]: the shake, search, accept loop, exposed one step at
//!   a time through [`Run`]. [`VnsRunner`] stops it on a [`RunBudget`].
//!
//! # Features
//!
//! - `parallel`: evaluates best-improvement neighborhoods on the rayon pool.
//! - `serde`: `Serialize`/`Deserialize` for plain configuration and report types.
//!
//! # Logging
//!
//! The crate emits `tracing` events (`debug` per step, `info` from
//! [`VnsRunner`]) and never installs a subscriber.
//!
//! # References
//!
//! - Mladenović, N. & Hansen, P. (1997). "Variable neighborhood search",
//!   *Computers & Operations Research* 24(11), 1097-1100.
//! - Hansen, P. & Mladenović, N. (2001). "Variable neighborhood search:
//!   Principles and applications", *European Journal of Operational Research* 130(3), 449-467.

mod acceptance;
mod config;
mod dominance;
mod error;
mod operators;
mod runner;
mod search;
mod types;

pub use acceptance::{
    AcceptanceCriterion, BoundedBuffer, ParetoAcceptance, SkewedAcceptance, Verdict,
};
pub use config::{RunBudget, VnsConfig, VnsConfigBuilder};
pub use dominance::{
    dominates, dominates_with_slack, non_dominated, objectives_equal, Sense, OBJECTIVE_EPSILON,
};
pub use error::{Result, VnsError};
pub use operators::{random_index, NeighborhoodOperator, Neighbors, RepeatedMove, ShakeFunction};
pub use runner::{Run, RunStats, Step, StopReason, VnsOptimizer, VnsResult, VnsRunner};
pub use search::{
    BestImprovement, FirstImprovement, NoopSearch, SearchContext, SearchFunction,
    VariableNeighborhoodDescent,
};
pub use types::{DistanceFn, InitialFn, ObjectiveFn, Problem, ProblemBuilder, Solution};
