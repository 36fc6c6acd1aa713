//! Local search strategies.
//!
//! Each [`SearchFunction`] maps a solution to a local optimum with respect
//! to the dominance relation of the run's acceptance criterion:
//!
//! - [`NoopSearch`]: returns the input (Reduced VNS).
//! - [`FirstImprovement`]: moves to the first dominating neighbor, rescans.
//! - [`BestImprovement`]: scans all neighbors, moves to the most dominant one.
//! - [`VariableNeighborhoodDescent`]: cycles through several searches,
//!   restarting from the first whenever one improves.

use std::sync::Arc;

use rand::RngCore;
use tracing::trace;

use crate::acceptance::AcceptanceCriterion;
use crate::error::{Result, VnsError};
use crate::operators::NeighborhoodOperator;
use crate::types::Solution;

/// What a search function may consult while it runs.
pub struct SearchContext<'a, D> {
    /// Criterion whose dominance relation defines "improvement".
    pub criterion: &'a dyn AcceptanceCriterion<D>,
    /// Random source, shared with neighborhood operators.
    pub rng: &'a mut dyn RngCore,
}

impl<'a, D> SearchContext<'a, D> {
    /// Creates a context.
    pub fn new(criterion: &'a dyn AcceptanceCriterion<D>, rng: &'a mut dyn RngCore) -> Self {
        Self { criterion, rng }
    }

    /// Whether `a` dominates `b` under the criterion.
    pub fn dominates(&self, a: &Solution<D>, b: &Solution<D>) -> Result<bool> {
        self.criterion.dominates(a, b)
    }
}

/// A local search strategy.
pub trait SearchFunction<D>: Send + Sync {
    /// Runs the search from `solution` and returns the local optimum found.
    fn search(&self, solution: Solution<D>, ctx: &mut SearchContext<'_, D>) -> Result<Solution<D>>;
}

/// Performs no local search.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearch;

impl<D> SearchFunction<D> for NoopSearch {
    fn search(&self, solution: Solution<D>, _ctx: &mut SearchContext<'_, D>) -> Result<Solution<D>> {
        Ok(solution)
    }
}

/// First-improvement hill climbing over one neighborhood operator.
pub struct FirstImprovement<D> {
    operator: Arc<dyn NeighborhoodOperator<D>>,
}

impl<D> FirstImprovement<D> {
    /// Creates a first-improvement search over `operator`.
    pub fn new(operator: Arc<dyn NeighborhoodOperator<D>>) -> Self {
        Self { operator }
    }
}

impl<D> SearchFunction<D> for FirstImprovement<D> {
    fn search(&self, solution: Solution<D>, ctx: &mut SearchContext<'_, D>) -> Result<Solution<D>> {
        let criterion = ctx.criterion;
        let mut current = solution;

        loop {
            let base = current.clone();
            let mut improved = None;
            for neighbor in self.operator.neighbors(&base, &mut *ctx.rng) {
                if criterion.dominates(&neighbor, &base)? {
                    improved = Some(neighbor);
                    break;
                }
            }

            match improved {
                Some(next) => {
                    trace!(objectives = ?next.objectives(), "first improvement");
                    current = next;
                }
                None => return Ok(current),
            }
        }
    }
}

/// Best-improvement hill climbing over one neighborhood operator.
///
/// With the `parallel` feature, each neighborhood is materialized and its
/// objectives are evaluated on the rayon pool before the sequential
/// selection. Objective functions must then be free of side effects.
pub struct BestImprovement<D> {
    operator: Arc<dyn NeighborhoodOperator<D>>,
}

impl<D> BestImprovement<D> {
    /// Creates a best-improvement search over `operator`.
    pub fn new(operator: Arc<dyn NeighborhoodOperator<D>>) -> Self {
        Self { operator }
    }
}

impl<D: Send + Sync> SearchFunction<D> for BestImprovement<D> {
    fn search(&self, solution: Solution<D>, ctx: &mut SearchContext<'_, D>) -> Result<Solution<D>> {
        let criterion = ctx.criterion;
        let mut current = solution;

        loop {
            let base = current.clone();
            let mut best = base.clone();

            #[cfg(feature = "parallel")]
            let neighbors = {
                use rayon::prelude::*;
                let all: Vec<Solution<D>> = self.operator.neighbors(&base, &mut *ctx.rng).collect();
                all.par_iter().for_each(|n| {
                    n.objectives();
                });
                all.into_iter()
            };
            #[cfg(not(feature = "parallel"))]
            let neighbors = self.operator.neighbors(&base, &mut *ctx.rng);

            for neighbor in neighbors {
                if criterion.dominates(&neighbor, &best)? {
                    best = neighbor;
                }
            }

            if criterion.dominates(&best, &base)? {
                trace!(objectives = ?best.objectives(), "best improvement");
                current = best;
            } else {
                return Ok(current);
            }
        }
    }
}

/// Variable Neighborhood Descent over an ordered list of searches.
///
/// State is the index of the active search. An improving search sends the
/// descent back to index 0; a non-improving one advances the index. The
/// descent stops once the last search fails to improve.
pub struct VariableNeighborhoodDescent<D> {
    searches: Vec<Arc<dyn SearchFunction<D>>>,
}

impl<D> VariableNeighborhoodDescent<D> {
    /// Creates a descent over `searches`, tried in order.
    ///
    /// # Errors
    ///
    /// [`VnsError::NoSearchFunctions`] if `searches` is empty.
    pub fn new(searches: Vec<Arc<dyn SearchFunction<D>>>) -> Result<Self> {
        if searches.is_empty() {
            return Err(VnsError::NoSearchFunctions);
        }
        Ok(Self { searches })
    }

    /// Number of searches in the descent.
    pub fn len(&self) -> usize {
        self.searches.len()
    }

    /// Always `false`; construction rejects empty descents.
    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }
}

impl<D> SearchFunction<D> for VariableNeighborhoodDescent<D> {
    fn search(&self, solution: Solution<D>, ctx: &mut SearchContext<'_, D>) -> Result<Solution<D>> {
        let mut current = solution;
        let mut level = 0;

        while level < self.searches.len() {
            let candidate = self.searches[level].search(current.clone(), ctx)?;
            if ctx.dominates(&candidate, &current)? {
                trace!(level, "descent improved, restarting");
                current = candidate;
                level = 0;
            } else {
                level += 1;
            }
        }

        Ok(current)
    }
}
