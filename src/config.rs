//! VNS configuration.
//!
//! [`VnsConfig`] bundles everything a run needs: the problem, one search
//! function per neighborhood level, the shake function and the acceptance
//! criterion. [`RunBudget`] holds the caller-side stopping policy used by
//! [`VnsRunner`](crate::VnsRunner); the engine itself never stops.

use std::fmt;
use std::sync::Arc;

use crate::acceptance::{AcceptanceCriterion, ParetoAcceptance};
use crate::dominance::Sense;
use crate::error::{Result, VnsError};
use crate::operators::{NeighborhoodOperator, ShakeFunction};
use crate::search::{BestImprovement, NoopSearch, SearchFunction, VariableNeighborhoodDescent};
use crate::types::Problem;

/// Complete configuration of a VNS run.
///
/// Built with [`VnsConfig::builder`]. The acceptance criterion is moved
/// into the [`VnsOptimizer`](crate::VnsOptimizer), which clears it at the
/// start of every run.
pub struct VnsConfig<D> {
    pub(crate) name: String,
    pub(crate) problem: Arc<Problem<D>>,
    pub(crate) search_functions: Vec<Arc<dyn SearchFunction<D>>>,
    pub(crate) shake: Arc<dyn ShakeFunction<D>>,
    pub(crate) acceptance: Box<dyn AcceptanceCriterion<D>>,
    pub(crate) seed: Option<u64>,
}

impl<D: 'static> VnsConfig<D> {
    /// Starts a configuration for `problem`.
    pub fn builder(problem: Arc<Problem<D>>) -> VnsConfigBuilder<D> {
        VnsConfigBuilder {
            name: "vns".to_string(),
            problem,
            search_functions: Vec::new(),
            shake: None,
            acceptance: None,
            seed: None,
        }
    }
}

impl<D> VnsConfig<D> {
    /// Run label, used in log spans.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The problem being optimized.
    pub fn problem(&self) -> &Arc<Problem<D>> {
        &self.problem
    }

    /// Number of neighborhood levels (search functions).
    pub fn levels(&self) -> usize {
        self.search_functions.len()
    }

    /// Random seed, if fixed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl<D> fmt::Debug for VnsConfig<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VnsConfig")
            .field("name", &self.name)
            .field("levels", &self.search_functions.len())
            .field("sense", &self.acceptance.sense())
            .field("seed", &self.seed)
            .finish()
    }
}

/// Builder for [`VnsConfig`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use rand::RngCore;
/// use u_vns::{ParetoAcceptance, Problem, Sense, Solution, VnsConfig};
///
/// let problem = Problem::builder(|_rng| 0i64)
///     .with_objective(|&x: &i64| (x * x) as f64)
///     .build()
///     .unwrap();
///
/// let config = VnsConfig::builder(problem)
///     .with_name("reduced")
///     .with_reduced_levels(3)
///     .with_shake(|s: &Solution<i64>, k: usize, _rng: &mut dyn RngCore| {
///         s.variant(s.data() - k as i64)
///     })
///     .with_acceptance(ParetoAcceptance::new(Sense::Minimize))
///     .with_seed(42)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.levels(), 3);
/// assert_eq!(config.name(), "reduced");
/// ```
pub struct VnsConfigBuilder<D> {
    name: String,
    problem: Arc<Problem<D>>,
    search_functions: Vec<Arc<dyn SearchFunction<D>>>,
    shake: Option<Arc<dyn ShakeFunction<D>>>,
    acceptance: Option<Box<dyn AcceptanceCriterion<D>>>,
    seed: Option<u64>,
}

impl<D: 'static> VnsConfigBuilder<D> {
    /// Sets the run label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends one neighborhood level searched by `search`.
    pub fn with_search_function(mut self, search: Arc<dyn SearchFunction<D>>) -> Self {
        self.search_functions.push(search);
        self
    }

    /// Appends `levels` neighborhood levels that all use `search`.
    ///
    /// Level `i` (0-based) shakes with strength `i + 1`.
    pub fn with_levels(mut self, search: Arc<dyn SearchFunction<D>>, levels: usize) -> Self {
        self.search_functions
            .extend(std::iter::repeat_n(search, levels));
        self
    }

    /// Reduced VNS: `levels` levels without local search.
    pub fn with_reduced_levels(self, levels: usize) -> Self {
        self.with_levels(Arc::new(NoopSearch), levels)
    }

    /// Sets the shake function.
    pub fn with_shake(mut self, shake: impl ShakeFunction<D> + 'static) -> Self {
        self.shake = Some(Arc::new(shake));
        self
    }

    /// Sets the acceptance criterion (default: minimizing Pareto archive).
    pub fn with_acceptance(mut self, acceptance: impl AcceptanceCriterion<D> + 'static) -> Self {
        self.acceptance = Some(Box::new(acceptance));
        self
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates and finalizes the configuration.
    ///
    /// # Errors
    ///
    /// - [`VnsError::NoSearchFunctions`] if no level was added.
    /// - [`VnsError::Config`] if no shake function was set.
    pub fn build(self) -> Result<VnsConfig<D>> {
        if self.search_functions.is_empty() {
            return Err(VnsError::NoSearchFunctions);
        }
        let shake = self
            .shake
            .ok_or_else(|| VnsError::Config("a shake function is required".into()))?;
        let acceptance = self
            .acceptance
            .unwrap_or_else(|| Box::new(ParetoAcceptance::new(Sense::Minimize)));

        Ok(VnsConfig {
            name: self.name,
            problem: self.problem,
            search_functions: self.search_functions,
            shake,
            acceptance,
            seed: self.seed,
        })
    }
}

impl<D: Send + Sync + 'static> VnsConfigBuilder<D> {
    /// Basic VNS: `levels` levels of best-improvement search over `operator`.
    pub fn with_basic_levels(self, operator: Arc<dyn NeighborhoodOperator<D>>, levels: usize) -> Self {
        self.with_levels(Arc::new(BestImprovement::new(operator)), levels)
    }

    /// General VNS: `levels` levels, each a variable neighborhood descent
    /// over best-improvement searches for every operator in `operators`.
    ///
    /// # Errors
    ///
    /// [`VnsError::NoSearchFunctions`] if `operators` is empty.
    pub fn with_general_levels(
        self,
        operators: Vec<Arc<dyn NeighborhoodOperator<D>>>,
        levels: usize,
    ) -> Result<Self> {
        let searches = operators
            .into_iter()
            .map(|op| Arc::new(BestImprovement::new(op)) as Arc<dyn SearchFunction<D>>)
            .collect();
        let descent = VariableNeighborhoodDescent::new(searches)?;
        Ok(self.with_levels(Arc::new(descent), levels))
    }
}

/// Stopping policy applied around the endless VNS loop.
///
/// # Examples
///
/// ```
/// use u_vns::RunBudget;
///
/// let budget = RunBudget::default()
///     .with_max_steps(1000)
///     .with_max_no_improve(100);
/// assert_eq!(budget.max_steps, 1000);
/// assert_eq!(budget.max_no_improve, 100);
/// assert!(budget.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunBudget {
    /// Maximum number of shake/search/accept steps (0 = unlimited).
    pub max_steps: usize,
    /// Maximum consecutive steps without archive change (0 = unlimited).
    pub max_no_improve: usize,
    /// Optional wall-clock limit in milliseconds, checked between steps.
    pub time_limit_ms: Option<u64>,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_no_improve: 1_000,
            time_limit_ms: None,
        }
    }
}

impl RunBudget {
    /// Sets the maximum number of steps.
    pub fn with_max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    /// Sets the maximum number of consecutive non-improving steps.
    pub fn with_max_no_improve(mut self, n: usize) -> Self {
        self.max_no_improve = n;
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Checks that at least one stopping condition is active.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 && self.max_no_improve == 0 && self.time_limit_ms.is_none() {
            return Err(VnsError::Config(
                "run budget needs max_steps, max_no_improve or a time limit".into(),
            ));
        }
        Ok(())
    }
}
