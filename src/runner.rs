//! Variable Neighborhood Search execution engine.
//!
//! # Algorithm
//!
//! 1. Clear the acceptance criterion and seed it with the initial solution
//! 2. Draw the current solution x from the archive (and buffer); set k = 0
//! 3. Repeat forever:
//!    a. **Shaking**: x' = shake(x, k + 1)
//!    b. **Local search**: x'' = search_k(x')
//!    c. **Move or not**: if x'' changes the archive, draw a new x from the
//!    archive and set k = 0; otherwise k = k + 1
//!    d. If k reaches the number of levels, one full pass is done: k = 0
//!
//! [`VnsOptimizer`] exposes this loop one step at a time through [`Run`];
//! termination is up to the caller. [`VnsRunner`] is a ready-made caller
//! that stops on a [`RunBudget`].
//!
//! # Reference
//!
//! Mladenović, N. & Hansen, P. (1997). "Variable neighborhood search",
//! *Computers & Operations Research* 24(11), 1097-1100.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, info_span};

use crate::acceptance::{AcceptanceCriterion, Verdict};
use crate::config::{RunBudget, VnsConfig};
use crate::error::Result;
use crate::search::SearchContext;
use crate::types::Solution;

/// Drives VNS runs for one configuration.
///
/// The optimizer owns the acceptance criterion; the loop state (current
/// solution and level) lives in the [`Run`] borrowed from it, so a new run
/// always starts from a clean archive.
pub struct VnsOptimizer<D> {
    config: VnsConfig<D>,
    rng: StdRng,
}

impl<D> VnsOptimizer<D> {
    /// Creates an optimizer; the RNG is seeded from the configuration.
    pub fn new(config: VnsConfig<D>) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &VnsConfig<D> {
        &self.config
    }

    /// The acceptance criterion holding the archive of the latest run.
    pub fn acceptance(&self) -> &dyn AcceptanceCriterion<D> {
        self.config.acceptance.as_ref()
    }

    /// Archive of the latest run.
    pub fn solutions(&self) -> &[Solution<D>] {
        self.config.acceptance.solutions()
    }

    /// Starts a run from the problem's initial solution.
    ///
    /// # Errors
    ///
    /// Propagates errors of the acceptance criterion.
    pub fn start(&mut self) -> Result<Run<'_, D>> {
        let initial = self.config.problem.initial_solution(&mut self.rng);
        self.start_from(initial)
    }

    /// Starts a run from a caller-supplied initial solution.
    ///
    /// # Errors
    ///
    /// Propagates errors of the acceptance criterion.
    pub fn start_from(&mut self, initial: Solution<D>) -> Result<Run<'_, D>> {
        let acceptance = self.config.acceptance.as_mut();
        acceptance.clear();
        acceptance.accept(initial)?;
        let current = acceptance.current_solution(&mut self.rng)?;

        debug!(name = %self.config.name, levels = self.config.levels(), "run started");
        Ok(Run {
            optimizer: self,
            current,
            level: 0,
            steps: 0,
            failed: false,
        })
    }
}

impl<D> std::fmt::Debug for VnsOptimizer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VnsOptimizer")
            .field("config", &self.config)
            .finish()
    }
}

/// Result of one shake/search/accept step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// 0-based neighborhood level the step used.
    pub level: usize,
    /// What the acceptance criterion did with the refined solution.
    pub verdict: Verdict,
    /// Whether this step finished a full pass over all levels.
    pub cycle_completed: bool,
}

impl Step {
    /// Whether the archive changed during this step.
    pub fn improved(&self) -> bool {
        self.verdict.changed_archive()
    }
}

/// An in-progress VNS run.
///
/// The run never ends on its own: as an iterator it yields one
/// `Result<Step>` per step indefinitely, and stops only after an error.
pub struct Run<'a, D> {
    optimizer: &'a mut VnsOptimizer<D>,
    current: Solution<D>,
    level: usize,
    steps: usize,
    failed: bool,
}

impl<D> Run<'_, D> {
    /// Performs one shake, search and acceptance step.
    ///
    /// # Errors
    ///
    /// Propagates errors from search functions and the acceptance criterion.
    /// After an error the archive contents are unspecified.
    pub fn step(&mut self) -> Result<Step> {
        let outcome = self.advance();
        if outcome.is_err() {
            self.failed = true;
        }
        outcome
    }

    fn advance(&mut self) -> Result<Step> {
        let optimizer = &mut *self.optimizer;
        let config = &mut optimizer.config;
        let rng = &mut optimizer.rng;
        let level = self.level;

        let shaken = config.shake.shake(&self.current, level + 1, rng);
        let refined = {
            let mut ctx = SearchContext::new(config.acceptance.as_ref(), rng);
            config.search_functions[level].search(shaken, &mut ctx)?
        };
        let verdict = config.acceptance.accept(refined)?;

        self.steps += 1;
        let mut cycle_completed = false;
        if verdict.changed_archive() {
            self.current = config.acceptance.current_solution(rng)?;
            self.level = 0;
        } else {
            self.level += 1;
            if self.level == config.search_functions.len() {
                self.level = 0;
                cycle_completed = true;
            }
        }

        debug!(
            step = self.steps,
            level,
            ?verdict,
            archive = config.acceptance.solutions().len(),
            "vns step"
        );

        Ok(Step {
            level,
            verdict,
            cycle_completed,
        })
    }

    /// Runs steps until a full pass over all levels completes.
    ///
    /// Returns whether any step of the pass changed the archive.
    pub fn next_cycle(&mut self) -> Result<bool> {
        let mut improved = false;
        loop {
            let step = self.step()?;
            improved |= step.improved();
            if step.cycle_completed {
                return Ok(improved);
            }
        }
    }

    /// Solution currently being shaken.
    pub fn current(&self) -> &Solution<D> {
        &self.current
    }

    /// Neighborhood level of the next step (0-based).
    pub fn level(&self) -> usize {
        self.level
    }

    /// Steps performed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The acceptance criterion of this run.
    pub fn acceptance(&self) -> &dyn AcceptanceCriterion<D> {
        self.optimizer.acceptance()
    }

    /// Current archive.
    pub fn solutions(&self) -> &[Solution<D>] {
        self.optimizer.solutions()
    }
}

impl<D> Iterator for Run<'_, D> {
    type Item = Result<Step>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        Some(self.step())
    }
}

/// Why a budgeted run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// `max_steps` reached.
    MaxSteps,
    /// `max_no_improve` consecutive steps without archive change.
    NoImprovement,
    /// Wall-clock limit reached.
    TimeLimit,
    /// Cancelled through the cancellation flag.
    Cancelled,
}

/// Counters of a budgeted run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStats {
    /// Steps executed.
    pub steps: usize,
    /// Full passes over all levels.
    pub cycles: usize,
    /// Steps that changed the archive.
    pub improvements: usize,
    /// Steps that only buffered their candidate.
    pub buffered: usize,
    /// Step index (1-based) of the last archive change, 0 if none.
    pub last_improvement_step: usize,
    /// Archive size after each improving step.
    pub archive_history: Vec<usize>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Result of a budgeted VNS run.
#[derive(Debug, Clone)]
pub struct VnsResult<D> {
    /// Final archive.
    pub solutions: Vec<Solution<D>>,
    /// Run counters.
    pub stats: RunStats,
    /// Why the run stopped.
    pub stop_reason: StopReason,
}

/// Runs an optimizer under a [`RunBudget`].
pub struct VnsRunner;

impl VnsRunner {
    /// Runs a fresh VNS run until the budget is exhausted.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::{Rng, RngCore};
    /// use u_vns::{
    ///     ParetoAcceptance, Problem, RunBudget, Sense, Solution, VnsConfig, VnsOptimizer,
    ///     VnsRunner,
    /// };
    ///
    /// // Minimize (x - 10)^2 with random jumps of width k.
    /// let problem = Problem::builder(|_rng| 0i64)
    ///     .with_objective(|&x: &i64| ((x - 10) * (x - 10)) as f64)
    ///     .build()
    ///     .unwrap();
    ///
    /// let config = VnsConfig::builder(problem)
    ///     .with_reduced_levels(3)
    ///     .with_shake(|s: &Solution<i64>, k: usize, rng: &mut dyn RngCore| {
    ///         let k = k as i64;
    ///         s.variant(s.data() + rng.random_range(-k..=k))
    ///     })
    ///     .with_acceptance(ParetoAcceptance::new(Sense::Minimize))
    ///     .with_seed(42)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut optimizer = VnsOptimizer::new(config);
    /// let budget = RunBudget::default().with_max_steps(5_000).with_max_no_improve(500);
    /// let result = VnsRunner::run(&mut optimizer, &budget).unwrap();
    ///
    /// assert_eq!(result.solutions.len(), 1);
    /// assert_eq!(*result.solutions[0].data(), 10);
    /// ```
    ///
    /// # Errors
    ///
    /// [`VnsError::Config`](crate::VnsError::Config) for a budget without
    /// stopping condition, plus any error raised by the run.
    pub fn run<D>(optimizer: &mut VnsOptimizer<D>, budget: &RunBudget) -> Result<VnsResult<D>> {
        Self::run_with_cancel(optimizer, budget, None)
    }

    /// Runs with an optional cancellation flag, checked between steps.
    ///
    /// # Errors
    ///
    /// Same as [`VnsRunner::run`].
    pub fn run_with_cancel<D>(
        optimizer: &mut VnsOptimizer<D>,
        budget: &RunBudget,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<VnsResult<D>> {
        budget.validate()?;

        let span = info_span!("vns_run", name = %optimizer.config().name());
        let _guard = span.enter();

        let start = Instant::now();
        let time_limit = budget.time_limit_ms.map(Duration::from_millis);
        let mut stats = RunStats {
            steps: 0,
            cycles: 0,
            improvements: 0,
            buffered: 0,
            last_improvement_step: 0,
            archive_history: Vec::new(),
            elapsed: Duration::ZERO,
        };
        let mut no_improve = 0usize;

        let mut run = optimizer.start()?;
        let stop_reason = loop {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    break StopReason::Cancelled;
                }
            }
            if time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                break StopReason::TimeLimit;
            }
            if budget.max_steps > 0 && stats.steps >= budget.max_steps {
                break StopReason::MaxSteps;
            }
            if budget.max_no_improve > 0 && no_improve >= budget.max_no_improve {
                break StopReason::NoImprovement;
            }

            let step = run.step()?;
            stats.steps += 1;
            if step.cycle_completed {
                stats.cycles += 1;
            }
            match step.verdict {
                Verdict::Archived => {
                    no_improve = 0;
                    stats.improvements += 1;
                    stats.last_improvement_step = stats.steps;
                    let archive = run.solutions().len();
                    stats.archive_history.push(archive);
                    info!(step = stats.steps, archive, "improved");
                }
                Verdict::Buffered => {
                    no_improve += 1;
                    stats.buffered += 1;
                }
                Verdict::Rejected => no_improve += 1,
            }
        };

        let solutions = run.solutions().to_vec();
        stats.elapsed = start.elapsed();
        info!(
            reason = ?stop_reason,
            steps = stats.steps,
            archive = solutions.len(),
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "run finished"
        );

        Ok(VnsResult {
            solutions,
            stats,
            stop_reason,
        })
    }
}
