//! Problem and solution contracts.
//!
//! A [`Problem`] bundles the objective functions of an optimization task,
//! a factory for the initial solution and, optionally, a distance metric
//! between solutions. A [`Solution`] pairs problem-specific data with a
//! lazily computed, cached objective vector.
//!
//! Neither type is ever mutated: neighborhood, shake and search functions
//! derive successors with [`Solution::variant`], which shares the problem
//! reference and starts with an empty objective cache.

use std::fmt;
use std::sync::{Arc, OnceLock};

use rand::RngCore;

use crate::error::{Result, VnsError};

/// A single objective: maps solution data to a real value.
pub type ObjectiveFn<D> = Arc<dyn Fn(&D) -> f64 + Send + Sync>;

/// Factory for the initial solution data of a run.
pub type InitialFn<D> = Arc<dyn Fn(&mut dyn RngCore) -> D + Send + Sync>;

/// Distance between the data of two solutions (e.g. Hamming distance).
pub type DistanceFn<D> = Arc<dyn Fn(&D, &D) -> f64 + Send + Sync>;

/// Immutable descriptor of an optimization problem.
///
/// Objective functions must be deterministic in the solution data.
/// Build one with [`Problem::builder`].
///
/// # Examples
///
/// ```
/// use u_vns::Problem;
///
/// let weights = [2.0, 3.0, 4.0, 5.0];
/// let problem = Problem::builder(|_rng| vec![0u8; 4])
///     .with_objective(move |bits: &Vec<u8>| {
///         bits.iter().zip(weights.iter()).map(|(&b, w)| b as f64 * w).sum()
///     })
///     .with_objective(|bits: &Vec<u8>| bits.iter().map(|&b| b as f64).sum())
///     .build()
///     .unwrap();
///
/// assert_eq!(problem.objective_count(), 2);
/// ```
pub struct Problem<D> {
    objectives: Vec<ObjectiveFn<D>>,
    initial: InitialFn<D>,
    distance: Option<DistanceFn<D>>,
}

impl<D> Problem<D> {
    /// Starts building a problem whose initial solution data comes from `initial`.
    pub fn builder<F>(initial: F) -> ProblemBuilder<D>
    where
        F: Fn(&mut dyn RngCore) -> D + Send + Sync + 'static,
    {
        ProblemBuilder {
            objectives: Vec::new(),
            initial: Arc::new(initial),
            distance: None,
        }
    }

    /// Number of objective functions.
    pub fn objective_count(&self) -> usize {
        self.objectives.len()
    }

    /// Evaluates every objective function on `data`, in order.
    pub fn evaluate(&self, data: &D) -> Vec<f64> {
        self.objectives.iter().map(|f| f(data)).collect()
    }

    /// Distance between two solution data, if the problem defines a metric.
    pub fn distance(&self, a: &D, b: &D) -> Option<f64> {
        self.distance.as_ref().map(|f| f(a, b))
    }

    /// Returns the distance metric, if any.
    pub fn distance_fn(&self) -> Option<&DistanceFn<D>> {
        self.distance.as_ref()
    }

    /// Creates a fresh initial solution bound to this problem.
    pub fn initial_solution(self: &Arc<Self>, rng: &mut dyn RngCore) -> Solution<D> {
        let data = (self.initial)(rng);
        Solution::new(Arc::clone(self), data)
    }
}

impl<D> fmt::Debug for Problem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("objectives", &self.objectives.len())
            .field("has_distance", &self.distance.is_some())
            .finish()
    }
}

/// Builder for [`Problem`].
pub struct ProblemBuilder<D> {
    objectives: Vec<ObjectiveFn<D>>,
    initial: InitialFn<D>,
    distance: Option<DistanceFn<D>>,
}

impl<D> ProblemBuilder<D> {
    /// Appends an objective function.
    pub fn with_objective<F>(mut self, f: F) -> Self
    where
        F: Fn(&D) -> f64 + Send + Sync + 'static,
    {
        self.objectives.push(Arc::new(f));
        self
    }

    /// Sets the distance metric used by skewed acceptance.
    pub fn with_distance<F>(mut self, f: F) -> Self
    where
        F: Fn(&D, &D) -> f64 + Send + Sync + 'static,
    {
        self.distance = Some(Arc::new(f));
        self
    }

    /// Finalizes the problem.
    ///
    /// # Errors
    ///
    /// [`VnsError::NoObjectives`] if no objective function was added.
    pub fn build(self) -> Result<Arc<Problem<D>>> {
        if self.objectives.is_empty() {
            return Err(VnsError::NoObjectives);
        }
        Ok(Arc::new(Problem {
            objectives: self.objectives,
            initial: self.initial,
            distance: self.distance,
        }))
    }
}

struct SolutionInner<D> {
    data: D,
    problem: Arc<Problem<D>>,
    objectives: OnceLock<Vec<f64>>,
}

/// An immutable candidate solution.
///
/// Cloning is cheap and yields a handle to the same value, including its
/// objective cache. Objectives are computed on first access and never
/// recomputed.
pub struct Solution<D> {
    inner: Arc<SolutionInner<D>>,
}

impl<D> Solution<D> {
    /// Wraps `data` as a solution of `problem`.
    pub fn new(problem: Arc<Problem<D>>, data: D) -> Self {
        Self {
            inner: Arc::new(SolutionInner {
                data,
                problem,
                objectives: OnceLock::new(),
            }),
        }
    }

    /// Builds a new solution of the same problem from different data.
    pub fn variant(&self, data: D) -> Self {
        Self::new(Arc::clone(&self.inner.problem), data)
    }

    /// Problem-specific payload.
    pub fn data(&self) -> &D {
        &self.inner.data
    }

    /// The problem this solution belongs to.
    pub fn problem(&self) -> &Arc<Problem<D>> {
        &self.inner.problem
    }

    /// Objective vector, evaluated on first call and cached.
    pub fn objectives(&self) -> &[f64] {
        self.inner
            .objectives
            .get_or_init(|| self.inner.problem.evaluate(&self.inner.data))
    }

    /// Whether the objective vector has already been computed.
    pub fn is_evaluated(&self) -> bool {
        self.inner.objectives.get().is_some()
    }

    /// Returns `true` if both handles refer to the same solution value.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<D> Clone for Solution<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: PartialEq> PartialEq for Solution<D> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.data == other.inner.data
    }
}

impl<D: fmt::Debug> fmt::Debug for Solution<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("data", &self.inner.data)
            .field("objectives", &self.inner.objectives.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_problem(calls: Arc<AtomicUsize>) -> Arc<Problem<Vec<i32>>> {
        Problem::builder(|_rng| vec![1, 2, 3])
            .with_objective(move |d: &Vec<i32>| {
                calls.fetch_add(1, Ordering::SeqCst);
                d.iter().sum::<i32>() as f64
            })
            .with_objective(|d: &Vec<i32>| d.len() as f64)
            .build()
            .unwrap()
    }

    #[test]
    fn test_problem_without_objectives_is_rejected() {
        let result = Problem::builder(|_rng| 0u32).build();
        assert_eq!(result.unwrap_err(), VnsError::NoObjectives);
    }

    #[test]
    fn test_objectives_are_computed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let problem = counting_problem(Arc::clone(&calls));
        let mut rng = StdRng::seed_from_u64(1);

        let solution = problem.initial_solution(&mut rng);
        assert!(!solution.is_evaluated(), "objectives must be lazy");

        assert_eq!(solution.objectives(), &[6.0, 3.0]);
        assert_eq!(solution.objectives(), &[6.0, 3.0]);
        let copy = solution.clone();
        assert_eq!(copy.objectives(), &[6.0, 3.0]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_variant_shares_problem_and_resets_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let problem = counting_problem(Arc::clone(&calls));
        let original = Solution::new(Arc::clone(&problem), vec![1, 1]);
        original.objectives();

        let next = original.variant(vec![5, 5]);
        assert!(Arc::ptr_eq(next.problem(), &problem));
        assert!(!next.is_evaluated());
        assert_eq!(next.objectives(), &[10.0, 2.0]);
        assert_eq!(original.data(), &vec![1, 1], "original must be untouched");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_equality_and_identity() {
        let problem = counting_problem(Arc::new(AtomicUsize::new(0)));
        let a = Solution::new(Arc::clone(&problem), vec![1]);
        let b = a.variant(vec![1]);
        assert_eq!(a, b);
        assert!(!Solution::ptr_eq(&a, &b));
        assert!(Solution::ptr_eq(&a, &a.clone()));
    }

    #[test]
    fn test_distance_is_optional() {
        let problem = counting_problem(Arc::new(AtomicUsize::new(0)));
        assert!(problem.distance(&vec![1], &vec![2]).is_none());

        let problem = Problem::builder(|_rng| vec![0u8; 3])
            .with_objective(|d: &Vec<u8>| d[0] as f64)
            .with_distance(|a: &Vec<u8>, b: &Vec<u8>| {
                a.iter().zip(b).filter(|(x, y)| x != y).count() as f64
            })
            .build()
            .unwrap();
        assert_eq!(problem.distance(&vec![0, 1, 1], &vec![1, 1, 0]), Some(2.0));
    }
}
