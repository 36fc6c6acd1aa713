//! Neighborhood operators and shake functions.
//!
//! A [`NeighborhoodOperator`] enumerates every solution reachable from a
//! given one by a single structural move (flip one bit, reverse one tour
//! segment, ...). A [`ShakeFunction`] draws one random solution from a
//! neighborhood of strength `k`, used to jump away from the current local
//! optimum before local search.

use rand::{Rng, RngCore};

use crate::types::Solution;

/// Lazy sequence of neighbors produced by a [`NeighborhoodOperator`].
pub type Neighbors<'a, D> = Box<dyn Iterator<Item = Solution<D>> + 'a>;

/// Enumerates the neighbors of a solution.
///
/// Every call must return a fresh, finite sequence; operators keep no
/// iteration state between calls. The random generator may be used to
/// randomize the enumeration order.
///
/// # Examples
///
/// ```
/// use rand::RngCore;
/// use rand::seq::SliceRandom;
/// use u_vns::{NeighborhoodOperator, Neighbors, Solution};
///
/// /// Flips one bit at a time, in random order.
/// struct FlipOne;
///
/// impl NeighborhoodOperator<Vec<u8>> for FlipOne {
///     fn neighbors<'a>(
///         &'a self,
///         solution: &'a Solution<Vec<u8>>,
///         rng: &'a mut dyn RngCore,
///     ) -> Neighbors<'a, Vec<u8>> {
///         let mut order: Vec<usize> = (0..solution.data().len()).collect();
///         order.shuffle(rng);
///         Box::new(order.into_iter().map(move |i| {
///             let mut bits = solution.data().clone();
///             bits[i] ^= 1;
///             solution.variant(bits)
///         }))
///     }
/// }
/// ```
pub trait NeighborhoodOperator<D>: Send + Sync {
    /// Returns the neighbors of `solution`.
    fn neighbors<'a>(
        &'a self,
        solution: &'a Solution<D>,
        rng: &'a mut dyn RngCore,
    ) -> Neighbors<'a, D>;
}

/// Produces one random perturbation of a solution.
///
/// `k` is the 1-based strength of the perturbation and grows with the
/// neighborhood level. Implementations must not fail for large `k` or for
/// solutions where no move applies; they return the best effort (possibly
/// the unchanged input data) instead.
///
/// Any `Fn(&Solution<D>, usize, &mut dyn RngCore) -> Solution<D>` closure
/// is a shake function.
pub trait ShakeFunction<D>: Send + Sync {
    /// Shakes `solution` with strength `k`.
    fn shake(&self, solution: &Solution<D>, k: usize, rng: &mut dyn RngCore) -> Solution<D>;
}

impl<D, F> ShakeFunction<D> for F
where
    F: Fn(&Solution<D>, usize, &mut dyn RngCore) -> Solution<D> + Send + Sync,
{
    fn shake(&self, solution: &Solution<D>, k: usize, rng: &mut dyn RngCore) -> Solution<D> {
        self(solution, k, rng)
    }
}

/// Shake function that applies a single random move `k` times.
///
/// The move returns `None` when it cannot be applied to the data it is
/// given (e.g. "add an item" on a full selection); that repetition is then
/// skipped and the data carried over unchanged.
///
/// # Examples
///
/// ```
/// use rand::{Rng, RngCore, SeedableRng};
/// use rand::rngs::StdRng;
/// use u_vns::{Problem, RepeatedMove, ShakeFunction};
///
/// let problem = Problem::builder(|_rng| vec![0u8; 8])
///     .with_objective(|bits: &Vec<u8>| bits.iter().map(|&b| b as f64).sum())
///     .build()
///     .unwrap();
///
/// // Select one unselected item.
/// let add = RepeatedMove::new(|bits: &Vec<u8>, rng: &mut dyn RngCore| {
///     let free: Vec<usize> = (0..bits.len()).filter(|&i| bits[i] == 0).collect();
///     if free.is_empty() {
///         return None;
///     }
///     let mut next = bits.clone();
///     next[free[rng.random_range(0..free.len())]] = 1;
///     Some(next)
/// });
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let start = problem.initial_solution(&mut rng);
/// let shaken = add.shake(&start, 3, &mut rng);
/// assert_eq!(shaken.objectives(), &[3.0]);
///
/// // Asking for more moves than possible saturates instead of failing.
/// let full = add.shake(&start, 100, &mut rng);
/// assert_eq!(full.objectives(), &[8.0]);
/// ```
pub struct RepeatedMove<F> {
    step: F,
}

impl<F> RepeatedMove<F> {
    /// Wraps a single random move.
    pub fn new(step: F) -> Self {
        Self { step }
    }
}

impl<D, F> ShakeFunction<D> for RepeatedMove<F>
where
    D: Clone,
    F: Fn(&D, &mut dyn RngCore) -> Option<D> + Send + Sync,
{
    fn shake(&self, solution: &Solution<D>, k: usize, rng: &mut dyn RngCore) -> Solution<D> {
        let mut data = solution.data().clone();
        for _ in 0..k {
            if let Some(next) = (self.step)(&data, rng) {
                data = next;
            }
        }
        solution.variant(data)
    }
}

/// Picks a uniformly random index below `len`, or `None` if `len == 0`.
///
/// Convenience for move implementations choosing among candidate items.
pub fn random_index(rng: &mut dyn RngCore, len: usize) -> Option<usize> {
    (len > 0).then(|| rng.random_range(0..len))
}
