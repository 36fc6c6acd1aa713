//! Acceptance criteria and the Pareto archive.
//!
//! An [`AcceptanceCriterion`] owns the state of a run: an archive of
//! mutually non-dominated solutions and, optionally, a bounded FIFO buffer
//! of dominated solutions kept for diversification. It decides whether a
//! candidate enters the archive and supplies the solution the optimizer
//! shakes next.
//!
//! - [`ParetoAcceptance`]: plain Pareto archive ("take smaller" /
//!   "take bigger" depending on [`Sense`]).
//! - [`SkewedAcceptance`]: additionally buffers rejected candidates that no
//!   archive member dominates by more than `alpha * distance` (Skewed VNS).

use std::collections::VecDeque;
use std::fmt;

use rand::{Rng, RngCore};
use tracing::{debug, trace};

use crate::dominance::{dominates, dominates_with_slack, objectives_equal, Sense};
use crate::error::{Result, VnsError};
use crate::types::{DistanceFn, Problem, Solution};

/// Outcome of offering a candidate to an acceptance criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// The candidate entered the archive.
    Archived,
    /// The candidate was kept in the buffer only.
    Buffered,
    /// The candidate was discarded.
    Rejected,
}

impl Verdict {
    /// Whether the archive changed. Only this resets the neighborhood level.
    pub fn changed_archive(self) -> bool {
        matches!(self, Verdict::Archived)
    }
}

/// Decides which solutions a run keeps.
pub trait AcceptanceCriterion<D> {
    /// Direction of optimization.
    fn sense(&self) -> Sense;

    /// Whether `a` dominates `b` in this criterion's sense.
    fn dominates(&self, a: &Solution<D>, b: &Solution<D>) -> Result<bool> {
        dominates(a.objectives(), b.objectives(), self.sense())
    }

    /// Offers `candidate` to the archive.
    fn accept(&mut self, candidate: Solution<D>) -> Result<Verdict>;

    /// Draws a solution to resume shaking from.
    ///
    /// # Errors
    ///
    /// [`VnsError::EmptyArchive`] if nothing has been accepted yet.
    fn current_solution(&self, rng: &mut dyn RngCore) -> Result<Solution<D>>;

    /// The archive: every accepted, mutually non-dominated solution.
    fn solutions(&self) -> &[Solution<D>];

    /// Number of buffered (dominated but retained) solutions.
    fn buffered(&self) -> usize {
        0
    }

    /// Empties archive and buffer.
    fn clear(&mut self);
}

/// Fixed-capacity FIFO that evicts its oldest entry on overflow.
///
/// A capacity of zero stores nothing.
#[derive(Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `item`, returning the evicted oldest item if full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Item at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("len", &self.items.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Pareto archive with an optional buffer of displaced solutions.
///
/// On [`accept`](AcceptanceCriterion::accept):
///
/// 1. a candidate dominated by, or objective-equal to, an archive member
///    is rejected;
/// 2. otherwise every member the candidate dominates moves to the buffer
///    (or is dropped without one) and the candidate joins the archive.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_vns::{AcceptanceCriterion, ParetoAcceptance, Problem, Sense, Solution, Verdict};
///
/// let problem = Problem::builder(|_rng| vec![0.0, 0.0])
///     .with_objective(|v: &Vec<f64>| v[0])
///     .with_objective(|v: &Vec<f64>| v[1])
///     .build()
///     .unwrap();
///
/// let mut archive = ParetoAcceptance::new(Sense::Minimize).with_buffer(4);
/// let a = Solution::new(Arc::clone(&problem), vec![1.0, 5.0]);
/// let b = a.variant(vec![5.0, 1.0]);
/// let c = a.variant(vec![0.5, 0.5]);
///
/// assert_eq!(archive.accept(a).unwrap(), Verdict::Archived);
/// assert_eq!(archive.accept(b).unwrap(), Verdict::Archived);
/// assert_eq!(archive.solutions().len(), 2);
///
/// // c dominates both: they move to the buffer.
/// assert_eq!(archive.accept(c).unwrap(), Verdict::Archived);
/// assert_eq!(archive.solutions().len(), 1);
/// assert_eq!(archive.buffered(), 2);
/// ```
pub struct ParetoAcceptance<D> {
    sense: Sense,
    archive: Vec<Solution<D>>,
    buffer: BoundedBuffer<Solution<D>>,
}

impl<D> ParetoAcceptance<D> {
    /// Creates an empty archive without buffer.
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            archive: Vec::new(),
            buffer: BoundedBuffer::new(0),
        }
    }

    /// Keeps up to `capacity` displaced solutions for resumption.
    pub fn with_buffer(mut self, capacity: usize) -> Self {
        self.buffer = BoundedBuffer::new(capacity);
        self
    }

    /// The buffer of displaced solutions.
    pub fn buffer(&self) -> &BoundedBuffer<Solution<D>> {
        &self.buffer
    }

    /// Stores a dominated solution in the buffer, evicting the oldest.
    fn push_buffer(&mut self, solution: Solution<D>) {
        if self.buffer.push(solution).is_some() && self.buffer.capacity() > 0 {
            trace!(capacity = self.buffer.capacity(), "buffer full, evicted oldest");
        }
    }

    fn insert(&mut self, candidate: Solution<D>) -> Result<Verdict> {
        for member in &self.archive {
            if dominates(member.objectives(), candidate.objectives(), self.sense)?
                || objectives_equal(member.objectives(), candidate.objectives())?
            {
                trace!(objectives = ?candidate.objectives(), "candidate rejected");
                return Ok(Verdict::Rejected);
            }
        }

        let previous = std::mem::take(&mut self.archive);
        let mut kept = Vec::with_capacity(previous.len() + 1);
        let mut displaced = 0usize;
        for member in previous {
            if dominates(candidate.objectives(), member.objectives(), self.sense)? {
                displaced += 1;
                self.push_buffer(member);
            } else {
                kept.push(member);
            }
        }
        kept.push(candidate);
        self.archive = kept;

        debug!(
            archive = self.archive.len(),
            displaced,
            buffered = self.buffer.len(),
            "archive updated"
        );
        Ok(Verdict::Archived)
    }
}

impl<D> AcceptanceCriterion<D> for ParetoAcceptance<D> {
    fn sense(&self) -> Sense {
        self.sense
    }

    fn accept(&mut self, candidate: Solution<D>) -> Result<Verdict> {
        self.insert(candidate)
    }

    fn current_solution(&self, rng: &mut dyn RngCore) -> Result<Solution<D>> {
        let size = self.archive.len() + self.buffer.len();
        if size == 0 {
            return Err(VnsError::EmptyArchive);
        }
        let index = rng.random_range(0..size);
        let chosen = match self.archive.get(index) {
            Some(solution) => solution,
            None => self
                .buffer
                .get(index - self.archive.len())
                .ok_or(VnsError::EmptyArchive)?,
        };
        Ok(chosen.clone())
    }

    fn solutions(&self) -> &[Solution<D>] {
        &self.archive
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn clear(&mut self) {
        self.archive.clear();
        self.buffer.clear();
    }
}

impl<D> fmt::Debug for ParetoAcceptance<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParetoAcceptance")
            .field("sense", &self.sense)
            .field("archive", &self.archive.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// Pareto archive that also buffers "skewed-acceptable" candidates.
///
/// A candidate the archive rejects is still kept in the buffer when no
/// archive member dominates it by more than `alpha * distance(candidate,
/// member)`. Far-away solutions thus survive for later shaking even if
/// slightly worse. Candidates objective-equal to a member are never
/// buffered. Buffered candidates do not change the archive and do not
/// count as improvements for the optimizer.
pub struct SkewedAcceptance<D> {
    base: ParetoAcceptance<D>,
    alpha: f64,
    distance: DistanceFn<D>,
}

impl<D> SkewedAcceptance<D> {
    /// Creates a skewed criterion with an explicit distance metric.
    ///
    /// # Errors
    ///
    /// [`VnsError::Config`] if `alpha` is negative or not finite, or if
    /// `buffer_capacity` is zero.
    pub fn new(
        sense: Sense,
        alpha: f64,
        buffer_capacity: usize,
        distance: DistanceFn<D>,
    ) -> Result<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(VnsError::Config(format!(
                "skewed alpha must be finite and non-negative, got {alpha}"
            )));
        }
        if buffer_capacity == 0 {
            return Err(VnsError::Config(
                "skewed acceptance needs a buffer capacity of at least 1".into(),
            ));
        }
        Ok(Self {
            base: ParetoAcceptance::new(sense).with_buffer(buffer_capacity),
            alpha,
            distance,
        })
    }

    /// Creates a skewed criterion using the problem's distance metric.
    ///
    /// # Errors
    ///
    /// [`VnsError::MissingDistance`] if the problem has no metric, plus the
    /// errors of [`SkewedAcceptance::new`].
    pub fn from_problem(
        problem: &Problem<D>,
        sense: Sense,
        alpha: f64,
        buffer_capacity: usize,
    ) -> Result<Self> {
        let distance = problem.distance_fn().cloned().ok_or(VnsError::MissingDistance)?;
        Self::new(sense, alpha, buffer_capacity, distance)
    }

    /// Distance discount factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The buffer of displaced and skewed-accepted solutions.
    pub fn buffer(&self) -> &BoundedBuffer<Solution<D>> {
        self.base.buffer()
    }

    fn skewed_acceptable(&self, candidate: &Solution<D>) -> Result<bool> {
        for member in self.base.solutions() {
            if Solution::ptr_eq(member, candidate)
                || objectives_equal(member.objectives(), candidate.objectives())?
            {
                return Ok(false);
            }
            let slack = self.alpha * (self.distance)(candidate.data(), member.data());
            if dominates_with_slack(
                member.objectives(),
                candidate.objectives(),
                self.base.sense,
                slack,
            )? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<D> AcceptanceCriterion<D> for SkewedAcceptance<D> {
    fn sense(&self) -> Sense {
        self.base.sense
    }

    fn accept(&mut self, candidate: Solution<D>) -> Result<Verdict> {
        if self.base.insert(candidate.clone())?.changed_archive() {
            return Ok(Verdict::Archived);
        }

        if self.skewed_acceptable(&candidate)? {
            debug!(objectives = ?candidate.objectives(), "skewed candidate buffered");
            self.base.push_buffer(candidate);
            return Ok(Verdict::Buffered);
        }

        Ok(Verdict::Rejected)
    }

    fn current_solution(&self, rng: &mut dyn RngCore) -> Result<Solution<D>> {
        self.base.current_solution(rng)
    }

    fn solutions(&self) -> &[Solution<D>] {
        self.base.solutions()
    }

    fn buffered(&self) -> usize {
        self.base.buffered()
    }

    fn clear(&mut self) {
        self.base.clear();
    }
}

impl<D> fmt::Debug for SkewedAcceptance<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkewedAcceptance")
            .field("alpha", &self.alpha)
            .field("base", &self.base)
            .finish()
    }
}
