//! Pareto dominance over objective vectors.
//!
//! All predicates treat coordinates that differ by less than
//! [`OBJECTIVE_EPSILON`] as equal, so two independent evaluations of the
//! same data never dominate each other because of floating round-off.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - Hansen, P. & Mladenović, N. (2001), "Variable neighborhood search:
//!   Principles and applications", *European Journal of Operational Research*
//!   130(3), 449-467 (skewed VNS)

use crate::error::{Result, VnsError};

/// Absolute tolerance below which two objective values are considered equal.
pub const OBJECTIVE_EPSILON: f64 = 1e-6;

/// Optimization direction shared by every objective of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    /// Lower values are better ("take smaller").
    #[default]
    Minimize,
    /// Higher values are better ("take bigger").
    Maximize,
}

impl Sense {
    /// How much better `new` is than `current` in this sense.
    ///
    /// Positive when `new` is better, negative when it is worse.
    #[inline]
    pub fn gain(self, new: f64, current: f64) -> f64 {
        match self {
            Sense::Minimize => current - new,
            Sense::Maximize => new - current,
        }
    }
}

/// Returns `true` if `a` Pareto-dominates `b` in the given sense.
///
/// `a` dominates `b` when, ignoring coordinates equal within
/// [`OBJECTIVE_EPSILON`], `a` is not worse anywhere and strictly better
/// somewhere. With a single objective this reduces to a strict `<`
/// (or `>` when maximizing).
///
/// # Errors
///
/// [`VnsError::ObjectiveLengthMismatch`] if the vectors differ in length.
///
/// # Example
///
/// ```
/// use u_vns::{dominates, Sense};
///
/// assert!(dominates(&[1.0, 2.0], &[1.0, 3.0], Sense::Minimize).unwrap());
/// assert!(!dominates(&[1.0, 4.0], &[2.0, 3.0], Sense::Minimize).unwrap());
/// assert!(dominates(&[25.0, 12.0], &[-14.0, -30.0], Sense::Maximize).unwrap());
/// ```
pub fn dominates(a: &[f64], b: &[f64], sense: Sense) -> Result<bool> {
    dominates_with_slack(a, b, sense, 0.0)
}

/// Dominance test in which `a` must beat `b` by more than `slack`.
///
/// Every coordinate where `a` is better consumes its advantage from the
/// slack budget; while budget remains, the advantage is forgiven. `a`
/// dominates only if it is never worse and at least one advantage
/// exhausts the budget. A slack of `0.0` is plain Pareto dominance.
///
/// Skewed acceptance uses this with `slack = alpha * distance` so that
/// distant solutions need a larger margin to be considered dominated.
///
/// # Errors
///
/// [`VnsError::ObjectiveLengthMismatch`] if the vectors differ in length.
pub fn dominates_with_slack(a: &[f64], b: &[f64], sense: Sense, slack: f64) -> Result<bool> {
    check_lengths(a, b)?;

    let mut budget = slack;
    let mut strictly_better = false;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        let gain = sense.gain(va, vb);
        // NaN coordinates are incomparable.
        if gain.is_nan() || gain.abs() < OBJECTIVE_EPSILON {
            continue;
        }
        if gain < 0.0 {
            return Ok(false);
        }
        budget -= gain;
        if budget > 0.0 {
            continue;
        }
        strictly_better = true;
    }

    Ok(strictly_better)
}

/// Returns `true` if every coordinate of `a` and `b` is within
/// [`OBJECTIVE_EPSILON`].
///
/// # Errors
///
/// [`VnsError::ObjectiveLengthMismatch`] if the vectors differ in length.
pub fn objectives_equal(a: &[f64], b: &[f64]) -> Result<bool> {
    check_lengths(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .all(|(&va, &vb)| (va - vb).abs() < OBJECTIVE_EPSILON))
}

/// Indices of the vectors not dominated by any other vector in `objectives`.
///
/// Objective-equal duplicates are all kept. Useful for merging the
/// archives of several runs into one front.
///
/// # Errors
///
/// [`VnsError::ObjectiveLengthMismatch`] if the vectors differ in length.
///
/// # Example
///
/// ```
/// use u_vns::{non_dominated, Sense};
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![4.0, 4.0], // dominated by [3, 3]
/// ];
/// assert_eq!(non_dominated(&objectives, Sense::Minimize).unwrap(), vec![0, 1, 2]);
/// ```
pub fn non_dominated(objectives: &[Vec<f64>], sense: Sense) -> Result<Vec<usize>> {
    let mut front = Vec::new();
    'outer: for (i, candidate) in objectives.iter().enumerate() {
        for (j, other) in objectives.iter().enumerate() {
            if i != j && dominates(other, candidate, sense)? {
                continue 'outer;
            }
        }
        front.push(i);
    }
    Ok(front)
}

fn check_lengths(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(VnsError::ObjectiveLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}
