//! Error types for the VNS engine.

use thiserror::Error;

/// Errors raised while configuring or driving a VNS run.
///
/// Configuration errors are reported at construction time. Once a
/// [`Run`](crate::Run) has returned an error the archive contents are
/// unspecified and the run should be discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VnsError {
    /// A problem was built without any objective function.
    #[error("problem must define at least one objective function")]
    NoObjectives,

    /// A configuration (or composite search) has no search functions.
    #[error("at least one search function is required")]
    NoSearchFunctions,

    /// Two objective vectors of different length were compared.
    #[error("objective vectors differ in length: {left} vs {right}")]
    ObjectiveLengthMismatch {
        /// Length of the left-hand vector.
        left: usize,
        /// Length of the right-hand vector.
        right: usize,
    },

    /// A resumption solution was requested before the archive was seeded.
    #[error("acceptance archive is empty; seed it with an initial solution first")]
    EmptyArchive,

    /// Skewed acceptance was requested for a problem without a distance metric.
    #[error("problem defines no distance metric")]
    MissingDistance,

    /// Any other invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VnsError>;
