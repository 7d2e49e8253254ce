//! Error types for exact inference.

use thiserror::Error;

/// Main error type for inference runs.
///
/// Every variant is fatal for the run that produced it. A query whose evidence has zero
/// probability is not an error: it is reported through
/// [`Diagnostic::ZeroEvidenceProbability`](crate::aggregate::Diagnostic) on that query's result.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The stable-model solver failed while grounding or solving a total choice.
    #[error("Solver failure: {0}")]
    SolverFailure(String),

    /// A probabilistic fact carries a probability outside [0, 1].
    #[error("Invalid probability {probability} for probabilistic fact {atom}")]
    InvalidProbability { atom: String, probability: f64 },

    /// The program is malformed (duplicate probabilistic facts, reserved atoms, ...).
    #[error("Invalid program: {0}")]
    InvalidProgram(String),

    /// The selected solver cannot consume this program.
    #[error("Unsupported program: {0}")]
    UnsupportedProgram(String),

    /// The total-choice space is larger than the configured limit.
    #[error("Too many probabilistic facts: {count} (limit {limit})")]
    TooManyFacts { count: usize, limit: usize },

    /// More credal facts than extreme points can be tracked for.
    #[error("Too many credal facts: {count} (limit {limit})")]
    TooManyCredalFacts { count: usize, limit: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Solver output could not be decoded.
    #[error("Solver output parse error: {0}")]
    OutputParse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
