//! # pasp-core: Exact inference for probabilistic answer-set programs
//!
//! Computes lower and upper conditional probabilities `ℙ(Q | E)` under the credal
//! semantics, with the stable-model solver treated as a black box:
//! - Total choice enumeration with a lexicographic index space
//! - Two equivalent evaluation strategies (model counting, brave/cautious consequences)
//! - Worker-local mass accumulation with a single parallel reduction
//! - Max-ent point probabilities as an alternative semantics
//! - A clingo subprocess adapter and an in-process reference solver

pub mod aggregate;
pub mod choice;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod solver;
pub mod target;
pub mod types;

// Re-exports
pub use aggregate::{Diagnostic, QueryResult, Semantics};
pub use config::PaspConfig;
pub use engine::{InferenceEngine, InferenceReport};
pub use error::{InferenceError, Result};
pub use evaluate::Strategy;
pub use solver::{ClingoCli, ReferenceSolver, StableModelSolver};
pub use types::{Atom, CredalFact, Interval, Literal, ProbabilisticFact, Program, Query, Rule};
