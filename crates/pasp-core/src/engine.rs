//! Exact inference driver.
//!
//! Enumerates every total choice, evaluates it with the configured strategy, weights the
//! result and folds it into an [`Accumulator`]. With more than one worker, rayon splits the
//! index range; each worker folds into its own accumulator and the accumulators are merged
//! in a single reduction.

use crate::aggregate::{Accumulator, Diagnostic, QueryResult, Semantics};
use crate::choice::{ChoiceWeights, TotalChoice, TotalChoices};
use crate::config::PaspConfig;
use crate::error::{InferenceError, Result};
use crate::evaluate::{ChoiceEvaluator, Consequences, ModelCounting, Strategy};
use crate::solver::StableModelSolver;
use crate::types::{Interval, Program};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, instrument, trace, warn};

/// The answers of one inference run, in query order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InferenceReport {
    pub results: Vec<QueryResult>,
    pub strategy: Strategy,
    pub semantics: Semantics,
    /// Number of total choices visited.
    pub choices: u64,
}

impl InferenceReport {
    pub fn intervals(&self) -> Vec<Interval> {
        self.results.iter().map(|r| r.interval).collect()
    }

    /// Results that carry a diagnostic.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&QueryResult, Diagnostic)> {
        self.results
            .iter()
            .filter_map(|r| r.diagnostic.map(|d| (r, d)))
    }
}

impl fmt::Display for InferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            if let Some(diagnostic) = result.diagnostic {
                writeln!(f, "{}", diagnostic)?;
            }
            writeln!(f, "{}", result)?;
        }
        Ok(())
    }
}

/// Runs exact inference with a stable-model solver.
pub struct InferenceEngine<S> {
    solver: S,
    config: PaspConfig,
}

impl<S: StableModelSolver> InferenceEngine<S> {
    pub fn new(solver: S, config: PaspConfig) -> Self {
        InferenceEngine { solver, config }
    }

    pub fn with_defaults(solver: S) -> Self {
        Self::new(solver, PaspConfig::default())
    }

    pub fn config(&self) -> &PaspConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Answer every query of `program`.
    ///
    /// Fails without partial results if the program is invalid or the solver fails on any
    /// total choice. Queries with zero-probability evidence resolve to
    /// [`Interval::UNDEFINED`] with a diagnostic.
    #[instrument(
        skip(self, program),
        fields(
            solver = self.solver.name(),
            facts = program.facts.len(),
            credal_facts = program.credal_facts.len(),
            queries = program.queries.len()
        )
    )]
    pub fn infer(&self, program: &Program) -> Result<InferenceReport> {
        self.config.validate()?;
        program.validate()?;

        let limit = self.config.inference.max_probabilistic_facts;
        if program.choice_width() > limit {
            return Err(InferenceError::TooManyFacts {
                count: program.choice_width(),
                limit,
            });
        }

        let space = TotalChoices::new(program.choice_width())?;
        let weights = ChoiceWeights::of(program)?;
        let strategy = self.config.inference.strategy;
        let semantics = self.config.inference.semantics;
        debug!(
            choices = space.count(),
            extreme_points = weights.extreme_points(),
            %strategy,
            %semantics,
            "Starting exact inference"
        );

        let accumulator = match strategy {
            Strategy::ModelCounting => {
                self.accumulate(&ModelCounting::new(&self.solver, program), program, space, weights)?
            }
            Strategy::Consequences => {
                self.accumulate(&Consequences::new(&self.solver, program), program, space, weights)?
            }
        };

        let results = accumulator.resolve(&program.queries, semantics);
        for result in &results {
            if let Some(diagnostic) = result.diagnostic {
                warn!(query = %result.query, "{}", diagnostic);
            }
            info!("{}", result);
        }

        Ok(InferenceReport {
            results,
            strategy,
            semantics,
            choices: accumulator.choices(),
        })
    }

    fn accumulate<E: ChoiceEvaluator>(
        &self,
        evaluator: &E,
        program: &Program,
        space: TotalChoices,
        weights: ChoiceWeights<'_>,
    ) -> Result<Accumulator> {
        let queries = program.queries.len();
        let points = weights.extreme_points();
        let step = |mut acc: Accumulator, choice: TotalChoice| -> Result<Accumulator> {
            let evaluation = evaluator.evaluate(&choice)?;
            let choice_weights = weights.weights(&choice);
            trace!(?choice, weights = ?choice_weights, "Evaluated total choice");
            acc.fold(&choice_weights, &evaluation);
            Ok(acc)
        };

        match self.config.execution.workers {
            1 => space.iter().try_fold(Accumulator::new(queries, points), step),
            workers => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| {
                        InferenceError::ConfigError(format!("Failed to start worker pool: {}", e))
                    })?;
                pool.install(|| {
                    space
                        .par_iter()
                        .try_fold(|| Accumulator::new(queries, points), step)
                        .try_reduce(|| Accumulator::new(queries, points), |a, b| Ok(a.merge(b)))
                })
            }
        }
    }
}
