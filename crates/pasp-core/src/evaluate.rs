//! Per-total-choice query evaluation.
//!
//! For one total choice θ with stable models Γ(θ), each query gets four truth conditions:
//! 1. every model in Γ(θ) satisfies Q and E
//! 2. some model in Γ(θ) satisfies Q and E
//! 3. every model in Γ(θ) satisfies E but fails Q
//! 4. some model in Γ(θ) satisfies E but fails Q
//!
//! Two strategies compute them: [`ModelCounting`] enumerates Γ(θ), [`Consequences`] reads
//! them off cautious and brave consequences of the target rules. Both agree on every choice.
//! A choice with no stable model satisfies none of the four conditions.

use crate::choice::TotalChoice;
use crate::error::Result;
use crate::solver::{ConsequenceSet, StableModel, StableModelSolver};
use crate::target::{QueryTarget, TargetRules};
use crate::types::{Program, Query};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Query evaluation strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Enumerate every stable model of each total choice.
    ModelCounting,
    /// Two consequence computations (cautious, brave) per total choice.
    #[default]
    Consequences,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ModelCounting => f.write_str("model_counting"),
            Strategy::Consequences => f.write_str("consequences"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "model_counting" | "models" | "counting" => Ok(Strategy::ModelCounting),
            "consequences" | "brave_cautious" | "bc" => Ok(Strategy::Consequences),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// The four truth conditions of one query under one total choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Conditions {
    /// Condition 1.
    pub all_confirm: bool,
    /// Condition 2.
    pub some_confirm: bool,
    /// Condition 3.
    pub all_refute: bool,
    /// Condition 4.
    pub some_refute: bool,
}

impl Conditions {
    /// Conditions from cautious and brave consequences of the target atoms.
    pub fn from_consequences(
        target: &QueryTarget,
        cautious: &ConsequenceSet,
        brave: &ConsequenceSet,
    ) -> Self {
        Conditions {
            all_confirm: cautious.contains(&target.confirm),
            some_confirm: brave.contains(&target.confirm),
            all_refute: cautious.contains(&target.refute),
            some_refute: brave.contains(&target.refute),
        }
    }
}

/// Per-query tallies over the stable models of one total choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelCounts {
    /// Models satisfying E.
    pub evidence: usize,
    /// Models satisfying E and Q.
    pub confirming: usize,
    /// Models satisfying E but failing Q.
    pub refuting: usize,
}

impl ModelCounts {
    /// Fold one model into the tallies.
    pub fn observe(self, model: &StableModel, query: &Query) -> Self {
        if !model.satisfies_all(&query.evidence) {
            return self;
        }
        if model.satisfies_all(&query.query) {
            ModelCounts {
                evidence: self.evidence + 1,
                confirming: self.confirming + 1,
                ..self
            }
        } else {
            ModelCounts {
                evidence: self.evidence + 1,
                refuting: self.refuting + 1,
                ..self
            }
        }
    }

    /// Resolve tallies over `models` stable models into the four conditions.
    pub fn conditions(&self, models: usize) -> Conditions {
        if models == 0 {
            return Conditions::default();
        }
        let all_evidence = self.evidence == models;
        Conditions {
            all_confirm: all_evidence && self.confirming == models,
            some_confirm: self.confirming > 0,
            all_refute: all_evidence && self.refuting == models,
            some_refute: self.refuting > 0,
        }
    }
}

/// Model tallies of one total choice, kept for the max-ent semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelTally {
    pub models: usize,
    pub counts: Vec<ModelCounts>,
}

/// Everything one total choice contributes, before weighting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChoiceEvaluation {
    /// Conditions per query, in query order.
    pub conditions: Vec<Conditions>,
    /// Present only for strategies that enumerate models.
    pub tally: Option<ModelTally>,
}

/// Evaluates all queries of a program under one total choice.
pub trait ChoiceEvaluator: Sync {
    fn strategy(&self) -> Strategy;

    fn evaluate(&self, choice: &TotalChoice) -> Result<ChoiceEvaluation>;
}

/// Strategy A: enumerate all stable models and count.
pub struct ModelCounting<'a, S> {
    solver: &'a S,
    program: &'a Program,
}

impl<'a, S: StableModelSolver> ModelCounting<'a, S> {
    pub fn new(solver: &'a S, program: &'a Program) -> Self {
        ModelCounting { solver, program }
    }

    /// Tally `models` for every query.
    pub fn tally(&self, models: &[StableModel]) -> ModelTally {
        let queries = &self.program.queries;
        let counts = models.iter().fold(
            vec![ModelCounts::default(); queries.len()],
            |counts, model| {
                counts
                    .into_iter()
                    .zip(queries)
                    .map(|(c, q)| c.observe(model, q))
                    .collect()
            },
        );
        ModelTally {
            models: models.len(),
            counts,
        }
    }
}

impl<S: StableModelSolver> ChoiceEvaluator for ModelCounting<'_, S> {
    fn strategy(&self) -> Strategy {
        Strategy::ModelCounting
    }

    fn evaluate(&self, choice: &TotalChoice) -> Result<ChoiceEvaluation> {
        let instance = self.solver.ground_and_prepare(self.program, choice, None)?;
        let models = self.solver.enumerate_models(&instance)?;
        let tally = self.tally(&models);

        Ok(ChoiceEvaluation {
            conditions: tally
                .counts
                .iter()
                .map(|c| c.conditions(tally.models))
                .collect(),
            tally: Some(tally),
        })
    }
}

/// Strategy B: brave and cautious consequences of compiled target rules.
pub struct Consequences<'a, S> {
    solver: &'a S,
    program: &'a Program,
    targets: TargetRules,
}

impl<'a, S: StableModelSolver> Consequences<'a, S> {
    pub fn new(solver: &'a S, program: &'a Program) -> Self {
        Consequences {
            solver,
            program,
            targets: TargetRules::compile(&program.queries),
        }
    }

    pub fn targets(&self) -> &TargetRules {
        &self.targets
    }
}

impl<S: StableModelSolver> ChoiceEvaluator for Consequences<'_, S> {
    fn strategy(&self) -> Strategy {
        Strategy::Consequences
    }

    fn evaluate(&self, choice: &TotalChoice) -> Result<ChoiceEvaluation> {
        let instance = self
            .solver
            .ground_and_prepare(self.program, choice, Some(&self.targets))?;
        let cautious = self.solver.cautious_consequences(&instance)?;
        let brave = self.solver.brave_consequences(&instance)?;

        let conditions = match (cautious, brave) {
            (Some(cautious), Some(brave)) => self
                .targets
                .targets()
                .iter()
                .map(|t| Conditions::from_consequences(t, &cautious, &brave))
                .collect(),
            _ => vec![Conditions::default(); self.targets.len()],
        };

        Ok(ChoiceEvaluation {
            conditions,
            tally: None,
        })
    }
}
