//! Reference stable-model solver for small ground normal programs.
//!
//! Used by tests and demos where no external solver is installed. It only understands the
//! structured rules of a [`Program`]; raw `source` text is rejected.
//!
//! Enumeration guesses the truth value of every atom that occurs under default negation,
//! computes the least model of the Gelfond-Lifschitz reduct for that guess, and keeps the
//! least models that reproduce their own guess and violate no constraint. Each stable model
//! is found exactly once, for the guess equal to its negated atoms.
//!
//! Query target rules never take part in the guess. They only read program atoms and the
//! heads of earlier target rules, so each stable model of the program is extended by one
//! ordered pass over them.

use super::{ConsequenceMode, ConsequenceSet, StableModel, StableModelSolver};
use crate::choice::TotalChoice;
use crate::error::{InferenceError, Result};
use crate::target::TargetRules;
use crate::types::{Atom, Literal, Program, Rule};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Default bound on atoms occurring under negation.
pub const DEFAULT_MAX_GUESS_ATOMS: usize = 20;

/// Exhaustive solver over ground normal programs with constraints.
#[derive(Clone, Debug)]
pub struct ReferenceSolver {
    max_guess_atoms: usize,
}

impl ReferenceSolver {
    pub fn new() -> Self {
        ReferenceSolver {
            max_guess_atoms: DEFAULT_MAX_GUESS_ATOMS,
        }
    }

    /// Bound the number of negated atoms; enumeration is exponential in it.
    pub fn with_max_guess_atoms(mut self, max: usize) -> Self {
        self.max_guess_atoms = max.min(crate::choice::MAX_FACTS);
        self
    }
}

impl Default for ReferenceSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct IndexedRule {
    head: Option<usize>,
    pos: Vec<usize>,
    neg: Vec<usize>,
}

/// A program grounded under one total choice, with atoms interned to indices.
#[derive(Clone, Debug)]
pub struct ReferenceInstance {
    atoms: Vec<Atom>,
    rules: Vec<IndexedRule>,
    /// Target rules in compile order.
    extension: Vec<IndexedRule>,
    guessed: Vec<usize>,
    projection: Option<Vec<usize>>,
    models: OnceLock<Vec<Vec<bool>>>,
}

#[derive(Default)]
struct Interner {
    atoms: Vec<Atom>,
    index: HashMap<Atom, usize>,
}

impl Interner {
    fn intern(&mut self, atom: &Atom) -> usize {
        if let Some(&i) = self.index.get(atom) {
            return i;
        }
        let i = self.atoms.len();
        self.atoms.push(atom.clone());
        self.index.insert(atom.clone(), i);
        i
    }

    fn rule(&mut self, rule: &Rule) -> IndexedRule {
        let head = rule.head.as_ref().map(|h| self.intern(h));
        let (pos, neg): (Vec<&Literal>, Vec<&Literal>) =
            rule.body.iter().partition(|l| l.positive);
        IndexedRule {
            head,
            pos: pos.into_iter().map(|l| self.intern(&l.atom)).collect(),
            neg: neg.into_iter().map(|l| self.intern(&l.atom)).collect(),
        }
    }
}

impl ReferenceInstance {
    /// Least model of the reduct under `assumed`, the guessed truth of every atom.
    fn least_model(&self, assumed: &[bool]) -> Vec<bool> {
        let active: Vec<(usize, &IndexedRule)> = self
            .rules
            .iter()
            .filter(|r| r.neg.iter().all(|&a| !assumed[a]))
            .filter_map(|r| r.head.map(|h| (h, r)))
            .collect();

        let mut truth = vec![false; self.atoms.len()];
        let mut changed = true;
        while changed {
            changed = false;
            for (head, rule) in &active {
                if !truth[*head] && rule.pos.iter().all(|&a| truth[a]) {
                    truth[*head] = true;
                    changed = true;
                }
            }
        }
        truth
    }

    fn violates_constraint(&self, truth: &[bool]) -> bool {
        self.rules.iter().filter(|r| r.head.is_none()).any(|r| {
            r.pos.iter().all(|&a| truth[a]) && r.neg.iter().all(|&a| !truth[a])
        })
    }

    /// Truth vectors of all stable models, in guess order. Solved once per instance.
    fn stable_models(&self) -> &[Vec<bool>] {
        self.models.get_or_init(|| self.solve())
    }

    fn solve(&self) -> Vec<Vec<bool>> {
        let mut models = Vec::new();
        let mut assumed = vec![false; self.atoms.len()];

        for mask in 0..(1u64 << self.guessed.len()) {
            for (k, &atom) in self.guessed.iter().enumerate() {
                assumed[atom] = (mask >> k) & 1 == 1;
            }
            let truth = self.least_model(&assumed);
            let reproduces = self.guessed.iter().all(|&a| truth[a] == assumed[a]);
            if reproduces && !self.violates_constraint(&truth) {
                models.push(self.extend(truth));
            }
        }
        models
    }

    /// Decide the target heads of one stable model.
    fn extend(&self, mut truth: Vec<bool>) -> Vec<bool> {
        for rule in &self.extension {
            let holds = rule.pos.iter().all(|&a| truth[a]) && rule.neg.iter().all(|&a| !truth[a]);
            if let Some(head) = rule.head.filter(|_| holds) {
                truth[head] = true;
            }
        }
        truth
    }

    fn atoms_of(&self, truth: &[bool]) -> Vec<Atom> {
        truth
            .iter()
            .zip(&self.atoms)
            .filter(|(t, _)| **t)
            .map(|(_, atom)| atom.clone())
            .collect()
    }
}

impl StableModelSolver for ReferenceSolver {
    type Instance = ReferenceInstance;

    fn name(&self) -> &'static str {
        "reference"
    }

    fn ground_and_prepare(
        &self,
        program: &Program,
        choice: &TotalChoice,
        targets: Option<&TargetRules>,
    ) -> Result<ReferenceInstance> {
        if !program.source.trim().is_empty() {
            return Err(InferenceError::UnsupportedProgram(
                "the reference solver accepts structured rules only".into(),
            ));
        }

        let mut interner = Interner::default();
        let mut rules: Vec<IndexedRule> = program.rules.iter().map(|r| interner.rule(r)).collect();
        for atom in choice.true_atoms(program.choice_atoms()) {
            rules.push(interner.rule(&Rule::fact(atom.clone())));
        }
        let (extension, projection) = match targets {
            Some(t) => {
                let extension = t.rules().iter().map(|r| interner.rule(r)).collect();
                let projection = t.projection().map(|a| interner.intern(a)).collect();
                (extension, Some(projection))
            }
            None => (Vec::new(), None),
        };

        let mut guessed: Vec<usize> = rules.iter().flat_map(|r| r.neg.iter().copied()).collect();
        guessed.sort_unstable();
        guessed.dedup();
        if guessed.len() > self.max_guess_atoms {
            return Err(InferenceError::SolverFailure(format!(
                "{} atoms under negation exceed the reference solver limit of {}",
                guessed.len(),
                self.max_guess_atoms
            )));
        }

        Ok(ReferenceInstance {
            atoms: interner.atoms,
            rules,
            extension,
            guessed,
            projection,
            models: OnceLock::new(),
        })
    }

    fn enumerate_models(&self, instance: &ReferenceInstance) -> Result<Vec<StableModel>> {
        Ok(instance
            .stable_models()
            .iter()
            .map(|truth| StableModel::new(instance.atoms_of(truth)))
            .collect())
    }

    fn consequences(
        &self,
        instance: &ReferenceInstance,
        mode: ConsequenceMode,
    ) -> Result<Option<ConsequenceSet>> {
        let models = instance.stable_models();
        let Some(first) = models.first() else {
            return Ok(None);
        };

        let mut merged = first.clone();
        for truth in &models[1..] {
            for (acc, t) in merged.iter_mut().zip(truth) {
                match mode {
                    ConsequenceMode::Brave => *acc |= *t,
                    ConsequenceMode::Cautious => *acc &= *t,
                }
            }
        }
        if let Some(projection) = &instance.projection {
            let mut keep = vec![false; merged.len()];
            for &a in projection {
                keep[a] = true;
            }
            for (acc, k) in merged.iter_mut().zip(keep) {
                *acc &= k;
            }
        }

        Ok(Some(ConsequenceSet::new(mode, instance.atoms_of(&merged))))
    }
}
