//! Stable-model solvers, driven as black boxes.
//!
//! The inference engine never looks inside a solver. It grounds one program instance per
//! total choice and asks for either every stable model or the brave/cautious consequences
//! of that instance.

pub mod clingo;
pub mod reference;

pub use clingo::ClingoCli;
pub use reference::ReferenceSolver;

use crate::choice::TotalChoice;
use crate::error::Result;
use crate::target::TargetRules;
use crate::types::{Atom, Literal, Program};
use std::collections::HashSet;
use std::fmt;

/// Consequence enumeration mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConsequenceMode {
    /// Atoms true in at least one stable model.
    Brave,
    /// Atoms true in every stable model.
    Cautious,
}

impl fmt::Display for ConsequenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsequenceMode::Brave => f.write_str("brave"),
            ConsequenceMode::Cautious => f.write_str("cautious"),
        }
    }
}

/// The true atoms of one stable model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StableModel {
    atoms: HashSet<Atom>,
}

impl StableModel {
    pub fn new(atoms: impl IntoIterator<Item = Atom>) -> Self {
        StableModel {
            atoms: atoms.into_iter().collect(),
        }
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    pub fn satisfies(&self, literal: &Literal) -> bool {
        literal.holds(|atom| self.contains(atom))
    }

    /// Whether every literal of the conjunction holds. Empty conjunctions hold.
    pub fn satisfies_all(&self, literals: &[Literal]) -> bool {
        literals.iter().all(|l| self.satisfies(l))
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Brave or cautious consequences of one grounded instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsequenceSet {
    mode: ConsequenceMode,
    atoms: HashSet<Atom>,
}

impl ConsequenceSet {
    pub fn new(mode: ConsequenceMode, atoms: impl IntoIterator<Item = Atom>) -> Self {
        ConsequenceSet {
            mode,
            atoms: atoms.into_iter().collect(),
        }
    }

    pub fn mode(&self) -> ConsequenceMode {
        self.mode
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Trait for stable-model solving engines.
///
/// Implementations must be shareable across worker threads; each call to
/// [`ground_and_prepare`](StableModelSolver::ground_and_prepare) yields an independent
/// instance, so no solver state is shared between total choices.
pub trait StableModelSolver: Sync {
    /// A program grounded under one total choice, ready to solve.
    type Instance;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Instantiate `program` with the probabilistic facts fixed by `choice`, plus the
    /// auxiliary target rules when given. Undefined-atom diagnostics are suppressed.
    fn ground_and_prepare(
        &self,
        program: &Program,
        choice: &TotalChoice,
        targets: Option<&TargetRules>,
    ) -> Result<Self::Instance>;

    /// Every stable model of the instance.
    fn enumerate_models(&self, instance: &Self::Instance) -> Result<Vec<StableModel>>;

    /// Brave or cautious consequences, restricted to projected atoms when the instance has
    /// target rules. `None` when the instance has no stable model.
    fn consequences(
        &self,
        instance: &Self::Instance,
        mode: ConsequenceMode,
    ) -> Result<Option<ConsequenceSet>>;

    fn cautious_consequences(&self, instance: &Self::Instance) -> Result<Option<ConsequenceSet>> {
        self.consequences(instance, ConsequenceMode::Cautious)
    }

    fn brave_consequences(&self, instance: &Self::Instance) -> Result<Option<ConsequenceSet>> {
        self.consequences(instance, ConsequenceMode::Brave)
    }
}

impl<S: StableModelSolver> StableModelSolver for &S {
    type Instance = S::Instance;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn ground_and_prepare(
        &self,
        program: &Program,
        choice: &TotalChoice,
        targets: Option<&TargetRules>,
    ) -> Result<Self::Instance> {
        (**self).ground_and_prepare(program, choice, targets)
    }

    fn enumerate_models(&self, instance: &Self::Instance) -> Result<Vec<StableModel>> {
        (**self).enumerate_models(instance)
    }

    fn consequences(
        &self,
        instance: &Self::Instance,
        mode: ConsequenceMode,
    ) -> Result<Option<ConsequenceSet>> {
        (**self).consequences(instance, mode)
    }
}
