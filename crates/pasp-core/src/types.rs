//! Core program types: atoms, signed literals, probabilistic facts, queries and rules.
//!
//! Programs arrive already structured (from JSON or a programmatic builder); nothing here
//! parses logic-program syntax. The `Display` impls render the solver-facing text form.

use crate::error::{InferenceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Prefix reserved for atoms synthesized by the target rule compiler.
pub const RESERVED_PREFIX: &str = "__query_";

/// A ground atom, e.g. `a` or `edge(1,2)`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Atom(String);

impl Atom {
    pub fn new(name: impl Into<String>) -> Self {
        Atom(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this atom lives in the namespace of synthesized target atoms.
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with(RESERVED_PREFIX)
    }
}

impl From<&str> for Atom {
    fn from(name: &str) -> Self {
        Atom::new(name)
    }
}

impl From<String> for Atom {
    fn from(name: String) -> Self {
        Atom(name)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.0)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_positive() -> bool {
    true
}

/// An atom asserted true (`positive`) or asserted false (`not atom`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub atom: Atom,
    #[serde(default = "default_positive")]
    pub positive: bool,
}

impl Literal {
    pub fn pos(atom: impl Into<Atom>) -> Self {
        Literal {
            atom: atom.into(),
            positive: true,
        }
    }

    pub fn neg(atom: impl Into<Atom>) -> Self {
        Literal {
            atom: atom.into(),
            positive: false,
        }
    }

    /// Evaluate the literal against a membership test for true atoms.
    pub fn holds(&self, is_true: impl FnOnce(&Atom) -> bool) -> bool {
        is_true(&self.atom) == self.positive
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.atom)
        } else {
            write!(f, "not {}", self.atom)
        }
    }
}

/// An atom that is independently true with probability `probability`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbabilisticFact {
    atom: Atom,
    probability: f64,
}

impl ProbabilisticFact {
    /// Create a probabilistic fact, rejecting probabilities outside [0, 1].
    pub fn new(atom: impl Into<Atom>, probability: f64) -> Result<Self> {
        let fact = ProbabilisticFact {
            atom: atom.into(),
            probability,
        };
        fact.check()?;
        Ok(fact)
    }

    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    fn check(&self) -> Result<()> {
        if self.probability.is_finite() && (0.0..=1.0).contains(&self.probability) {
            Ok(())
        } else {
            Err(InferenceError::InvalidProbability {
                atom: self.atom.to_string(),
                probability: self.probability,
            })
        }
    }
}

/// An atom whose probability of being true is only known to lie in `[lower, upper]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredalFact {
    atom: Atom,
    lower: f64,
    upper: f64,
}

impl CredalFact {
    /// Create a credal fact, rejecting bounds outside [0, 1] or with `lower > upper`.
    pub fn new(atom: impl Into<Atom>, lower: f64, upper: f64) -> Result<Self> {
        let fact = CredalFact {
            atom: atom.into(),
            lower,
            upper,
        };
        fact.check()?;
        Ok(fact)
    }

    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Probability at one end of the interval.
    pub fn endpoint(&self, upper: bool) -> f64 {
        if upper {
            self.upper
        } else {
            self.lower
        }
    }

    fn check(&self) -> Result<()> {
        for probability in [self.lower, self.upper] {
            if !(probability.is_finite() && (0.0..=1.0).contains(&probability)) {
                return Err(InferenceError::InvalidProbability {
                    atom: self.atom.to_string(),
                    probability,
                });
            }
        }
        if self.lower > self.upper {
            return Err(InferenceError::InvalidProgram(format!(
                "credal fact {} has lower bound {} above upper bound {}",
                self.atom, self.lower, self.upper
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CredalFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]::{}", self.lower, self.upper, self.atom)
    }
}

impl fmt::Display for ProbabilisticFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.probability, self.atom)
    }
}

/// A conjunction of query literals, optionally conditioned on evidence literals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub query: Vec<Literal>,
    #[serde(default)]
    pub evidence: Vec<Literal>,
}

impl Query {
    pub fn new(query: impl IntoIterator<Item = Literal>) -> Self {
        Query {
            query: query.into_iter().collect(),
            evidence: Vec::new(),
        }
    }

    /// Condition the query on `evidence`.
    pub fn given(mut self, evidence: impl IntoIterator<Item = Literal>) -> Self {
        self.evidence.extend(evidence);
        self
    }

    pub fn has_evidence(&self) -> bool {
        !self.evidence.is_empty()
    }

    fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.query.iter().chain(self.evidence.iter())
    }
}

fn write_conjunction(f: &mut fmt::Formatter<'_>, literals: &[Literal]) -> fmt::Result {
    for (i, literal) in literals.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", literal)?;
    }
    Ok(())
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ℙ(")?;
        write_conjunction(f, &self.query)?;
        if self.has_evidence() {
            f.write_str(" | ")?;
            write_conjunction(f, &self.evidence)?;
        }
        f.write_str(")")
    }
}

/// A ground normal rule. A rule without a head is an integrity constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub head: Option<Atom>,
    #[serde(default)]
    pub body: Vec<Literal>,
}

impl Rule {
    pub fn new(head: impl Into<Atom>, body: impl IntoIterator<Item = Literal>) -> Self {
        Rule {
            head: Some(head.into()),
            body: body.into_iter().collect(),
        }
    }

    pub fn fact(head: impl Into<Atom>) -> Self {
        Rule::new(head, [])
    }

    pub fn constraint(body: impl IntoIterator<Item = Literal>) -> Self {
        Rule {
            head: None,
            body: body.into_iter().collect(),
        }
    }

    fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.head.iter().chain(self.body.iter().map(|l| &l.atom))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(head) = &self.head {
            write!(f, "{}", head)?;
            if self.body.is_empty() {
                return f.write_str(".");
            }
            f.write_str(" ")?;
        }
        f.write_str(":- ")?;
        write_conjunction(f, &self.body)?;
        f.write_str(".")
    }
}

/// A probabilistic answer-set program together with the queries to answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Verbatim solver input, only consumable by text-based solvers.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Order defines the bit positions of total choices.
    #[serde(default)]
    pub facts: Vec<ProbabilisticFact>,
    /// Choice bits after the probabilistic facts, in this order.
    #[serde(default)]
    pub credal_facts: Vec<CredalFact>,
    #[serde(default)]
    pub queries: Vec<Query>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn fact(mut self, fact: ProbabilisticFact) -> Self {
        self.facts.push(fact);
        self
    }

    pub fn credal_fact(mut self, fact: CredalFact) -> Self {
        self.credal_facts.push(fact);
        self
    }

    /// Atoms of every choice bit: probabilistic facts first, then credal facts.
    pub fn choice_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.facts
            .iter()
            .map(ProbabilisticFact::atom)
            .chain(self.credal_facts.iter().map(CredalFact::atom))
    }

    /// Number of choice bits.
    pub fn choice_width(&self) -> usize {
        self.facts.len() + self.credal_facts.len()
    }

    pub fn query(mut self, query: Query) -> Self {
        self.queries.push(query);
        self
    }

    /// Render the deterministic part of the program as solver text.
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(self.source.len() + 32 * self.rules.len());
        if !self.source.trim().is_empty() {
            text.push_str(self.source.trim_end());
            text.push('\n');
        }
        for rule in &self.rules {
            text.push_str(&rule.to_string());
            text.push('\n');
        }
        text
    }

    /// Check probabilities, duplicate choice atoms and reserved atoms.
    pub fn validate(&self) -> Result<()> {
        for fact in &self.facts {
            fact.check()?;
        }
        for fact in &self.credal_facts {
            fact.check()?;
        }
        let mut seen = HashSet::with_capacity(self.choice_width());
        for atom in self.choice_atoms() {
            if !seen.insert(atom) {
                return Err(InferenceError::InvalidProgram(format!(
                    "duplicate probabilistic fact {}",
                    atom
                )));
            }
        }

        let atoms = self
            .choice_atoms()
            .chain(self.rules.iter().flat_map(Rule::atoms))
            .chain(self.queries.iter().flat_map(Query::literals).map(|l| &l.atom));
        for atom in atoms {
            if atom.as_str().is_empty() {
                return Err(InferenceError::InvalidProgram("empty atom name".into()));
            }
            if atom.is_reserved() {
                return Err(InferenceError::InvalidProgram(format!(
                    "atom {} uses the reserved prefix {}",
                    atom, RESERVED_PREFIX
                )));
            }
        }
        if self.source.contains(RESERVED_PREFIX) {
            return Err(InferenceError::InvalidProgram(format!(
                "program source uses the reserved prefix {}",
                RESERVED_PREFIX
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<Logic Program:")?;
        f.write_str(&self.render())?;
        writeln!(f, "Probabilistic Facts:")?;
        for fact in &self.facts {
            write!(f, "{}, ", fact)?;
        }
        writeln!(f)?;
        writeln!(f, "Credal Facts:")?;
        for fact in &self.credal_facts {
            write!(f, "{}, ", fact)?;
        }
        writeln!(f)?;
        writeln!(f, "Queries:")?;
        for query in &self.queries {
            write!(f, "{}, ", query)?;
        }
        write!(f, "\n>")
    }
}

/// A credal interval `[lower, upper]`.
///
/// `[-inf, +inf]` marks a conditional query whose evidence has probability zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub const UNDEFINED: Interval = Interval {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
    };

    pub fn new(lower: f64, upper: f64) -> Self {
        Interval { lower, upper }
    }

    pub fn point(value: f64) -> Self {
        Interval::new(value, value)
    }

    pub fn is_undefined(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    /// Compare both bounds within `tolerance`; infinite bounds must match exactly.
    pub fn approx_eq(&self, other: &Interval, tolerance: f64) -> bool {
        let close = |x: f64, y: f64| {
            if x.is_infinite() || y.is_infinite() {
                x == y
            } else {
                (x - y).abs() <= tolerance
            }
        };
        close(self.lower, other.lower) && close(self.upper, other.upper)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}
