//! Accumulation of weighted conditions and resolution into intervals.

use crate::evaluate::{ChoiceEvaluation, Conditions, ModelTally};
use crate::types::{Interval, Query};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Probability semantics for stable models of a total choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Semantics {
    /// Lower/upper bounds over every distribution on Γ(θ).
    #[default]
    Credal,
    /// Uniform distribution over Γ(θ); yields point intervals.
    MaxEnt,
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantics::Credal => f.write_str("credal"),
            Semantics::MaxEnt => f.write_str("max_ent"),
        }
    }
}

impl FromStr for Semantics {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "credal" => Ok(Semantics::Credal),
            "max_ent" | "maxent" => Ok(Semantics::MaxEnt),
            other => Err(format!("unknown semantics: {}", other)),
        }
    }
}

/// Accumulated probability mass of conditions 1 to 4 for one query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CredalMasses {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CredalMasses {
    pub fn add(&mut self, weight: f64, conditions: &Conditions) {
        if conditions.all_confirm {
            self.a += weight;
        }
        if conditions.some_confirm {
            self.b += weight;
        }
        if conditions.all_refute {
            self.c += weight;
        }
        if conditions.some_refute {
            self.d += weight;
        }
    }

    fn merge(&mut self, other: &CredalMasses) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
        self.d += other.d;
    }

    /// `a ≤ b` and `c ≤ d`.
    pub fn is_monotone(&self) -> bool {
        self.a <= self.b && self.c <= self.d
    }
}

/// Accumulated mass under the max-ent semantics for one query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaxEntMasses {
    /// Σ p(θ) · |models satisfying Q and E| / |Γ(θ)|
    pub joint: f64,
    /// Σ p(θ) · |models satisfying E| / |Γ(θ)|
    pub evidence: f64,
}

impl MaxEntMasses {
    fn merge(&mut self, other: &MaxEntMasses) {
        self.joint += other.joint;
        self.evidence += other.evidence;
    }
}

/// Per-query masses at every extreme point of the credal facts. Each worker owns one;
/// workers are merged once at the end.
#[derive(Clone, Debug, PartialEq)]
pub struct Accumulator {
    queries: usize,
    points: usize,
    /// Row-major: extreme point, then query.
    credal: Vec<CredalMasses>,
    max_ent: Vec<MaxEntMasses>,
    choices: u64,
}

impl Accumulator {
    pub fn new(queries: usize, points: usize) -> Self {
        Accumulator {
            queries,
            points,
            credal: vec![CredalMasses::default(); queries * points],
            max_ent: vec![MaxEntMasses::default(); queries * points],
            choices: 0,
        }
    }

    /// Fold one evaluated total choice, given its weight at every extreme point.
    pub fn fold(&mut self, weights: &[f64], evaluation: &ChoiceEvaluation) {
        debug_assert_eq!(weights.len(), self.points);
        for (point, &weight) in weights.iter().enumerate() {
            let rows = point * self.queries..(point + 1) * self.queries;
            for (masses, conditions) in self.credal[rows.clone()].iter_mut().zip(&evaluation.conditions) {
                masses.add(weight, conditions);
            }
            if let Some(tally) = &evaluation.tally {
                fold_tally(&mut self.max_ent[rows], weight, tally);
            }
        }
        self.choices += 1;
    }

    /// Combine two worker-local accumulators.
    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        for (mine, theirs) in self.credal.iter_mut().zip(&other.credal) {
            mine.merge(theirs);
        }
        for (mine, theirs) in self.max_ent.iter_mut().zip(&other.max_ent) {
            mine.merge(theirs);
        }
        self.choices += other.choices;
        self
    }

    /// Credal masses of every query at extreme point `point`.
    pub fn credal(&self, point: usize) -> &[CredalMasses] {
        &self.credal[point * self.queries..(point + 1) * self.queries]
    }

    /// Max-ent masses of every query at extreme point `point`.
    pub fn max_ent(&self, point: usize) -> &[MaxEntMasses] {
        &self.max_ent[point * self.queries..(point + 1) * self.queries]
    }

    pub fn extreme_points(&self) -> usize {
        self.points
    }

    /// Number of total choices folded so far.
    pub fn choices(&self) -> u64 {
        self.choices
    }

    /// Resolve one result per query, in query order.
    pub fn resolve(&self, queries: &[Query], semantics: Semantics) -> Vec<QueryResult> {
        queries
            .iter()
            .enumerate()
            .map(|(i, query)| {
                let evidence = query.has_evidence();
                let resolution = envelope((0..self.points).map(|point| match semantics {
                    Semantics::Credal => resolve_credal(&self.credal(point)[i], evidence),
                    Semantics::MaxEnt => resolve_max_ent(&self.max_ent(point)[i], evidence),
                }));
                QueryResult {
                    query: query.clone(),
                    interval: resolution.interval,
                    diagnostic: resolution.diagnostic,
                }
            })
            .collect()
    }
}

fn fold_tally(masses: &mut [MaxEntMasses], weight: f64, tally: &ModelTally) {
    if tally.models == 0 {
        return;
    }
    let share = weight / tally.models as f64;
    for (masses, counts) in masses.iter_mut().zip(&tally.counts) {
        masses.joint += share * counts.confirming as f64;
        masses.evidence += share * counts.evidence as f64;
    }
}

/// Non-fatal per-query findings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    /// No total choice has a model satisfying the evidence: ℙ(E) = 0.
    ZeroEvidenceProbability,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ZeroEvidenceProbability => f.write_str("Fail: ℙ(E) = 0!"),
        }
    }
}

/// An interval, plus the diagnostic that produced it when resolution failed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub interval: Interval,
    pub diagnostic: Option<Diagnostic>,
}

impl Resolution {
    fn defined(interval: Interval) -> Self {
        Resolution {
            interval,
            diagnostic: None,
        }
    }

    fn zero_evidence() -> Self {
        Resolution {
            interval: Interval::UNDEFINED,
            diagnostic: Some(Diagnostic::ZeroEvidenceProbability),
        }
    }
}

/// Hull of the per-extreme-point resolutions of one query.
///
/// Extreme points where the evidence has probability zero are skipped; the query is
/// undefined only when that holds at every point.
pub fn envelope(resolutions: impl IntoIterator<Item = Resolution>) -> Resolution {
    resolutions
        .into_iter()
        .filter(|r| r.diagnostic.is_none())
        .map(|r| r.interval)
        .reduce(|hull, interval| {
            Interval::new(hull.lower.min(interval.lower), hull.upper.max(interval.upper))
        })
        .map_or_else(Resolution::zero_evidence, Resolution::defined)
}

/// Resolve the four masses of one query into its credal interval.
pub fn resolve_credal(masses: &CredalMasses, has_evidence: bool) -> Resolution {
    let CredalMasses { a, b, c, d } = *masses;
    if !has_evidence {
        return Resolution::defined(Interval::new(a, b));
    }
    if b + d == 0.0 {
        Resolution::zero_evidence()
    } else if b + c == 0.0 && d > 0.0 {
        Resolution::defined(Interval::point(0.0))
    } else if a + d == 0.0 && b > 0.0 {
        Resolution::defined(Interval::point(1.0))
    } else {
        Resolution::defined(Interval::new(a / (a + d), b / (b + c)))
    }
}

/// Resolve max-ent masses of one query into a point interval.
pub fn resolve_max_ent(masses: &MaxEntMasses, has_evidence: bool) -> Resolution {
    if !has_evidence {
        return Resolution::defined(Interval::point(masses.joint));
    }
    if masses.evidence == 0.0 {
        return Resolution::zero_evidence();
    }
    Resolution::defined(Interval::point(masses.joint / masses.evidence))
}

/// The answer to one query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: Query,
    pub interval: Interval,
    pub diagnostic: Option<Diagnostic>,
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.query, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::ModelCounts;
    use proptest::prelude::*;

    fn masses(a: f64, b: f64, c: f64, d: f64) -> CredalMasses {
        CredalMasses { a, b, c, d }
    }

    #[test]
    fn test_unconditioned_is_a_b() {
        let r = resolve_credal(&masses(0.2, 0.6, 0.4, 0.8), false);
        assert_eq!(r.interval, Interval::new(0.2, 0.6));
        assert_eq!(r.diagnostic, None);
    }

    #[test]
    fn test_zero_evidence_sentinel() {
        let r = resolve_credal(&masses(0.0, 0.0, 0.0, 0.0), true);
        assert!(r.interval.is_undefined());
        assert_eq!(r.diagnostic, Some(Diagnostic::ZeroEvidenceProbability));
    }

    #[test]
    fn test_never_confirmed_is_zero() {
        let r = resolve_credal(&masses(0.0, 0.0, 0.0, 0.5), true);
        assert_eq!(r.interval, Interval::point(0.0));
    }

    #[test]
    fn test_never_refuted_is_one() {
        let r = resolve_credal(&masses(0.0, 0.5, 0.0, 0.0), true);
        assert_eq!(r.interval, Interval::point(1.0));
    }

    #[test]
    fn test_general_case() {
        let r = resolve_credal(&masses(0.1, 0.4, 0.2, 0.5), true);
        assert!((r.interval.lower - 0.1 / 0.6).abs() < 1e-12);
        assert!((r.interval.upper - 0.4 / 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_max_ent_resolution() {
        let r = resolve_max_ent(&MaxEntMasses { joint: 0.25, evidence: 0.5 }, true);
        assert_eq!(r.interval, Interval::point(0.5));

        let r = resolve_max_ent(&MaxEntMasses { joint: 0.25, evidence: 1.0 }, false);
        assert_eq!(r.interval, Interval::point(0.25));

        let r = resolve_max_ent(&MaxEntMasses::default(), true);
        assert_eq!(r.diagnostic, Some(Diagnostic::ZeroEvidenceProbability));
    }

    #[test]
    fn test_fold_splits_weight_across_models() {
        let mut acc = Accumulator::new(1, 1);
        let evaluation = ChoiceEvaluation {
            conditions: vec![Conditions {
                all_confirm: false,
                some_confirm: true,
                all_refute: false,
                some_refute: true,
            }],
            tally: Some(ModelTally {
                models: 4,
                counts: vec![ModelCounts {
                    evidence: 2,
                    confirming: 1,
                    refuting: 1,
                }],
            }),
        };
        acc.fold(&[0.5], &evaluation);

        assert_eq!(acc.credal(0)[0], masses(0.0, 0.5, 0.0, 0.5));
        assert!((acc.max_ent(0)[0].joint - 0.125).abs() < 1e-12);
        assert!((acc.max_ent(0)[0].evidence - 0.25).abs() < 1e-12);
        assert_eq!(acc.choices(), 1);
    }

    #[test]
    fn test_extreme_points_accumulate_separately() {
        let mut acc = Accumulator::new(2, 2);
        let confirm = Conditions {
            all_confirm: true,
            some_confirm: true,
            all_refute: false,
            some_refute: false,
        };
        let refute = Conditions {
            all_confirm: false,
            some_confirm: false,
            all_refute: true,
            some_refute: true,
        };
        acc.fold(
            &[0.2, 0.6],
            &ChoiceEvaluation {
                conditions: vec![confirm, refute],
                tally: None,
            },
        );

        assert_eq!(acc.credal(0), &[masses(0.2, 0.2, 0.0, 0.0), masses(0.0, 0.0, 0.2, 0.2)]);
        assert_eq!(acc.credal(1), &[masses(0.6, 0.6, 0.0, 0.0), masses(0.0, 0.0, 0.6, 0.6)]);

        let queries = [
            Query::new([crate::types::Literal::pos("a")]),
            Query::new([crate::types::Literal::pos("b")]),
        ];
        let results = acc.resolve(&queries, Semantics::Credal);
        assert_eq!(results[0].interval, Interval::new(0.2, 0.6));
        assert_eq!(results[1].interval, Interval::new(0.0, 0.0));
    }

    #[test]
    fn test_envelope_skips_zero_evidence_points() {
        let defined = |l, u| Resolution::defined(Interval::new(l, u));
        let r = envelope([defined(0.3, 0.5), Resolution::zero_evidence(), defined(0.1, 0.4)]);
        assert_eq!(r, defined(0.1, 0.5));

        let r = envelope([Resolution::zero_evidence(), Resolution::zero_evidence()]);
        assert_eq!(r.diagnostic, Some(Diagnostic::ZeroEvidenceProbability));
        assert!(r.interval.is_undefined());
    }

    #[test]
    fn test_result_display() {
        let result = QueryResult {
            query: Query::new([crate::types::Literal::pos("a")]),
            interval: Interval::new(0.5, 0.5),
            diagnostic: None,
        };
        assert_eq!(result.to_string(), "ℙ(a) = [0.5, 0.5]");
    }

    fn arb_conditions() -> impl Strategy<Value = Conditions> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(all_confirm, some, all_refute, some_r)| Conditions {
                all_confirm,
                some_confirm: some || all_confirm,
                all_refute,
                some_refute: some_r || all_refute,
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn masses_stay_monotone_on_every_prefix(
            steps in proptest::collection::vec((0.0f64..=1.0, arb_conditions()), 0..64),
        ) {
            let mut acc = Accumulator::new(1, 1);
            for (weight, conditions) in steps {
                acc.fold(&[weight], &ChoiceEvaluation { conditions: vec![conditions], tally: None });
                prop_assert!(acc.credal(0)[0].is_monotone());
            }
        }

        #[test]
        fn merge_matches_sequential_fold(
            steps in proptest::collection::vec((0.0f64..=1.0, arb_conditions()), 0..64),
            split in 0usize..64,
        ) {
            let split = split.min(steps.len());
            let fold = |range: &[(f64, Conditions)]| {
                let mut acc = Accumulator::new(1, 1);
                for (weight, conditions) in range {
                    acc.fold(&[*weight], &ChoiceEvaluation { conditions: vec![*conditions], tally: None });
                }
                acc
            };
            let whole = fold(&steps);
            let merged = fold(&steps[..split]).merge(fold(&steps[split..]));

            let (w, m) = (whole.credal(0)[0], merged.credal(0)[0]);
            prop_assert!((w.a - m.a).abs() < 1e-9 && (w.b - m.b).abs() < 1e-9);
            prop_assert!((w.c - m.c).abs() < 1e-9 && (w.d - m.d).abs() < 1e-9);
            prop_assert_eq!(whole.choices(), merged.choices());
        }

        #[test]
        fn conditioned_intervals_stay_in_unit_range(
            a in 0.0f64..=1.0, extra_b in 0.0f64..=1.0,
            c in 0.0f64..=1.0, extra_d in 0.0f64..=1.0,
        ) {
            let r = resolve_credal(&masses(a, a + extra_b, c, c + extra_d), true);
            prop_assume!(r.diagnostic.is_none());
            prop_assert!(0.0 <= r.interval.lower);
            prop_assert!(r.interval.lower <= r.interval.upper + 1e-12);
            prop_assert!(r.interval.upper <= 1.0);
        }
    }
}
