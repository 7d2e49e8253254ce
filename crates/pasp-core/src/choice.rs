//! Total choices over probabilistic and credal facts, and their probability weights.
//!
//! A total choice is identified by its ordinal in `0..2^n`. Probabilistic facts come first,
//! then credal facts, and the first fact is the most significant bit, so ascending ordinals
//! enumerate the bit vectors lexicographically. Any ordinal can be decoded without visiting
//! the others, which lets workers split the space by index range.
//!
//! Credal facts make a choice's weight depend on where each fact's probability sits in its
//! interval. Weights are taken at every extreme point of that box; the interval bounds of a
//! query are attained at extreme points, since each mass is linear in every single fact
//! probability.

use crate::error::{InferenceError, Result};
use crate::types::{Atom, CredalFact, ProbabilisticFact, Program};
use rayon::prelude::*;
use std::fmt;

/// Hard upper bound on the number of choice bits (the index space is a `u64`).
pub const MAX_FACTS: usize = 63;

/// Hard upper bound on the number of credal facts; masses are kept per extreme point.
pub const MAX_CREDAL_FACTS: usize = 16;

/// One boolean assignment to every probabilistic fact.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TotalChoice {
    index: u64,
    len: usize,
}

impl TotalChoice {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether probabilistic fact `i` is taken as true.
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        (self.index >> (self.len - 1 - i)) & 1 == 1
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Atoms taken as true under this choice, given the atoms of every choice bit in order.
    pub fn true_atoms<'a, I>(&'a self, atoms: I) -> impl Iterator<Item = &'a Atom> + 'a
    where
        I: IntoIterator<Item = &'a Atom>,
        I::IntoIter: 'a,
    {
        atoms
            .into_iter()
            .zip(self.bits())
            .filter(|(_, taken)| *taken)
            .map(|(atom, _)| atom)
    }
}

impl fmt::Debug for TotalChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("θ(")?;
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        f.write_str(")")
    }
}

/// The space of all `2^n` total choices over `n` probabilistic facts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TotalChoices {
    len: usize,
}

impl TotalChoices {
    pub fn new(len: usize) -> Result<Self> {
        if len > MAX_FACTS {
            return Err(InferenceError::TooManyFacts {
                count: len,
                limit: MAX_FACTS,
            });
        }
        Ok(TotalChoices { len })
    }

    /// Number of probabilistic facts per choice.
    pub fn width(&self) -> usize {
        self.len
    }

    /// Number of total choices, `2^n`.
    pub fn count(&self) -> u64 {
        1u64 << self.len
    }

    /// Decode the choice with ordinal `index`.
    pub fn choice(&self, index: u64) -> TotalChoice {
        debug_assert!(index < self.count());
        TotalChoice {
            index,
            len: self.len,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = TotalChoice> {
        let space = *self;
        (0..space.count()).map(move |index| space.choice(index))
    }

    /// Parallel iterator over all choices; rayon splits the index range across workers.
    pub fn par_iter(&self) -> impl ParallelIterator<Item = TotalChoice> {
        let space = *self;
        (0..space.count())
            .into_par_iter()
            .map(move |index| space.choice(index))
    }
}

fn factor(probability: f64, taken: bool) -> f64 {
    if taken {
        probability
    } else {
        1.0 - probability
    }
}

/// Joint probabilities of total choices, one per extreme point of the credal facts.
///
/// Extreme point `v` takes the upper bound of credal fact `j` when bit `k - 1 - j` of `v` is
/// set and the lower bound otherwise. Without credal facts there is a single extreme point.
#[derive(Clone, Copy, Debug)]
pub struct ChoiceWeights<'a> {
    facts: &'a [ProbabilisticFact],
    credal: &'a [CredalFact],
}

impl<'a> ChoiceWeights<'a> {
    pub fn new(facts: &'a [ProbabilisticFact], credal: &'a [CredalFact]) -> Result<Self> {
        if credal.len() > MAX_CREDAL_FACTS {
            return Err(InferenceError::TooManyCredalFacts {
                count: credal.len(),
                limit: MAX_CREDAL_FACTS,
            });
        }
        Ok(ChoiceWeights { facts, credal })
    }

    pub fn of(program: &'a Program) -> Result<Self> {
        Self::new(&program.facts, &program.credal_facts)
    }

    /// Number of extreme points, `2^k` for `k` credal facts.
    pub fn extreme_points(&self) -> usize {
        1 << self.credal.len()
    }

    fn takes_upper(&self, point: usize, j: usize) -> bool {
        (point >> (self.credal.len() - 1 - j)) & 1 == 1
    }

    /// `Π p_i` over true facts times `Π (1 - p_i)` over false ones, with credal facts at
    /// extreme point `point`.
    pub fn weight(&self, choice: &TotalChoice, point: usize) -> f64 {
        debug_assert_eq!(choice.len(), self.facts.len() + self.credal.len());
        debug_assert!(point < self.extreme_points());
        let n = self.facts.len();
        let probabilistic = self
            .facts
            .iter()
            .enumerate()
            .map(|(i, fact)| factor(fact.probability(), choice.get(i)));
        let credal = self.credal.iter().enumerate().map(|(j, fact)| {
            factor(fact.endpoint(self.takes_upper(point, j)), choice.get(n + j))
        });
        probabilistic.chain(credal).product()
    }

    /// Weights of `choice` at every extreme point, in point order.
    pub fn weights(&self, choice: &TotalChoice) -> Vec<f64> {
        (0..self.extreme_points())
            .map(|point| self.weight(choice, point))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn facts(ps: &[f64]) -> Vec<ProbabilisticFact> {
        ps.iter()
            .enumerate()
            .map(|(i, p)| ProbabilisticFact::new(format!("f{}", i), *p).unwrap())
            .collect()
    }

    #[test]
    fn test_enumeration_is_lexicographic() {
        let space = TotalChoices::new(2).unwrap();
        let bits: Vec<Vec<bool>> = space.iter().map(|c| c.bits().collect()).collect();

        assert_eq!(
            bits,
            vec![
                vec![false, false],
                vec![false, true],
                vec![true, false],
                vec![true, true],
            ]
        );
    }

    #[test]
    fn test_empty_space_has_one_choice() {
        let space = TotalChoices::new(0).unwrap();
        assert_eq!(space.count(), 1);

        let choice = space.choice(0);
        assert!(choice.is_empty());
        let weights = ChoiceWeights::new(&[], &[]).unwrap();
        assert_eq!(weights.weights(&choice), vec![1.0]);
    }

    #[test]
    fn test_too_many_facts_rejected() {
        assert!(TotalChoices::new(MAX_FACTS).is_ok());
        assert!(matches!(
            TotalChoices::new(MAX_FACTS + 1),
            Err(InferenceError::TooManyFacts { .. })
        ));
    }

    #[test]
    fn test_weight_product() {
        let fs = facts(&[0.3, 0.7]);
        let space = TotalChoices::new(2).unwrap();

        // θ = (true, false)
        let choice = space.choice(0b10);
        let weights = ChoiceWeights::new(&fs, &[]).unwrap();
        assert_eq!(weights.extreme_points(), 1);
        assert!((weights.weight(&choice, 0) - 0.3 * 0.3).abs() < 1e-12);

        let true_atoms: Vec<_> = choice
            .true_atoms(fs.iter().map(ProbabilisticFact::atom))
            .map(|a| a.as_str())
            .collect();
        assert_eq!(true_atoms, vec!["f0"]);
    }

    #[test]
    fn test_credal_weights_per_extreme_point() {
        let fs = facts(&[0.5]);
        let credal = vec![
            CredalFact::new("c0", 0.1, 0.4).unwrap(),
            CredalFact::new("c1", 0.2, 0.8).unwrap(),
        ];
        let weights = ChoiceWeights::new(&fs, &credal).unwrap();
        assert_eq!(weights.extreme_points(), 4);

        // θ = (f0, c0, not c1)
        let choice = TotalChoices::new(3).unwrap().choice(0b110);
        let expected = [
            0.5 * 0.1 * 0.8, // (lower, lower)
            0.5 * 0.1 * 0.2, // (lower, upper)
            0.5 * 0.4 * 0.8, // (upper, lower)
            0.5 * 0.4 * 0.2, // (upper, upper)
        ];
        for (actual, expected) in weights.weights(&choice).iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-12, "{} vs {}", actual, expected);
        }
    }

    #[test]
    fn test_too_many_credal_facts_rejected() {
        let credal: Vec<CredalFact> = (0..=MAX_CREDAL_FACTS)
            .map(|i| CredalFact::new(format!("c{}", i), 0.1, 0.2).unwrap())
            .collect();

        assert!(matches!(
            ChoiceWeights::new(&[], &credal),
            Err(InferenceError::TooManyCredalFacts { .. })
        ));
    }

    #[test]
    fn test_debug_shows_bits() {
        let choice = TotalChoices::new(3).unwrap().choice(0b101);
        assert_eq!(format!("{:?}", choice), "θ(101)");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn weights_sum_to_one(
            ps in proptest::collection::vec(0.0f64..=1.0, 0..8),
            bounds in proptest::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 0..3),
        ) {
            let fs = facts(&ps);
            let credal: Vec<CredalFact> = bounds
                .iter()
                .enumerate()
                .map(|(i, (x, y))| CredalFact::new(format!("c{}", i), x.min(*y), x.max(*y)).unwrap())
                .collect();
            let weights = ChoiceWeights::new(&fs, &credal).unwrap();
            let space = TotalChoices::new(fs.len() + credal.len()).unwrap();

            for point in 0..weights.extreme_points() {
                let total: f64 = space.iter().map(|c| weights.weight(&c, point)).sum();
                prop_assert!((total - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn parallel_enumeration_visits_each_index_once(len in 0usize..12) {
            let space = TotalChoices::new(len).unwrap();
            let mut indices: Vec<u64> = space.par_iter().map(|c| c.index()).collect();
            indices.sort_unstable();
            let expected: Vec<u64> = (0..space.count()).collect();
            prop_assert_eq!(indices, expected);
        }
    }
}
