//! Target rules that reify query satisfaction.
//!
//! For a query ℙ(Q | E) with Q = {a, not b} and E = {not c, d}, query `i` compiles to
//!
//! ```text
//! __query_e_i :- not c, d.
//! __query_q_i :- a, not b.
//! __query_r_i :- __query_q_i, __query_e_i.
//! __query_t_i :- not __query_q_i, __query_e_i.
//! ```
//!
//! `r` holds in a stable model iff the model satisfies both Q and E, `t` iff it satisfies E
//! but fails Q. Cautious and brave membership of `r` and `t` then give conditions 1 to 4
//! without enumerating models.

use crate::types::{Atom, Literal, Query, Rule, RESERVED_PREFIX};

/// The two projected atoms of one compiled query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTarget {
    /// `r`: the model satisfies Q and E.
    pub confirm: Atom,
    /// `t`: the model satisfies E but not Q.
    pub refute: Atom,
}

/// Auxiliary rules and projected atoms for a list of queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetRules {
    rules: Vec<Rule>,
    targets: Vec<QueryTarget>,
}

fn reserved(kind: char, i: usize) -> Atom {
    Atom::new(format!("{}{}_{}", RESERVED_PREFIX, kind, i))
}

impl TargetRules {
    /// Compile four rules per query, in query order.
    pub fn compile(queries: &[Query]) -> Self {
        let mut rules = Vec::with_capacity(4 * queries.len());
        let mut targets = Vec::with_capacity(queries.len());

        for (i, query) in queries.iter().enumerate() {
            let e = reserved('e', i);
            let q = reserved('q', i);
            let r = reserved('r', i);
            let t = reserved('t', i);

            rules.push(Rule::new(e.clone(), query.evidence.iter().cloned()));
            rules.push(Rule::new(q.clone(), query.query.iter().cloned()));
            rules.push(Rule::new(
                r.clone(),
                [Literal::pos(q.clone()), Literal::pos(e.clone())],
            ));
            rules.push(Rule::new(t.clone(), [Literal::neg(q), Literal::pos(e)]));

            targets.push(QueryTarget {
                confirm: r,
                refute: t,
            });
        }

        TargetRules { rules, targets }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Targets in query order.
    pub fn targets(&self) -> &[QueryTarget] {
        &self.targets
    }

    /// Atoms the solver should project consequences onto.
    pub fn projection(&self) -> impl Iterator<Item = &Atom> {
        self.targets
            .iter()
            .flat_map(|t| [&t.confirm, &t.refute])
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
