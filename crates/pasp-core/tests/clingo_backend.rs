//! Inference through the clingo subprocess adapter.
//!
//! These tests need a `clingo` binary on `PATH` (or in `PASP_CLINGO`) and return early
//! without one.

use pasp_core::{
    ClingoCli, InferenceEngine, InferenceError, Interval, Literal, PaspConfig, ProbabilisticFact,
    Program, Query, ReferenceSolver, Rule, Strategy,
};
use std::process::Command;

fn clingo() -> Option<ClingoCli> {
    let bin = std::env::var("PASP_CLINGO").unwrap_or_else(|_| "clingo".into());
    let available = Command::new(&bin)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("skipping: {} not available", bin);
        return None;
    }
    Some(ClingoCli::new(bin))
}

fn config(strategy: Strategy) -> PaspConfig {
    PaspConfig::builder()
        .strategy(strategy)
        .workers(2)
        .build()
        .unwrap()
}

fn program() -> Program {
    Program::new()
        .fact(ProbabilisticFact::new("x", 0.5).unwrap())
        .fact(ProbabilisticFact::new("y", 0.2).unwrap())
        .rule(Rule::new("q", [Literal::pos("x"), Literal::neg("r")]))
        .rule(Rule::new("r", [Literal::pos("x"), Literal::neg("q")]))
        .rule(Rule::new("q", [Literal::pos("y")]))
        .query(Query::new([Literal::pos("q")]))
        .query(Query::new([Literal::pos("q")]).given([Literal::pos("x")]))
        .query(Query::new([Literal::neg("q")]).given([Literal::pos("r")]))
}

#[test]
fn clingo_matches_reference_solver() {
    let Some(solver) = clingo() else { return };
    let program = program();

    for strategy in [Strategy::ModelCounting, Strategy::Consequences] {
        let expected = InferenceEngine::new(ReferenceSolver::new(), config(strategy))
            .infer(&program)
            .unwrap();
        let actual = InferenceEngine::new(solver.clone(), config(strategy))
            .infer(&program)
            .unwrap();

        for (e, a) in expected.intervals().iter().zip(actual.intervals()) {
            assert!(e.approx_eq(&a, 1e-9), "{}: expected {}, got {}", strategy, e, a);
        }
    }
}

#[test]
fn clingo_reads_source_text() {
    let Some(solver) = clingo() else { return };
    let program = Program::new()
        .with_source("b :- a.\nc :- not b.")
        .fact(ProbabilisticFact::new("a", 0.4).unwrap())
        .query(Query::new([Literal::pos("c")]));

    let report = InferenceEngine::new(solver, config(Strategy::Consequences))
        .infer(&program)
        .unwrap();
    assert!(report.results[0]
        .interval
        .approx_eq(&Interval::point(0.6), 1e-9));
}

#[test]
fn user_show_directive_is_ignored() {
    let Some(solver) = clingo() else { return };
    let program = Program::new()
        .with_source("b :- a.\nc :- not b.\n#show b/0.")
        .fact(ProbabilisticFact::new("a", 0.4).unwrap())
        .query(Query::new([Literal::pos("c")]).given([Literal::neg("a")]));

    for strategy in [Strategy::ModelCounting, Strategy::Consequences] {
        let report = InferenceEngine::new(solver.clone(), config(strategy))
            .infer(&program)
            .unwrap();
        assert!(report.results[0]
            .interval
            .approx_eq(&Interval::point(1.0), 1e-9));
    }
}

#[test]
fn syntax_error_fails_the_run() {
    let Some(solver) = clingo() else { return };
    let program = Program::new()
        .with_source("this is not a program")
        .fact(ProbabilisticFact::new("a", 0.4).unwrap())
        .query(Query::new([Literal::pos("a")]));

    let result = InferenceEngine::new(solver, config(Strategy::ModelCounting)).infer(&program);
    assert!(matches!(result, Err(InferenceError::SolverFailure(_))));
}
