//! clingo adapter for running the solver as a black box.
//!
//! Each grounded instance is plain program text. Every solve writes it to a temp file and
//! invokes the clingo binary with JSON output, so workers never share solver state.
//!
//! The instance text shows every query, evidence and target atom explicitly, so a `#show`
//! directive in the user's source cannot hide atoms the evaluation needs.

use super::{ConsequenceMode, ConsequenceSet, StableModel, StableModelSolver};
use crate::choice::TotalChoice;
use crate::error::{InferenceError, Result};
use crate::target::TargetRules;
use crate::types::{Atom, Program};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// clingo exit codes for a completed search (SAT, UNSAT, SAT with exhausted search space).
const EXIT_SATISFIABLE: i32 = 10;
const EXIT_UNSATISFIABLE: i32 = 20;
const EXIT_EXHAUSTED: i32 = 30;

/// Solver backed by the clingo executable.
///
/// Model enumeration runs `clingo --outf=2 --models=0` and reads every witness of the JSON
/// report. Consequences add `--enum-mode=brave|cautious` and, with target rules, `--project`
/// onto the target atoms; clingo then reports a sequence of approximations whose last
/// witness is the consequence set.
#[derive(Clone, Debug)]
pub struct ClingoCli {
    /// Executable to run, looked up on `PATH` when relative.
    pub bin_path: PathBuf,
    /// Passed after the fixed flags, before the instance file.
    pub args: Vec<String>,
}

impl ClingoCli {
    pub fn new(bin_path: impl Into<PathBuf>) -> Self {
        ClingoCli {
            bin_path: bin_path.into(),
            args: Vec::new(),
        }
    }

    /// Extra command-line options, e.g. `--configuration=trendy`.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn solve(&self, instance: &ClingoInstance, mode: Option<ConsequenceMode>) -> Result<ClingoReport> {
        let mut temp_file = tempfile::Builder::new()
            .suffix(".lp")
            .tempfile()
            .map_err(|e| InferenceError::SolverFailure(format!("Failed to create temp file: {}", e)))?;
        temp_file
            .write_all(instance.text.as_bytes())
            .map_err(|e| InferenceError::SolverFailure(format!("Failed to write program: {}", e)))?;

        let mut command = Command::new(&self.bin_path);
        // `-W none` silences "atom does not occur in any rule head" and friends.
        command.args(["--outf=2", "-W", "none", "--models=0"]);
        if let Some(mode) = mode {
            command.arg(format!("--enum-mode={}", mode));
            if instance.projected {
                command.arg("--project");
            }
        }
        let output = command
            .args(&self.args)
            .arg(temp_file.path())
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .output()
            .map_err(|e| InferenceError::SolverFailure(format!("Failed to run clingo: {}", e)))?;

        check_exit(output.status.code(), &String::from_utf8_lossy(&output.stderr))?;
        parse_clingo_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Accept only the exit codes of a completed search.
fn check_exit(code: Option<i32>, stderr: &str) -> Result<()> {
    match code {
        Some(EXIT_SATISFIABLE | EXIT_UNSATISFIABLE | EXIT_EXHAUSTED) => Ok(()),
        Some(code) => Err(InferenceError::SolverFailure(format!(
            "clingo failed (exit code {}): {}",
            code,
            stderr.trim()
        ))),
        None => Err(InferenceError::SolverFailure(format!(
            "clingo terminated by signal: {}",
            stderr.trim()
        ))),
    }
}

impl Default for ClingoCli {
    fn default() -> Self {
        ClingoCli::new("clingo")
    }
}

/// Program text for one total choice.
#[derive(Clone, Debug)]
pub struct ClingoInstance {
    text: String,
    projected: bool,
}

impl ClingoInstance {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Subset of clingo's `--outf=2` JSON report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClingoReport {
    result: String,
    #[serde(default)]
    call: Vec<ClingoCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClingoCall {
    #[serde(default)]
    witnesses: Vec<ClingoWitness>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ClingoWitness {
    #[serde(default)]
    value: Vec<String>,
}

impl ClingoReport {
    fn is_unsatisfiable(&self) -> bool {
        self.result == "UNSATISFIABLE"
    }

    fn witnesses(&self) -> impl Iterator<Item = &ClingoWitness> {
        self.call.iter().flat_map(|c| c.witnesses.iter())
    }
}

fn parse_clingo_output(output: &str) -> Result<ClingoReport> {
    serde_json::from_str(output).map_err(|e| InferenceError::OutputParse(e.to_string()))
}

fn atoms(witness: &ClingoWitness) -> impl Iterator<Item = Atom> + '_ {
    witness.value.iter().map(|v| Atom::new(v.as_str()))
}

fn models_from_report(report: &ClingoReport) -> Vec<StableModel> {
    if report.is_unsatisfiable() {
        return Vec::new();
    }
    report.witnesses().map(|w| StableModel::new(atoms(w))).collect()
}

fn consequences_from_report(report: &ClingoReport, mode: ConsequenceMode) -> Option<ConsequenceSet> {
    if report.is_unsatisfiable() {
        return None;
    }
    // Brave/cautious witnesses are successive approximations; the last one is final.
    report
        .witnesses()
        .last()
        .map(|w| ConsequenceSet::new(mode, atoms(w)))
}

/// Render the grounded program text for `choice`.
pub fn build_instance_text(
    program: &Program,
    choice: &TotalChoice,
    targets: Option<&TargetRules>,
) -> String {
    let mut text = program.render();
    for atom in choice.true_atoms(program.choice_atoms()) {
        text.push_str(atom.as_str());
        text.push_str(".\n");
    }
    let mut shown: BTreeSet<&Atom> = program
        .queries
        .iter()
        .flat_map(|q| q.query.iter().chain(&q.evidence))
        .map(|l| &l.atom)
        .collect();
    if let Some(targets) = targets {
        for rule in targets.rules() {
            text.push_str(&rule.to_string());
            text.push('\n');
        }
        for atom in targets.projection() {
            text.push_str(&format!("#project {}.\n", atom));
        }
        shown.extend(targets.projection());
    }
    for atom in shown {
        text.push_str(&format!("#show {} : {}.\n", atom, atom));
    }
    text
}

impl StableModelSolver for ClingoCli {
    type Instance = ClingoInstance;

    fn name(&self) -> &'static str {
        "clingo"
    }

    fn ground_and_prepare(
        &self,
        program: &Program,
        choice: &TotalChoice,
        targets: Option<&TargetRules>,
    ) -> Result<ClingoInstance> {
        Ok(ClingoInstance {
            text: build_instance_text(program, choice, targets),
            projected: targets.is_some_and(|t| !t.is_empty()),
        })
    }

    fn enumerate_models(&self, instance: &ClingoInstance) -> Result<Vec<StableModel>> {
        let report = self.solve(instance, None)?;
        Ok(models_from_report(&report))
    }

    fn consequences(
        &self,
        instance: &ClingoInstance,
        mode: ConsequenceMode,
    ) -> Result<Option<ConsequenceSet>> {
        let report = self.solve(instance, Some(mode))?;
        Ok(consequences_from_report(&report, mode))
    }
}
