//! `pasp infer` command implementation

use anyhow::{bail, Context, Result};
use pasp_core::{
    ClingoCli, InferenceEngine, InferenceReport, PaspConfig, Program, ReferenceSolver, Semantics,
    StableModelSolver, Strategy,
};
use std::path::PathBuf;
use tracing::debug;

use super::load_program;

/// Command-line values that take precedence over the loaded configuration.
#[derive(Debug, Default)]
pub struct Overrides {
    pub strategy: Option<Strategy>,
    pub semantics: Option<Semantics>,
    pub workers: Option<usize>,
    pub clingo: Option<String>,
}

impl Overrides {
    fn apply(self, mut config: PaspConfig) -> Result<PaspConfig> {
        if let Some(strategy) = self.strategy {
            config.inference.strategy = strategy;
        }
        if let Some(semantics) = self.semantics {
            config.inference.semantics = semantics;
            // Max-ent needs the model tallies.
            if semantics == Semantics::MaxEnt && self.strategy.is_none() {
                config.inference.strategy = Strategy::ModelCounting;
            }
        }
        if let Some(workers) = self.workers {
            config.execution.workers = workers;
        }
        if let Some(clingo) = self.clingo {
            config.solver.clingo_binary = clingo;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn run(
    program_path: PathBuf,
    overrides: Overrides,
    reference: bool,
    format: String,
    config: PaspConfig,
) -> Result<()> {
    if !matches!(format.as_str(), "human" | "json") {
        bail!("Unknown output format: {} (expected human or json)", format);
    }

    let config = overrides.apply(config)?;
    let program = load_program(&program_path)?;
    debug!(
        program = %program_path.display(),
        facts = program.facts.len(),
        credal_facts = program.credal_facts.len(),
        queries = program.queries.len(),
        "Loaded program"
    );

    let report = if reference {
        infer(ReferenceSolver::new(), config, &program)?
    } else {
        let solver = ClingoCli::new(&config.solver.clingo_binary)
            .with_args(config.solver.extra_args.clone());
        infer(solver, config, &program)?
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", report),
    }

    Ok(())
}

fn infer<S: StableModelSolver>(
    solver: S,
    config: PaspConfig,
    program: &Program,
) -> Result<InferenceReport> {
    let name = solver.name();
    InferenceEngine::new(solver, config)
        .infer(program)
        .with_context(|| format!("Inference with {} failed", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_ent_switches_default_strategy() {
        let overrides = Overrides {
            semantics: Some(Semantics::MaxEnt),
            ..Overrides::default()
        };
        let config = overrides.apply(PaspConfig::default()).unwrap();

        assert_eq!(config.inference.strategy, Strategy::ModelCounting);
    }

    #[test]
    fn explicit_conflicting_strategy_rejected() {
        let overrides = Overrides {
            strategy: Some(Strategy::Consequences),
            semantics: Some(Semantics::MaxEnt),
            ..Overrides::default()
        };

        assert!(overrides.apply(PaspConfig::default()).is_err());
    }

    #[test]
    fn flags_override_config() {
        let overrides = Overrides {
            workers: Some(1),
            clingo: Some("/opt/clingo/bin/clingo".into()),
            ..Overrides::default()
        };
        let config = overrides.apply(PaspConfig::default()).unwrap();

        assert_eq!(config.execution.workers, 1);
        assert_eq!(config.solver.clingo_binary, "/opt/clingo/bin/clingo");
    }
}
