//! `pasp show` command implementation

use anyhow::Result;
use pasp_core::choice::TotalChoices;
use pasp_core::target::TargetRules;
use std::path::PathBuf;

use super::load_program;

pub fn run(program_path: PathBuf, targets: bool) -> Result<()> {
    let program = load_program(&program_path)?;

    println!("{}", program);
    println!();

    match TotalChoices::new(program.choice_width()) {
        Ok(space) => println!(
            "{} probabilistic facts, {} credal facts, {} total choices, {} queries",
            program.facts.len(),
            program.credal_facts.len(),
            space.count(),
            program.queries.len()
        ),
        Err(e) => println!("{} choice facts ({})", program.choice_width(), e),
    }

    if targets {
        println!();
        println!("Target rules:");
        for rule in TargetRules::compile(&program.queries).rules() {
            println!("  {}", rule);
        }
    }

    Ok(())
}
