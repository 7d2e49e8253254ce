//! pasp CLI - exact inference for probabilistic answer-set programs
//!
//! Command-line interface for answering conditional queries under the credal semantics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pasp_core::{Semantics, Strategy};
use std::path::PathBuf;

mod commands;

/// pasp: exact credal inference for probabilistic ASP
///
/// Enumerates every total choice of the probabilistic facts and reports lower and upper
/// probabilities for each query.
#[derive(Parser)]
#[command(name = "pasp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "PASP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer every query of a program
    Infer {
        /// Program file (JSON)
        program: PathBuf,

        /// Evaluation strategy (model_counting, consequences)
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Probability semantics (credal, max_ent)
        #[arg(long)]
        semantics: Option<Semantics>,

        /// Worker threads (0 = available parallelism, 1 = sequential)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Path to the clingo binary
        #[arg(long)]
        clingo: Option<String>,

        /// Use the built-in reference solver instead of clingo
        #[arg(long, default_value_t = false)]
        reference: bool,

        /// Output format (human, json)
        #[arg(short, long, default_value = "human")]
        format: String,
    },

    /// Print a program and its total choice space
    Show {
        /// Program file (JSON)
        program: PathBuf,

        /// Also print the compiled query target rules
        #[arg(long, default_value_t = false)]
        targets: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config)?;

    // Initialize logging; results go to stdout, logs to stderr.
    let filter = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json_output {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Infer {
            program,
            strategy,
            semantics,
            workers,
            clingo,
            reference,
            format,
        } => commands::infer::run(
            program,
            commands::infer::Overrides {
                strategy,
                semantics,
                workers,
                clingo,
            },
            reference,
            format,
            config,
        ),
        Commands::Show { program, targets } => commands::show::run(program, targets),
    }
}
