//! rscxml-cli - Command-line interface for rscxml
//!
//! Compiles charts to table JSON, runs them against the reference host,
//! and provides an interactive REPL.

mod commands;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rscxml-cli")]
#[command(about = "Command-line interface for the rscxml statechart compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive REPL
    Repl {
        /// Chart to load on startup
        chart: Option<PathBuf>,
    },

    /// Compile a chart document to descriptor tables
    Compile {
        /// Chart JSON file
        chart: PathBuf,

        /// Write the table JSON here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Summarize the compiled tables of a chart
    Inspect {
        /// Chart JSON file
        chart: PathBuf,
    },

    /// Compile a chart and feed it a list of events
    Run {
        /// Chart JSON file
        chart: PathBuf,

        /// Events to apply in order (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        events: Vec<String>,

        /// Initial datamodel JSON
        #[arg(short, long)]
        data: Option<String>,

        /// Step budget per quiescence run
        #[arg(long, default_value_t = 256)]
        max_steps: usize,

        /// Print the action trace after the run
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => return repl::run(None),
        Some(Commands::Repl { chart }) => return repl::run(chart),
        Some(Commands::Compile { chart, out, pretty }) => {
            commands::compile(&chart, out.as_deref(), pretty)
        }
        Some(Commands::Inspect { chart }) => commands::inspect(&chart),
        Some(Commands::Run {
            chart,
            events,
            data,
            max_steps,
            trace,
        }) => commands::run(&chart, &events, data.as_deref(), max_steps, trace),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {}", "Error".red(), err);
            std::process::exit(1);
        }
    }
}
