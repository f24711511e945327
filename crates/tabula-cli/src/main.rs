//! Tabula CLI
//!
//! Command-line front end for inspecting predicate compilation and running
//! raw queries against a store.

use clap::{Parser, Subcommand};
use tabula_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula - object storage over SQLite", long_about = None)]
struct Cli {
    /// Emit development logs on stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile a JSON predicate into a SQL clause
    Compile(commands::compile::CompileArgs),
    /// Run a raw SQL statement and print rows as JSON lines
    Query(commands::query::QueryArgs),
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Compile(args) => commands::compile::execute(args),
        Commands::Query(args) => commands::query::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
