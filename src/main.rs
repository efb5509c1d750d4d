//! semgraph CLI entry point.

use clap::Parser;
use semgraph::cli::{self, Cli, Commands, EXIT_ERROR};
use semgraph::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Analyze(args) => cli::run_analyze(args),
        Commands::Languages => cli::run_languages(),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
