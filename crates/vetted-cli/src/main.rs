//! Vetted CLI - review generated hotel summaries from the terminal.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // API keys may live in a local .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Review {
            file,
            llm,
            model,
            learning_interval,
            max_rows,
        } => commands::review::run(file, llm, model, learning_interval, max_rows, cli.verbose),

        Commands::Status { file, json } => commands::status::run(file, json, cli.verbose),

        Commands::Learning { file, json } => commands::learning::run(file, json, cli.verbose),

        Commands::Reset { file, yes } => commands::reset::run(file, yes),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. RUST_LOG overrides the level chosen by `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "vetted=debug,vetted_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
