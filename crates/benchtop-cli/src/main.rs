//! Benchtop CLI - preprocessing-to-modeling workbench.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Install the log subscriber. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "benchtop=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Profile {
            input,
            detect_dates,
            json,
        } => commands::profile::run(input, detect_dates, json),

        Commands::Clean {
            input,
            cleaning,
            output,
            json,
        } => commands::clean::run(input, cleaning, output, json),

        Commands::Train {
            input,
            cleaning,
            training,
            output_dir,
            json,
        } => commands::train::run(input, cleaning, training, output_dir, json),

        Commands::Report {
            input,
            cleaning,
            target,
            training,
            title,
            head_rows,
            output_dir,
        } => commands::report::run(
            input, cleaning, target, training, title, head_rows, output_dir,
        ),

        Commands::Predict {
            input,
            model,
            output,
        } => commands::predict::run(input, model, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
