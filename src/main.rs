use std::process::ExitCode;

use clap::Parser;
use privat_rates::{Cli, retrieve_rates};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match retrieve_rates(&args) {
        Ok(days) => match serde_json::to_string_pretty(&days) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("failed to print rates: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            debug!(error = ?e, "no rates retrieved");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
