mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::commands::batch_helpers::Settings;
use cli::output::Verbosity;
use cli::{Cli, Commands};
use crate::core::models::outcome::BatchStatus;

fn main() {
    let args = Cli::parse();

    init_logging(args.verbose);
    cli::output::init(if args.quiet {
        Verbosity::Quiet
    } else if args.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });
    cli::context::init(args.config.as_deref());

    let settings = Settings {
        engine: args.engine.clone(),
        timeout: args.timeout,
        json: args.json,
    };

    let result = match &args.command {
        Commands::Encrypt(batch) => cli::commands::encrypt::execute(batch, &settings),
        Commands::Decrypt(batch) => cli::commands::decrypt::execute(batch, &settings),
        Commands::Process(batch) => cli::commands::process::execute(batch, &settings),
        Commands::Keys { action } => {
            cli::commands::keys::execute(action).map(|()| BatchStatus::Succeeded)
        }
    };

    match result {
        Ok(BatchStatus::Succeeded) => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            cli::output::error(&format!("Error: {e}"));
            std::process::exit(1);
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings only, or debug
/// output for this crate with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "agebatch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
