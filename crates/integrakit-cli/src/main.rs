// Integrakit CLI
// Entry point: argument parsing, logging setup and error reporting

mod cli;
mod commands;

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use integrakit_lib::DefinitionError;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // `log` records from the library are forwarded by tracing-subscriber's log bridge
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Print an error to stderr, one line per validation issue when it has them
fn report(err: &anyhow::Error) {
    if let Some(def) = err.downcast_ref::<DefinitionError>() {
        if !def.issues().is_empty() {
            eprintln!("{} {} issue(s) found", "error:".red().bold(), def.issues().len());
            for issue in def.issues() {
                eprintln!("{}", issue);
            }
            return;
        }
    }
    eprintln!("{} {:#}", "error:".red().bold(), err);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(root = %cli.root_dir.display(), "integrakit starting");
    let json = cli.json;

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json && commands::print_failure(&err).is_err() {
                eprintln!("{} failed to render JSON error", "error:".red().bold());
            }
            report(&err);
            ExitCode::FAILURE
        }
    }
}
