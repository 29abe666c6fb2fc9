// Command handlers
// Shared context, response envelope and dispatch

pub mod manifest;
pub mod workspace;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use integrakit_lib::{DefinitionError, WorkspaceConfig};

// ============================================================================
// Response Types
// ============================================================================

/// Envelope printed for `--json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(data: Option<T>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }

    pub fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

// ============================================================================
// Failures
// ============================================================================

/// Failure that carries a payload for the `--json` envelope
#[derive(Debug)]
pub struct DetailedError {
    pub message: String,
    pub data: Value,
}

impl fmt::Display for DetailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DetailedError {}

/// Payload reported next to an error: validation issues or command details
pub fn error_data(err: &anyhow::Error) -> Option<Value> {
    if let Some(detailed) = err.downcast_ref::<DetailedError>() {
        return Some(detailed.data.clone());
    }
    err.downcast_ref::<DefinitionError>()
        .filter(|def| !def.issues().is_empty())
        .and_then(|def| serde_json::to_value(def.issues()).ok())
}

/// Print the failure envelope for `--json` to stdout
pub fn print_failure(err: &anyhow::Error) -> Result<()> {
    JsonResponse::failed(error_data(err), format!("{:#}", err)).print()
}

// ============================================================================
// Context
// ============================================================================

/// Global flags merged with integrakit.toml
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub json: bool,
    pub ignore_dev: bool,
    pub ignore_peers: bool,
    pub include_private: bool,
}

impl Context {
    /// A flag set on the command line wins over the file
    pub fn new(cli: &Cli, config: &WorkspaceConfig) -> Self {
        Self {
            root: cli.root_dir.clone(),
            json: cli.json,
            ignore_dev: cli.ignore_dev || config.sync.ignore_dev,
            ignore_peers: cli.ignore_peers || config.sync.ignore_peers,
            include_private: config.bump.include_private,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = WorkspaceConfig::load(&cli.root_dir)?;
    let ctx = Context::new(&cli, &config);
    log::debug!("Context: {:?}", ctx);

    match cli.command {
        Commands::Manifest { command } => manifest::execute(&ctx, command),
        Commands::List => workspace::list(&ctx),
        Commands::Bump {
            package,
            kind,
            dependents_kind,
            include_private,
            no_sync,
            dry_run,
        } => workspace::bump(
            &ctx,
            workspace::BumpArgs {
                package,
                kind,
                dependents_kind,
                include_private: include_private || ctx.include_private,
                no_sync,
                dry_run,
            },
        ),
        Commands::Sync { dry_run } => workspace::sync(&ctx, dry_run),
        Commands::Check => workspace::check(&ctx),
    }
}
