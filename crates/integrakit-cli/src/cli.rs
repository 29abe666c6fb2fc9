// Command line definition
// Global workspace flags plus manifest and depsync subcommands

use clap::{Parser, Subcommand};
use integrakit_lib::BumpKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "integrakit", version)]
#[command(about = "Integration manifest validation and monorepo version bump/sync")]
pub struct Cli {
    /// Workspace root directory
    #[arg(long, global = true, env = "INTEGRAKIT_ROOT", default_value = ".")]
    pub root_dir: PathBuf,

    /// Do not consider devDependencies
    #[arg(long, global = true)]
    pub ignore_dev: bool,

    /// Do not sync peerDependencies
    #[arg(long, global = true)]
    pub ignore_peers: bool,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Integration manifest tools
    Manifest {
        #[command(subcommand)]
        command: ManifestCommands,
    },

    /// List workspace packages
    List,

    /// Bump a package and, optionally, its dependents
    Bump {
        /// Package to bump
        package: String,

        /// Bump kind for the package (patch, minor, major, none); asked when omitted
        #[arg(long)]
        kind: Option<BumpKind>,

        /// Bump kind for every dependent; asked per dependent when omitted
        #[arg(long)]
        dependents_kind: Option<BumpKind>,

        /// Also offer private packages as dependents
        #[arg(long)]
        include_private: bool,

        /// Do not sync dependency ranges afterwards
        #[arg(long)]
        no_sync: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Point local dependency ranges at the current local versions
    Sync {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Fail if any local dependency range is out of sync
    Check,
}

#[derive(Subcommand, Debug)]
pub enum ManifestCommands {
    /// Validate an integration manifest (JSON, or YAML by extension)
    Validate { file: PathBuf },

    /// Validate and print the normalized manifest JSON
    Build {
        file: PathBuf,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the manifest JSON Schema
    Schema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bump() {
        let cli = Cli::try_parse_from([
            "integrakit",
            "--ignore-dev",
            "bump",
            "@acme/core",
            "--kind",
            "minor",
            "--dependents-kind",
            "patch",
        ])
        .unwrap();
        assert!(cli.ignore_dev);
        match cli.command {
            Commands::Bump {
                package,
                kind,
                dependents_kind,
                no_sync,
                ..
            } => {
                assert_eq!(package, "@acme/core");
                assert_eq!(kind, Some(BumpKind::Minor));
                assert_eq!(dependents_kind, Some(BumpKind::Patch));
                assert!(!no_sync);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_bump_kind_rejected() {
        assert!(Cli::try_parse_from(["integrakit", "bump", "core", "--kind", "huge"]).is_err());
    }
}
