// Workspace commands
// list / bump / sync / check over the packages of a monorepo

use anyhow::Result;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use serde::Serialize;

use super::{Context, DetailedError, JsonResponse};
use integrakit_lib::services::depsync::{self, BumpOptions, BumpPrompt, FixedBump, SyncChange, SyncOptions};
use integrakit_lib::{BumpKind, PackageRepository, WorkspaceError, WorkspaceResult};

// ============================================================================
// list
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageSummary {
    name: String,
    version: Option<String>,
    private: bool,
    path: String,
}

pub fn list(ctx: &Context) -> Result<()> {
    let repo = PackageRepository::discover(&ctx.root)?;
    let packages: Vec<PackageSummary> = repo
        .packages()
        .iter()
        .map(|p| PackageSummary {
            name: p.name().to_string(),
            version: p.version().map(str::to_string),
            private: p.is_private(),
            path: repo.relative_dir(p).display().to_string(),
        })
        .collect();

    if ctx.json {
        return JsonResponse::ok(packages).print();
    }
    for p in &packages {
        let private = if p.private { "\tprivate" } else { "" };
        println!(
            "{}\t{}\t{}{}",
            p.name.bold(),
            p.version.as_deref().unwrap_or("-"),
            p.path,
            private
        );
    }
    Ok(())
}

// ============================================================================
// bump
// ============================================================================

#[derive(Debug, Clone)]
pub struct BumpArgs {
    pub package: String,
    pub kind: Option<BumpKind>,
    pub dependents_kind: Option<BumpKind>,
    pub include_private: bool,
    pub no_sync: bool,
    pub dry_run: bool,
}

/// Asks on the terminal, except where an answer was given as a flag
struct SelectPrompt {
    target: Option<BumpKind>,
    dependents: Option<BumpKind>,
    asked: usize,
}

impl SelectPrompt {
    fn new(target: Option<BumpKind>, dependents: Option<BumpKind>) -> Self {
        Self {
            target,
            dependents,
            asked: 0,
        }
    }
}

impl BumpPrompt for SelectPrompt {
    fn choose(&mut self, package: &str, current_version: &str) -> WorkspaceResult<BumpKind> {
        self.asked += 1;
        let preset = if self.asked == 1 {
            self.target
        } else {
            self.dependents
        };
        if let Some(kind) = preset {
            return Ok(kind);
        }

        let items: Vec<String> = BumpKind::ALL
            .iter()
            .map(|kind| match depsync::bump_version(current_version, *kind) {
                Ok(next) if *kind != BumpKind::None => format!("{} ({})", kind, next),
                _ => kind.to_string(),
            })
            .collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Bump {} ({})", package, current_version))
            .items(&items)
            .default(0)
            .interact()
            .map_err(|e| {
                WorkspaceError::Message(format!(
                    "Cannot ask for the bump of {}: {} (use --kind/--dependents-kind)",
                    package, e
                ))
            })?;
        Ok(BumpKind::ALL[selection])
    }
}

pub fn bump(ctx: &Context, args: BumpArgs) -> Result<()> {
    let mut repo = PackageRepository::discover(&ctx.root)?;
    let mut prompt: Box<dyn BumpPrompt> = match (args.kind, args.dependents_kind) {
        (Some(target), Some(dependents)) => Box::new(FixedBump::new(target, dependents)),
        (target, dependents) => Box::new(SelectPrompt::new(target, dependents)),
    };
    let options = BumpOptions {
        ignore_dev: ctx.ignore_dev,
        ignore_peers: ctx.ignore_peers,
        include_private: args.include_private,
        no_sync: args.no_sync,
        dry_run: args.dry_run,
    };

    let report = depsync::bump(&mut repo, &args.package, prompt.as_mut(), &options)?;

    if ctx.json {
        return JsonResponse::ok(report).print();
    }
    if report.versions.is_empty() {
        println!("Nothing to bump");
    }
    for change in &report.versions {
        println!(
            "{} {} -> {} ({})",
            change.package.bold(),
            change.from,
            change.to.green(),
            change.kind
        );
    }
    print_changes(&report.sync);
    if args.dry_run {
        println!("{}", "Dry run: nothing written".yellow());
    }
    Ok(())
}

// ============================================================================
// sync / check
// ============================================================================

fn sync_options(ctx: &Context, dry_run: bool) -> SyncOptions {
    SyncOptions {
        ignore_dev: ctx.ignore_dev,
        ignore_peers: ctx.ignore_peers,
        dry_run,
    }
}

fn print_changes(changes: &[SyncChange]) {
    for change in changes {
        println!(
            "{} {} {}: {} -> {}",
            change.package.bold(),
            change.kind,
            change.dependency,
            change.from,
            change.to.green()
        );
    }
}

pub fn sync(ctx: &Context, dry_run: bool) -> Result<()> {
    let mut repo = PackageRepository::discover(&ctx.root)?;
    let changes = depsync::sync(&mut repo, &sync_options(ctx, dry_run))?;

    if ctx.json {
        return JsonResponse::ok(changes).print();
    }
    if changes.is_empty() {
        println!("Already in sync");
        return Ok(());
    }
    print_changes(&changes);
    if dry_run {
        println!("{}", "Dry run: nothing written".yellow());
    } else {
        println!("Updated {} dependency spec(s)", changes.len());
    }
    Ok(())
}

pub fn check(ctx: &Context) -> Result<()> {
    let repo = PackageRepository::discover(&ctx.root)?;
    let changes = depsync::check(&repo, &sync_options(ctx, true))?;

    if changes.is_empty() {
        if ctx.json {
            JsonResponse::ok(changes).print()?;
        } else {
            println!("All local dependencies are in sync");
        }
        return Ok(());
    }

    if !ctx.json {
        print_changes(&changes);
    }
    let err = WorkspaceError::OutOfSync {
        count: changes.len(),
    };
    Err(DetailedError {
        message: err.to_string(),
        data: serde_json::to_value(&changes)?,
    }
    .into())
}
