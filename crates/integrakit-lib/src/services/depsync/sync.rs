// Dependency sync
// Rewrites local dependency ranges so they point at the current local versions

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::WorkspaceResult;
use crate::models::package::DependencyKind;
use crate::repositories::PackageRepository;

/// `<operator><version>` specs we know how to rewrite
static SIMPLE_RANGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(\^|~|>=|<=|>|<|=)?v?(\d+\.\d+\.\d+(?:[-+][0-9A-Za-z.+-]*)?)$").ok()
});

/// Protocols that resolve locally or elsewhere and are never rewritten
const PASSTHROUGH_PREFIXES: &[&str] = &["workspace:", "file:", "link:", "npm:", "portal:"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    pub ignore_dev: bool,
    pub ignore_peers: bool,
    pub dry_run: bool,
}

impl SyncOptions {
    /// Dependency tables considered under these options
    pub fn kinds(&self) -> Vec<DependencyKind> {
        DependencyKind::ALL
            .into_iter()
            .filter(|k| match k {
                DependencyKind::Dev => !self.ignore_dev,
                DependencyKind::Peer => !self.ignore_peers,
                DependencyKind::Prod => true,
            })
            .collect()
    }
}

/// One rewritten dependency spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncChange {
    pub package: String,
    pub dependency: String,
    pub kind: DependencyKind,
    pub from: String,
    pub to: String,
}

impl std::fmt::Display for SyncChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}: {} -> {}",
            self.package, self.kind, self.dependency, self.from, self.to
        )
    }
}

/// Spec pointing at `version`, keeping the operator of `spec`
///
/// Returns `None` when the spec is not a simple range and must be left alone.
pub fn synced_spec(spec: &str, version: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.is_empty() || spec == "*" || spec == "latest" {
        return None;
    }
    if PASSTHROUGH_PREFIXES.iter().any(|p| spec.starts_with(p)) {
        return None;
    }
    let caps = SIMPLE_RANGE.as_ref()?.captures(spec)?;
    let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    Some(format!("{}{}", prefix, version))
}

/// Changes needed to bring every local dependency in line
pub fn plan_sync(repo: &PackageRepository, options: &SyncOptions) -> Vec<SyncChange> {
    let local_versions: HashMap<&str, &str> = repo
        .packages()
        .iter()
        .filter_map(|p| p.version().map(|v| (p.name(), v)))
        .collect();

    let mut changes = Vec::new();
    for package in repo.packages() {
        for kind in options.kinds() {
            for (dependency, spec) in package.dependencies(kind) {
                let Some(version) = local_versions.get(dependency) else {
                    continue;
                };
                match synced_spec(spec, version) {
                    Some(to) if to != spec => changes.push(SyncChange {
                        package: package.name().to_string(),
                        dependency: dependency.to_string(),
                        kind,
                        from: spec.to_string(),
                        to,
                    }),
                    Some(_) => {}
                    None => log::debug!(
                        "Leaving {} {} \"{}\" untouched in {}",
                        kind,
                        dependency,
                        spec,
                        package.name()
                    ),
                }
            }
        }
    }
    changes
}

/// Apply the sync plan and write changed manifests unless `dry_run`
pub fn sync(repo: &mut PackageRepository, options: &SyncOptions) -> WorkspaceResult<Vec<SyncChange>> {
    let changes = plan_sync(repo, options);

    let mut touched = BTreeSet::new();
    for change in &changes {
        if let Some(package) = repo.get_mut(&change.package) {
            package.set_dependency(change.kind, &change.dependency, &change.to);
            touched.insert(change.package.clone());
        }
    }

    if options.dry_run {
        log::info!("Dry run: {} change(s) not written", changes.len());
        return Ok(changes);
    }

    for name in &touched {
        repo.save(name)?;
    }
    log::info!(
        "Synced {} dependency spec(s) across {} package(s)",
        changes.len(),
        touched.len()
    );
    Ok(changes)
}

/// Sync plan without touching anything; empty means in sync
pub fn check(repo: &PackageRepository, options: &SyncOptions) -> WorkspaceResult<Vec<SyncChange>> {
    let changes = plan_sync(repo, options);
    if !changes.is_empty() {
        log::warn!("{} dependency spec(s) out of sync", changes.len());
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::package::PackageManifest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_synced_spec() {
        assert_eq!(synced_spec("^1.2.0", "1.3.0").as_deref(), Some("^1.3.0"));
        assert_eq!(synced_spec("~1.2.0", "1.3.0").as_deref(), Some("~1.3.0"));
        assert_eq!(synced_spec(">=1.2.0", "1.3.0").as_deref(), Some(">=1.3.0"));
        assert_eq!(synced_spec("1.2.0", "1.3.0").as_deref(), Some("1.3.0"));
        assert_eq!(synced_spec("^1.2.0-beta.1", "1.3.0").as_deref(), Some("^1.3.0"));
        assert_eq!(synced_spec("v1.2.0", "1.3.0").as_deref(), Some("1.3.0"));

        assert_eq!(synced_spec("workspace:*", "1.3.0"), None);
        assert_eq!(synced_spec("workspace:^1.2.0", "1.3.0"), None);
        assert_eq!(synced_spec("file:../core", "1.3.0"), None);
        assert_eq!(synced_spec("*", "1.3.0"), None);
        assert_eq!(synced_spec("", "1.3.0"), None);
        assert_eq!(synced_spec(">=1.0.0 <2.0.0", "1.3.0"), None);
        assert_eq!(synced_spec("^1 || ^2", "1.3.0"), None);
    }

    #[test]
    fn test_kinds() {
        let all = SyncOptions::default().kinds();
        assert_eq!(all, DependencyKind::ALL.to_vec());
        let prod_only = SyncOptions {
            ignore_dev: true,
            ignore_peers: true,
            dry_run: false,
        }
        .kinds();
        assert_eq!(prod_only, vec![DependencyKind::Prod]);
    }

    fn fixture(root: &Path) -> PackageRepository {
        let packages = [
            ("core", r#"{"name": "core", "version": "2.0.0"}"#),
            (
                "client",
                r#"{"name": "client", "version": "1.0.0", "dependencies": {"core": "^1.0.0", "zod": "^3.0.0"}, "devDependencies": {"core": "~1.0.0"}}"#,
            ),
            (
                "plugin",
                r#"{"name": "plugin", "version": "0.1.0", "peerDependencies": {"client": "^1.0.0", "core": "workspace:*"}}"#,
            ),
        ];
        let mut manifests = Vec::new();
        for (dir, json) in packages {
            let path = root.join(dir).join("package.json");
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, json).unwrap();
            manifests.push(PackageManifest::read(&path).unwrap());
        }
        PackageRepository::from_packages(root, manifests)
    }

    #[test]
    fn test_plan_sync() {
        let tmp = TempDir::new().unwrap();
        let repo = fixture(tmp.path());

        let changes = plan_sync(&repo, &SyncOptions::default());
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].to_string(), "client dependencies core: ^1.0.0 -> ^2.0.0");
        assert_eq!(changes[1].to_string(), "client devDependencies core: ~1.0.0 -> ~2.0.0");

        let no_dev = SyncOptions {
            ignore_dev: true,
            ..SyncOptions::default()
        };
        assert_eq!(plan_sync(&repo, &no_dev).len(), 1);
    }

    #[test]
    fn test_sync_writes_and_converges() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());

        let changes = sync(&mut repo, &SyncOptions::default()).unwrap();
        assert_eq!(changes.len(), 2);
        assert!(check(&repo, &SyncOptions::default()).unwrap().is_empty());

        let written = PackageManifest::read(&tmp.path().join("client/package.json")).unwrap();
        assert_eq!(written.dependency(DependencyKind::Prod, "core"), Some("^2.0.0"));
        assert_eq!(written.dependency(DependencyKind::Prod, "zod"), Some("^3.0.0"));
        assert_eq!(written.dependency(DependencyKind::Dev, "core"), Some("~2.0.0"));
    }

    #[test]
    fn test_dry_run_leaves_files() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let before = fs::read_to_string(tmp.path().join("client/package.json")).unwrap();

        let options = SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        };
        assert_eq!(sync(&mut repo, &options).unwrap().len(), 2);

        let after = fs::read_to_string(tmp.path().join("client/package.json")).unwrap();
        assert_eq!(before, after);
    }
}
