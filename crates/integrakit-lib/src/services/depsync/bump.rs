// Version bump
// Bumps a package, walks its dependents and syncs the ranges that point at them

use node_semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use super::sync::{sync, SyncChange, SyncOptions};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::models::package::DependencyKind;
use crate::models::version::{BumpKind, VersionChange};
use crate::repositories::PackageRepository;

// ============================================================================
// Version arithmetic
// ============================================================================

/// Next version of `current` for `kind`
///
/// Prerelease versions are released rather than incremented when the bump
/// would land on the same `major.minor.patch` (`1.3.0-rc.1` minor is `1.3.0`).
/// Build metadata never survives a bump.
pub fn bump_version(current: &str, kind: BumpKind) -> WorkspaceResult<String> {
    if kind == BumpKind::None {
        return Ok(current.to_string());
    }

    let mut next = Version::parse(current).map_err(|e| WorkspaceError::InvalidVersion {
        version: current.to_string(),
        reason: e.to_string(),
    })?;
    let prerelease = !next.pre_release.is_empty();

    match kind {
        BumpKind::Patch => {
            if !prerelease {
                next.patch += 1;
            }
        }
        BumpKind::Minor => {
            if !(prerelease && next.patch == 0) {
                next.minor += 1;
            }
            next.patch = 0;
        }
        BumpKind::Major => {
            if !(prerelease && next.minor == 0 && next.patch == 0) {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
        }
        BumpKind::None => {}
    }
    next.pre_release.clear();
    next.build.clear();

    Ok(next.to_string())
}

// ============================================================================
// Prompting
// ============================================================================

/// Source of bump decisions
///
/// The target package is always asked first, then each dependent once.
pub trait BumpPrompt {
    fn choose(&mut self, package: &str, current_version: &str) -> WorkspaceResult<BumpKind>;
}

/// Non-interactive answers: one kind for the target, one for every dependent
#[derive(Debug, Clone)]
pub struct FixedBump {
    target: BumpKind,
    dependents: BumpKind,
    asked: usize,
}

impl FixedBump {
    pub fn new(target: BumpKind, dependents: BumpKind) -> Self {
        Self {
            target,
            dependents,
            asked: 0,
        }
    }
}

impl BumpPrompt for FixedBump {
    fn choose(&mut self, _package: &str, _current_version: &str) -> WorkspaceResult<BumpKind> {
        self.asked += 1;
        Ok(if self.asked == 1 {
            self.target
        } else {
            self.dependents
        })
    }
}

// ============================================================================
// Workflow
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpOptions {
    /// devDependencies do not make a package a dependent, and are not synced
    pub ignore_dev: bool,
    /// peerDependencies are not synced
    pub ignore_peers: bool,
    /// Offer private packages as dependents
    pub include_private: bool,
    pub no_sync: bool,
    pub dry_run: bool,
}

impl BumpOptions {
    fn dependent_kinds(&self) -> Vec<DependencyKind> {
        DependencyKind::ALL
            .into_iter()
            .filter(|k| *k != DependencyKind::Dev || !self.ignore_dev)
            .collect()
    }

    fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            ignore_dev: self.ignore_dev,
            ignore_peers: self.ignore_peers,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BumpReport {
    pub versions: Vec<VersionChange>,
    pub sync: Vec<SyncChange>,
}

/// Bump `target` and, transitively, whichever dependents the prompt picks
///
/// New versions are all computed before anything is written, so an invalid
/// version anywhere leaves the workspace untouched.
pub fn bump(
    repo: &mut PackageRepository,
    target: &str,
    prompt: &mut dyn BumpPrompt,
    options: &BumpOptions,
) -> WorkspaceResult<BumpReport> {
    let target_package = repo.find(target)?;
    let target_name = target_package.name().to_string();
    let target_version = target_package.require_version()?.to_string();

    let mut decisions: Vec<(String, BumpKind)> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    let kind = prompt.choose(&target_name, &target_version)?;
    log::debug!("{} -> {}", target_name, kind);
    visited.insert(target_name.clone());
    decisions.push((target_name.clone(), kind));
    if kind != BumpKind::None {
        queue.push_back(target_name);
    }

    let kinds = options.dependent_kinds();
    while let Some(bumped) = queue.pop_front() {
        let dependents: Vec<(String, String)> = repo
            .packages()
            .iter()
            .filter(|p| !visited.contains(p.name()))
            .filter(|p| p.depends_on(&kinds, &bumped))
            .filter(|p| {
                if p.is_private() && !options.include_private {
                    log::debug!("Skipping private dependent {}", p.name());
                    return false;
                }
                true
            })
            .map(|p| {
                (
                    p.name().to_string(),
                    p.version().unwrap_or_default().to_string(),
                )
            })
            .collect();

        for (name, version) in dependents {
            visited.insert(name.clone());
            let kind = prompt.choose(&name, &version)?;
            log::debug!("{} (depends on {}) -> {}", name, bumped, kind);
            if kind != BumpKind::None {
                queue.push_back(name.clone());
            }
            decisions.push((name, kind));
        }
    }

    let mut versions = Vec::new();
    for (name, kind) in decisions.iter().filter(|(_, k)| *k != BumpKind::None) {
        let from = repo.find(name)?.require_version()?.to_string();
        let to = bump_version(&from, *kind)?;
        versions.push(VersionChange {
            package: name.clone(),
            kind: *kind,
            from,
            to,
        });
    }

    for change in &versions {
        if let Some(package) = repo.get_mut(&change.package) {
            package.set_version(&change.to);
        }
    }
    if !options.dry_run {
        for change in &versions {
            repo.save(&change.package)?;
        }
    }
    for change in &versions {
        log::info!("{}: {} -> {}", change.package, change.from, change.to);
    }

    let sync_changes = if options.no_sync {
        Vec::new()
    } else {
        sync(repo, &options.sync_options())?
    };

    Ok(BumpReport {
        versions,
        sync: sync_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::package::PackageManifest;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_bump_release_versions() {
        assert_eq!(bump_version("1.2.3", BumpKind::Patch).unwrap(), "1.2.4");
        assert_eq!(bump_version("1.2.3", BumpKind::Minor).unwrap(), "1.3.0");
        assert_eq!(bump_version("1.2.3", BumpKind::Major).unwrap(), "2.0.0");
        assert_eq!(bump_version("1.2.3", BumpKind::None).unwrap(), "1.2.3");
        assert_eq!(bump_version("0.0.9", BumpKind::Patch).unwrap(), "0.0.10");
    }

    #[test]
    fn test_bump_prerelease_versions() {
        assert_eq!(bump_version("1.2.3-beta.1", BumpKind::Patch).unwrap(), "1.2.3");
        assert_eq!(bump_version("1.3.0-rc.1", BumpKind::Minor).unwrap(), "1.3.0");
        assert_eq!(bump_version("1.2.3-rc.1", BumpKind::Minor).unwrap(), "1.3.0");
        assert_eq!(bump_version("2.0.0-alpha", BumpKind::Major).unwrap(), "2.0.0");
        assert_eq!(bump_version("2.1.0-alpha", BumpKind::Major).unwrap(), "3.0.0");
    }

    #[test]
    fn test_bump_drops_build_metadata() {
        assert_eq!(bump_version("1.2.3+build.7", BumpKind::Patch).unwrap(), "1.2.4");
    }

    #[test]
    fn test_bump_invalid_version() {
        let err = bump_version("one.two", BumpKind::Patch).unwrap_err();
        assert_eq!(err.code().as_str(), "WORKSPACE_INVALID_VERSION");
        // none never looks at the version
        assert_eq!(bump_version("one.two", BumpKind::None).unwrap(), "one.two");
    }

    #[test]
    fn test_fixed_bump_answers() {
        let mut prompt = FixedBump::new(BumpKind::Minor, BumpKind::Patch);
        assert_eq!(prompt.choose("a", "1.0.0").unwrap(), BumpKind::Minor);
        assert_eq!(prompt.choose("b", "1.0.0").unwrap(), BumpKind::Patch);
        assert_eq!(prompt.choose("c", "1.0.0").unwrap(), BumpKind::Patch);
    }

    /// Records every question so ordering can be asserted
    struct Recording {
        asked: Vec<String>,
        answers: HashMap<String, BumpKind>,
    }

    impl BumpPrompt for Recording {
        fn choose(&mut self, package: &str, _current_version: &str) -> WorkspaceResult<BumpKind> {
            self.asked.push(package.to_string());
            Ok(self.answers.get(package).copied().unwrap_or(BumpKind::Patch))
        }
    }

    // core <- client <- app (private)
    // core <- plugin (peer)
    // core <- testing (dev)
    fn fixture(root: &Path) -> PackageRepository {
        let packages = [
            ("core", r#"{"name": "core", "version": "1.0.0"}"#),
            (
                "client",
                r#"{"name": "client", "version": "1.1.0", "dependencies": {"core": "^1.0.0"}}"#,
            ),
            (
                "plugin",
                r#"{"name": "plugin", "version": "0.3.0", "peerDependencies": {"core": "^1.0.0"}}"#,
            ),
            (
                "testing",
                r#"{"name": "testing", "version": "0.1.0", "devDependencies": {"core": "~1.0.0"}}"#,
            ),
            (
                "app",
                r#"{"name": "app", "version": "0.0.1", "private": true, "dependencies": {"client": "^1.1.0"}}"#,
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

    fn read_version(root: &Path, dir: &str) -> String {
        PackageManifest::read(&root.join(dir).join("package.json"))
            .unwrap()
            .version()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_bump_walks_dependents_breadth_first() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let mut prompt = Recording {
            asked: Vec::new(),
            answers: HashMap::from([("core".to_string(), BumpKind::Minor)]),
        };

        let report = bump(&mut repo, "core", &mut prompt, &BumpOptions::default()).unwrap();

        // app is private and never offered
        assert_eq!(prompt.asked, vec!["core", "client", "plugin", "testing"]);
        let bumped: Vec<(&str, &str)> = report
            .versions
            .iter()
            .map(|c| (c.package.as_str(), c.to.as_str()))
            .collect();
        assert_eq!(
            bumped,
            vec![("core", "1.1.0"), ("client", "1.1.1"), ("plugin", "0.3.1"), ("testing", "0.1.1")]
        );

        assert_eq!(read_version(tmp.path(), "core"), "1.1.0");
        assert_eq!(read_version(tmp.path(), "app"), "0.0.1");

        // app still gets its range on client synced
        let app = PackageManifest::read(&tmp.path().join("app/package.json")).unwrap();
        assert_eq!(app.dependency(DependencyKind::Prod, "client"), Some("^1.1.1"));
        assert_eq!(report.sync.len(), 4);
    }

    #[test]
    fn test_bump_include_private_and_ignore_dev() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let mut prompt = Recording {
            asked: Vec::new(),
            answers: HashMap::new(),
        };
        let options = BumpOptions {
            ignore_dev: true,
            include_private: true,
            ..BumpOptions::default()
        };

        bump(&mut repo, "core", &mut prompt, &options).unwrap();
        assert_eq!(prompt.asked, vec!["core", "client", "plugin", "app"]);

        let testing = PackageManifest::read(&tmp.path().join("testing/package.json")).unwrap();
        assert_eq!(testing.dependency(DependencyKind::Dev, "core"), Some("~1.0.0"));
    }

    #[test]
    fn test_none_stops_propagation() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let mut prompt = Recording {
            asked: Vec::new(),
            answers: HashMap::from([("client".to_string(), BumpKind::None)]),
        };
        let options = BumpOptions {
            include_private: true,
            ..BumpOptions::default()
        };

        let report = bump(&mut repo, "core", &mut prompt, &options).unwrap();
        assert!(!prompt.asked.contains(&"app".to_string()));
        assert!(report.versions.iter().all(|c| c.package != "client"));
        assert_eq!(read_version(tmp.path(), "client"), "1.1.0");
    }

    #[test]
    fn test_no_sync_and_dry_run() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let mut prompt = FixedBump::new(BumpKind::Major, BumpKind::None);

        let report = bump(
            &mut repo,
            "core",
            &mut prompt,
            &BumpOptions {
                no_sync: true,
                ..BumpOptions::default()
            },
        )
        .unwrap();
        assert!(report.sync.is_empty());
        assert_eq!(read_version(tmp.path(), "core"), "2.0.0");
        let client = PackageManifest::read(&tmp.path().join("client/package.json")).unwrap();
        assert_eq!(client.dependency(DependencyKind::Prod, "core"), Some("^1.0.0"));

        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let mut prompt = FixedBump::new(BumpKind::Patch, BumpKind::Patch);
        let report = bump(
            &mut repo,
            "core",
            &mut prompt,
            &BumpOptions {
                dry_run: true,
                ..BumpOptions::default()
            },
        )
        .unwrap();
        assert!(!report.versions.is_empty());
        assert!(!report.sync.is_empty());
        assert_eq!(read_version(tmp.path(), "core"), "1.0.0");
    }

    #[test]
    fn test_unknown_target() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        let mut prompt = FixedBump::new(BumpKind::Patch, BumpKind::Patch);
        let err = bump(&mut repo, "cor", &mut prompt, &BumpOptions::default()).unwrap_err();
        assert_eq!(err.code().as_str(), "WORKSPACE_PACKAGE_NOT_FOUND");
    }

    #[test]
    fn test_invalid_dependent_version_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut repo = fixture(tmp.path());
        repo.get_mut("plugin").unwrap().set_version("latest");
        let mut prompt = FixedBump::new(BumpKind::Patch, BumpKind::Patch);

        let err = bump(&mut repo, "core", &mut prompt, &BumpOptions::default()).unwrap_err();
        assert_eq!(err.code().as_str(), "WORKSPACE_INVALID_VERSION");
        assert_eq!(read_version(tmp.path(), "core"), "1.0.0");
    }
}
