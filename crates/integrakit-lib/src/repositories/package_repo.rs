// Package Repository
// Loads the workspace packages of a monorepo and writes edited manifests back

use std::path::{Path, PathBuf};

use crate::error::{WorkspaceError, WorkspaceResult};
use crate::models::package::PackageManifest;
use crate::utils::workspace::{expand_patterns, get_workspace_patterns};

/// Minimum similarity for a "did you mean" suggestion
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Repository over the packages of one workspace
#[derive(Debug, Clone)]
pub struct PackageRepository {
    root: PathBuf,
    packages: Vec<PackageManifest>,
}

impl PackageRepository {
    /// Discover and load every workspace package under `root`
    pub fn discover(root: &Path) -> WorkspaceResult<Self> {
        let patterns = get_workspace_patterns(root)?;
        let paths = expand_patterns(root, &patterns)?;

        let mut packages = Vec::with_capacity(paths.len());
        for path in &paths {
            packages.push(PackageManifest::read(path)?);
        }
        packages.sort_by(|a, b| a.name().cmp(b.name()));

        for pair in packages.windows(2) {
            if pair[0].name() == pair[1].name() {
                return Err(WorkspaceError::Message(format!(
                    "Package \"{}\" is declared twice ({} and {})",
                    pair[0].name(),
                    pair[0].path().display(),
                    pair[1].path().display()
                )));
            }
        }

        log::info!(
            "Loaded {} workspace package(s) from {}",
            packages.len(),
            root.display()
        );
        Ok(Self {
            root: root.to_path_buf(),
            packages,
        })
    }

    /// Repository over already loaded manifests
    pub fn from_packages(root: &Path, mut packages: Vec<PackageManifest>) -> Self {
        packages.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            root: root.to_path_buf(),
            packages,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn packages(&self) -> &[PackageManifest] {
        &self.packages
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&PackageManifest> {
        self.packages.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PackageManifest> {
        self.packages.iter_mut().find(|p| p.name() == name)
    }

    /// Look up a package, suggesting the closest name on failure
    pub fn find(&self, name: &str) -> WorkspaceResult<&PackageManifest> {
        self.get(name).ok_or_else(|| WorkspaceError::PackageNotFound {
            name: name.to_string(),
            suggestion: self.suggest(name),
        })
    }

    fn suggest(&self, name: &str) -> Option<String> {
        self.packages
            .iter()
            .map(|p| (p.name(), strsim::jaro_winkler(name, p.name())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n.to_string())
    }

    /// Path of a package relative to the workspace root
    pub fn relative_dir(&self, package: &PackageManifest) -> PathBuf {
        package
            .dir()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| package.dir().to_path_buf())
    }

    /// Write one package back to disk
    pub fn save(&self, name: &str) -> WorkspaceResult<()> {
        let package = self.find(name)?;
        log::debug!("Writing {}", package.path().display());
        package.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("pnpm-workspace.yaml"), "packages:\n  - packages/*\n").unwrap();
        for (dir, json) in [
            ("core", r#"{"name": "@acme/core", "version": "1.0.0"}"#),
            ("client", r#"{"name": "@acme/client", "version": "2.0.0"}"#),
        ] {
            fs::create_dir_all(root.join("packages").join(dir)).unwrap();
            fs::write(root.join("packages").join(dir).join("package.json"), json).unwrap();
        }
        tmp
    }

    #[test]
    fn test_discover_sorted_by_name() {
        let tmp = workspace();
        let repo = PackageRepository::discover(tmp.path()).unwrap();
        let names: Vec<&str> = repo.packages().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["@acme/client", "@acme/core"]);
        assert!(repo.is_local("@acme/core"));
        assert!(!repo.is_local("react"));
        assert_eq!(
            repo.relative_dir(repo.find("@acme/core").unwrap()),
            PathBuf::from("packages/core")
        );
    }

    #[test]
    fn test_find_suggests_closest_name() {
        let tmp = workspace();
        let repo = PackageRepository::discover(tmp.path()).unwrap();
        match repo.find("@acme/clinet").unwrap_err() {
            WorkspaceError::PackageNotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("@acme/client"));
            }
            other => panic!("unexpected error: {other}"),
        }
        match repo.find("zzz").unwrap_err() {
            WorkspaceError::PackageNotFound { suggestion, .. } => assert!(suggestion.is_none()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let tmp = workspace();
        let dup = tmp.path().join("packages/core-copy");
        fs::create_dir_all(&dup).unwrap();
        fs::write(dup.join("package.json"), r#"{"name": "@acme/core", "version": "1.0.0"}"#).unwrap();
        let err = PackageRepository::discover(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_save_writes_edit() {
        let tmp = workspace();
        let mut repo = PackageRepository::discover(tmp.path()).unwrap();
        repo.get_mut("@acme/core").unwrap().set_version("1.1.0");
        repo.save("@acme/core").unwrap();

        let reloaded = PackageRepository::discover(tmp.path()).unwrap();
        assert_eq!(reloaded.find("@acme/core").unwrap().version(), Some("1.1.0"));
    }
}
