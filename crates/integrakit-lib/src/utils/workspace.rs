// Workspace discovery
// Reads workspace globs from pnpm-workspace.yaml or package.json and expands them

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{WorkspaceError, WorkspaceResult};

/// pnpm-workspace.yaml structure
#[derive(Debug, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

/// Workspaces configuration in package.json
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesConfig {
    Array(Vec<String>),
    Object { packages: Vec<String> },
}

/// Workspace glob patterns declared at `root`
pub fn get_workspace_patterns(root: &Path) -> WorkspaceResult<Vec<String>> {
    let pnpm_workspace_path = root.join("pnpm-workspace.yaml");
    if pnpm_workspace_path.exists() {
        let content = fs::read_to_string(&pnpm_workspace_path)
            .map_err(|e| WorkspaceError::io(&pnpm_workspace_path, e))?;
        let workspace: PnpmWorkspace =
            serde_yaml::from_str(&content).map_err(|source| WorkspaceError::Yaml {
                path: pnpm_workspace_path.clone(),
                source,
            })?;
        log::debug!(
            "Found {} pattern(s) in {}",
            workspace.packages.len(),
            pnpm_workspace_path.display()
        );
        return Ok(workspace.packages);
    }

    let package_json_path = root.join("package.json");
    if package_json_path.exists() {
        let content = fs::read_to_string(&package_json_path)
            .map_err(|e| WorkspaceError::io(&package_json_path, e))?;
        let json: Value = serde_json::from_str(&content).map_err(|source| WorkspaceError::Json {
            path: package_json_path.clone(),
            source,
        })?;
        if let Some(workspaces) = json.get("workspaces") {
            let config: WorkspacesConfig = serde_json::from_value(workspaces.clone()).map_err(
                |source| WorkspaceError::Json {
                    path: package_json_path.clone(),
                    source,
                },
            )?;
            return Ok(match config {
                WorkspacesConfig::Array(patterns) => patterns,
                WorkspacesConfig::Object { packages } => packages,
            });
        }
    }

    Err(WorkspaceError::NoWorkspace {
        root: root.to_path_buf(),
    })
}

/// Expand patterns into the package.json paths they match
///
/// Patterns starting with `!` exclude matches; anything under
/// `node_modules` is skipped. The result is sorted and deduplicated.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> WorkspaceResult<Vec<PathBuf>> {
    let mut excludes = Vec::new();
    for pattern in patterns.iter().filter_map(|p| p.strip_prefix('!')) {
        let full = root.join(pattern.trim_start_matches("./"));
        let compiled = glob::Pattern::new(&full.to_string_lossy()).map_err(|e| {
            WorkspaceError::Message(format!("Invalid workspace pattern \"!{}\": {}", pattern, e))
        })?;
        excludes.push(compiled);
    }

    let mut manifests = Vec::new();
    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let pattern_path = root.join(pattern.trim_start_matches("./"));
        let pattern_str = pattern_path.to_string_lossy();

        let entries = glob::glob(&pattern_str).map_err(|e| {
            WorkspaceError::Message(format!("Invalid workspace pattern \"{}\": {}", pattern, e))
        })?;

        for entry in entries.flatten() {
            if !entry.is_dir() {
                continue;
            }
            if entry.components().any(|c| c.as_os_str() == "node_modules") {
                continue;
            }
            if excludes.iter().any(|ex| ex.matches_path(&entry)) {
                log::debug!("Excluded {}", entry.display());
                continue;
            }

            let package_json_path = entry.join("package.json");
            if package_json_path.is_file() {
                manifests.push(package_json_path);
            }
        }
    }

    manifests.sort();
    manifests.dedup();
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch_package(root: &Path, rel: &str, name: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), format!(r#"{{"name": "{}"}}"#, name)).unwrap();
    }

    #[test]
    fn test_patterns_from_pnpm_workspace() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("pnpm-workspace.yaml"),
            "packages:\n  - 'packages/*'\n  - \"apps/*\"\n  # comment\n  - '!packages/legacy'\n",
        )
        .unwrap();

        let patterns = get_workspace_patterns(tmp.path()).unwrap();
        assert_eq!(patterns, vec!["packages/*", "apps/*", "!packages/legacy"]);
    }

    #[test]
    fn test_patterns_from_package_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "root", "workspaces": ["packages/*"]}"#,
        )
        .unwrap();
        assert_eq!(get_workspace_patterns(tmp.path()).unwrap(), vec!["packages/*"]);

        fs::write(
            tmp.path().join("package.json"),
            r#"{"name": "root", "workspaces": {"packages": ["libs/*"]}}"#,
        )
        .unwrap();
        assert_eq!(get_workspace_patterns(tmp.path()).unwrap(), vec!["libs/*"]);
    }

    #[test]
    fn test_no_workspace() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"name": "solo"}"#).unwrap();
        let err = get_workspace_patterns(tmp.path()).unwrap_err();
        assert_eq!(err.code().as_str(), "WORKSPACE_NOT_FOUND");
    }

    #[test]
    fn test_expand_patterns() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch_package(root, "packages/core", "core");
        touch_package(root, "packages/client", "client");
        touch_package(root, "packages/legacy", "legacy");
        touch_package(root, "packages/client/node_modules/dep", "dep");
        fs::create_dir_all(root.join("packages/empty")).unwrap();
        touch_package(root, "apps/web", "web");

        let patterns = vec![
            "packages/**".to_string(),
            "./apps/*".to_string(),
            "!packages/legacy".to_string(),
        ];
        let found = expand_patterns(root, &patterns).unwrap();
        let rel: Vec<PathBuf> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("apps/web/package.json"),
                PathBuf::from("packages/client/package.json"),
                PathBuf::from("packages/core/package.json"),
            ]
        );
    }
}
