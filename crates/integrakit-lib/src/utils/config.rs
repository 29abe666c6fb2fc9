// Workspace configuration
// Optional integrakit.toml at the workspace root

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{WorkspaceError, WorkspaceResult};

pub const CONFIG_FILE: &str = "integrakit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub ignore_dev: bool,
    pub ignore_peers: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BumpConfig {
    pub include_private: bool,
}

/// Contents of integrakit.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub sync: SyncConfig,
    pub bump: BumpConfig,
}

impl WorkspaceConfig {
    /// Load the config at `root`, falling back to defaults when absent
    pub fn load(root: &Path) -> WorkspaceResult<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| WorkspaceError::io(&path, e))?;
        let config: WorkspaceConfig =
            toml::from_str(&content).map_err(|source| WorkspaceError::Toml {
                path: path.clone(),
                source,
            })?;
        log::debug!("Loaded {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(WorkspaceConfig::load(tmp.path()).unwrap(), WorkspaceConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[sync]\nignore_dev = true\n").unwrap();
        let config = WorkspaceConfig::load(tmp.path()).unwrap();
        assert!(config.sync.ignore_dev);
        assert!(!config.sync.ignore_peers);
        assert!(!config.bump.include_private);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[sync]\nignore_optional = true\n").unwrap();
        let err = WorkspaceConfig::load(tmp.path()).unwrap_err();
        assert_eq!(err.code().as_str(), "WORKSPACE_TOML_ERROR");
    }
}
