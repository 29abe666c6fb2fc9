// Integrakit Error Types
// Definition (manifest) errors and workspace (depsync) errors

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Validation Issues
// ============================================================================

/// A single schema violation, located by JSON pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// JSON pointer of the offending value ("/" for the root)
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() { "/".to_string() } else { path },
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Definition Errors
// ============================================================================

/// Integration definition error
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// The merged definition does not match the manifest schema
    #[error("Invalid integration definition: {}", join_issues(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    /// A runtime payload does not match its declared schema
    #[error("Invalid payload for {target}: {}", join_issues(.issues))]
    Payload {
        target: String,
        issues: Vec<ValidationIssue>,
    },

    /// Lookup of an event/action/state/channel that was never declared
    #[error("Unknown {section} \"{name}\"")]
    UnknownEntry { section: String, name: String },

    /// A declared schema could not be compiled
    #[error("Invalid schema for {target}: {message}")]
    InvalidSchema { target: String, message: String },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for definition operations
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Definition error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionErrorCode {
    Validation,
    Payload,
    UnknownEntry,
    InvalidSchema,
    Serialization,
}

impl DefinitionErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionErrorCode::Validation => "DEFINITION_INVALID",
            DefinitionErrorCode::Payload => "DEFINITION_PAYLOAD_INVALID",
            DefinitionErrorCode::UnknownEntry => "DEFINITION_UNKNOWN_ENTRY",
            DefinitionErrorCode::InvalidSchema => "DEFINITION_INVALID_SCHEMA",
            DefinitionErrorCode::Serialization => "DEFINITION_SERIALIZATION",
        }
    }
}

impl DefinitionError {
    pub fn code(&self) -> DefinitionErrorCode {
        match self {
            DefinitionError::Validation { .. } => DefinitionErrorCode::Validation,
            DefinitionError::Payload { .. } => DefinitionErrorCode::Payload,
            DefinitionError::UnknownEntry { .. } => DefinitionErrorCode::UnknownEntry,
            DefinitionError::InvalidSchema { .. } => DefinitionErrorCode::InvalidSchema,
            DefinitionError::Serialization(_) => DefinitionErrorCode::Serialization,
        }
    }

    /// Issues carried by validation-type errors, empty otherwise
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            DefinitionError::Validation { issues } | DefinitionError::Payload { issues, .. } => {
                issues
            }
            _ => &[],
        }
    }
}

// ============================================================================
// Workspace Errors
// ============================================================================

/// Workspace (package manifests, bump, sync) error
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Root has neither pnpm-workspace.yaml nor a workspaces field
    #[error("No workspace found at {}", .root.display())]
    NoWorkspace { root: PathBuf },

    /// Package name not present in the workspace
    #[error("Package \"{name}\" not found{}", .suggestion.as_ref().map(|s| format!(" (did you mean \"{}\"?)", s)).unwrap_or_default())]
    PackageNotFound {
        name: String,
        suggestion: Option<String>,
    },

    /// Manifest is missing a required key or has the wrong type
    #[error("Invalid package manifest {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },

    /// Version string is not valid semver
    #[error("Invalid version \"{version}\": {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Local dependency ranges do not match local versions
    #[error("{count} dependency version(s) out of sync")]
    OutOfSync { count: usize },

    /// Generic domain error carrying a descriptive message
    #[error("{0}")]
    Message(String),

    /// IO error
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error
    #[error("JSON parse error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parse error
    #[error("YAML parse error in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// TOML parse error
    #[error("TOML parse error in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Result type for workspace operations
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Workspace error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceErrorCode {
    NoWorkspace,
    PackageNotFound,
    InvalidManifest,
    InvalidVersion,
    OutOfSync,
    Message,
    IoError,
    JsonError,
    YamlError,
    TomlError,
}

impl WorkspaceErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceErrorCode::NoWorkspace => "WORKSPACE_NOT_FOUND",
            WorkspaceErrorCode::PackageNotFound => "WORKSPACE_PACKAGE_NOT_FOUND",
            WorkspaceErrorCode::InvalidManifest => "WORKSPACE_INVALID_MANIFEST",
            WorkspaceErrorCode::InvalidVersion => "WORKSPACE_INVALID_VERSION",
            WorkspaceErrorCode::OutOfSync => "WORKSPACE_OUT_OF_SYNC",
            WorkspaceErrorCode::Message => "WORKSPACE_ERROR",
            WorkspaceErrorCode::IoError => "WORKSPACE_IO_ERROR",
            WorkspaceErrorCode::JsonError => "WORKSPACE_JSON_ERROR",
            WorkspaceErrorCode::YamlError => "WORKSPACE_YAML_ERROR",
            WorkspaceErrorCode::TomlError => "WORKSPACE_TOML_ERROR",
        }
    }
}

impl WorkspaceError {
    pub fn code(&self) -> WorkspaceErrorCode {
        match self {
            WorkspaceError::NoWorkspace { .. } => WorkspaceErrorCode::NoWorkspace,
            WorkspaceError::PackageNotFound { .. } => WorkspaceErrorCode::PackageNotFound,
            WorkspaceError::InvalidManifest { .. } => WorkspaceErrorCode::InvalidManifest,
            WorkspaceError::InvalidVersion { .. } => WorkspaceErrorCode::InvalidVersion,
            WorkspaceError::OutOfSync { .. } => WorkspaceErrorCode::OutOfSync,
            WorkspaceError::Message(_) => WorkspaceErrorCode::Message,
            WorkspaceError::Io { .. } => WorkspaceErrorCode::IoError,
            WorkspaceError::Json { .. } => WorkspaceErrorCode::JsonError,
            WorkspaceError::Yaml { .. } => WorkspaceErrorCode::YamlError,
            WorkspaceError::Toml { .. } => WorkspaceErrorCode::TomlError,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.into(),
            source,
        }
    }
}
