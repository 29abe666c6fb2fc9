// Package manifest models
// A package.json kept as an ordered JSON object so rewrites preserve layout

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{WorkspaceError, WorkspaceResult};

/// Dependency table of a package.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    #[serde(rename = "dependencies")]
    Prod,
    #[serde(rename = "devDependencies")]
    Dev,
    #[serde(rename = "peerDependencies")]
    Peer,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 3] = [DependencyKind::Prod, DependencyKind::Dev, DependencyKind::Peer];

    /// Key of the table in package.json
    pub fn key(&self) -> &'static str {
        match self {
            DependencyKind::Prod => "dependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Peer => "peerDependencies",
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A package.json read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    path: PathBuf,
    content: Map<String, Value>,
    indent: String,
}

impl PackageManifest {
    /// Read `package.json` from a file path
    pub fn read(path: &Path) -> WorkspaceResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| WorkspaceError::io(path, e))?;
        Self::parse(path, &raw)
    }

    /// Parse manifest text; `path` is only used for reporting and saving
    pub fn parse(path: &Path, raw: &str) -> WorkspaceResult<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|source| WorkspaceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let Value::Object(content) = value else {
            return Err(WorkspaceError::InvalidManifest {
                path: path.to_path_buf(),
                message: "top-level value is not an object".to_string(),
            });
        };

        let manifest = Self {
            path: path.to_path_buf(),
            content,
            indent: detect_indent(raw),
        };
        if manifest.content.get("name").and_then(Value::as_str).is_none() {
            return Err(manifest.invalid("missing \"name\""));
        }
        Ok(manifest)
    }

    fn invalid(&self, message: &str) -> WorkspaceError {
        WorkspaceError::InvalidManifest {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn name(&self) -> &str {
        self.content.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn version(&self) -> Option<&str> {
        self.content.get("version").and_then(Value::as_str)
    }

    /// Version, or an error naming the package when it has none
    pub fn require_version(&self) -> WorkspaceResult<&str> {
        self.version()
            .ok_or_else(|| self.invalid(&format!("package \"{}\" has no \"version\"", self.name())))
    }

    pub fn is_private(&self) -> bool {
        self.content
            .get("private")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Dependencies of one kind, in file order
    pub fn dependencies(&self, kind: DependencyKind) -> Vec<(&str, &str)> {
        self.content
            .get(kind.key())
            .and_then(Value::as_object)
            .map(|deps| {
                deps.iter()
                    .filter_map(|(name, spec)| spec.as_str().map(|s| (name.as_str(), s)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dependency(&self, kind: DependencyKind, name: &str) -> Option<&str> {
        self.content
            .get(kind.key())
            .and_then(Value::as_object)
            .and_then(|deps| deps.get(name))
            .and_then(Value::as_str)
    }

    pub fn depends_on(&self, kinds: &[DependencyKind], name: &str) -> bool {
        kinds.iter().any(|k| self.dependency(*k, name).is_some())
    }

    pub fn set_version(&mut self, version: &str) {
        self.content
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Replace the spec of an existing dependency; returns false if absent
    pub fn set_dependency(&mut self, kind: DependencyKind, name: &str, spec: &str) -> bool {
        match self
            .content
            .get_mut(kind.key())
            .and_then(Value::as_object_mut)
            .and_then(|deps| deps.get_mut(name))
        {
            Some(slot) => {
                *slot = Value::String(spec.to_string());
                true
            }
            None => false,
        }
    }

    /// Serialize with the original indentation and a trailing newline
    pub fn to_json_string(&self) -> WorkspaceResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.content
            .serialize(&mut ser)
            .map_err(|source| WorkspaceError::Json {
                path: self.path.clone(),
                source,
            })?;
        let mut out = String::from_utf8_lossy(&buf).into_owned();
        out.push('\n');
        Ok(out)
    }

    /// Write the manifest back to its path
    pub fn write(&self) -> WorkspaceResult<()> {
        let out = self.to_json_string()?;
        fs::write(&self.path, out).map_err(|e| WorkspaceError::io(&self.path, e))
    }
}

/// Indentation of the first indented line, two spaces by default
fn detect_indent(raw: &str) -> String {
    raw.lines()
        .skip(1)
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            line.chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect::<String>()
        })
        .filter(|indent| !indent.is_empty())
        .unwrap_or_else(|| "  ".to_string())
}
