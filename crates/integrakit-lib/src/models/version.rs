// Version bump models

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::WorkspaceError;

/// How a package version should be incremented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
    None,
}

impl BumpKind {
    /// Order used when presenting choices
    pub const ALL: [BumpKind; 4] = [BumpKind::Patch, BumpKind::Minor, BumpKind::Major, BumpKind::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            BumpKind::Patch => "patch",
            BumpKind::Minor => "minor",
            BumpKind::Major => "major",
            BumpKind::None => "none",
        }
    }
}

impl std::fmt::Display for BumpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patch" => Ok(BumpKind::Patch),
            "minor" => Ok(BumpKind::Minor),
            "major" => Ok(BumpKind::Major),
            "none" => Ok(BumpKind::None),
            other => Err(WorkspaceError::Message(format!(
                "Invalid bump kind \"{}\" (expected patch, minor, major or none)",
                other
            ))),
        }
    }
}

/// A package whose version was changed by a bump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionChange {
    pub package: String,
    pub kind: BumpKind,
    pub from: String,
    pub to: String,
}
