// Data models
// Integration definitions, package manifests and version bumps

pub mod integration;
pub mod package;
pub mod version;

pub use integration::*;
pub use package::{DependencyKind, PackageManifest};
pub use version::{BumpKind, VersionChange};
