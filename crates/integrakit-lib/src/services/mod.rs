// Services
// Integration definition pipeline and workspace dependency management

pub mod definition;
pub mod depsync;
pub mod manifest_schema;

pub use definition::IntegrationDefinition;
pub use manifest_schema::{manifest_schema, validate_manifest, MANIFEST_VERSIONS};
