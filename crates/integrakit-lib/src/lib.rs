// Integrakit shared library
// Integration manifest definitions and monorepo version management

pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use error::{
    DefinitionError, DefinitionResult, ValidationIssue, WorkspaceError, WorkspaceResult,
};
pub use models::*;
pub use repositories::PackageRepository;
pub use services::IntegrationDefinition;
pub use utils::{ObjectShape, SchemaDeclaration, Shape, WorkspaceConfig};
