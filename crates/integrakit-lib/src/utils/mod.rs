// Utilities

pub mod config;
pub mod schema;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use schema::{ObjectShape, SchemaDeclaration, Shape};
