// Dependency sync services
// Version bumps across a workspace and the range rewrites that follow them

pub mod bump;
pub mod sync;

pub use bump::{bump, bump_version, BumpOptions, BumpPrompt, BumpReport, FixedBump};
pub use sync::{check, plan_sync, sync, synced_spec, SyncChange, SyncOptions};
