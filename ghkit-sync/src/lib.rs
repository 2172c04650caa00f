//! # ghkit-sync
//!
//! Workspace synchronization: paginated collection, field schema
//! normalization, snapshot generation, drift detection and the refresh
//! orchestrator that drives them.
//!
//! Everything here is synchronous and issues one remote request at a time
//! through a [`ghkit_gateway::QueryGateway`]. Snapshots are read and written
//! through a [`ghkit_core::SnapshotStore`].

pub mod collector;
pub mod drift;
pub mod error;
pub mod generator;
pub mod normalize;
pub mod orchestrator;
pub mod staleness;
pub mod validate;

pub use collector::{
    collect_all, collect_project_items, collect_workspace_projects,
    collect_workspace_repositories, CollectOptions, PageStream, ProjectItems,
};
pub use drift::{ChangeCategory, ChangeReport, Identifier, LiveState};
pub use error::SyncError;
pub use generator::{Generator, TOOLKIT_VERSION};
pub use normalize::{denormalize, normalize_fields};
pub use orchestrator::{
    Orchestrator, RefreshOutcome, RefreshPlan, RefreshScope, SyncState,
};
pub use staleness::{check_staleness, check_staleness_at, StaleReason, Staleness};
