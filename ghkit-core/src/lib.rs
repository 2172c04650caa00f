//! ghkit core library: domain types, snapshot persistence, configuration, errors.
//!
//! - [`types`]: workspace, project, field, repository and snapshot structs
//! - [`error`]: [`StoreError`], [`ConfigError`]
//! - [`store`]: [`SnapshotStore`] plus file and in-memory implementations
//! - [`config`]: layered [`Config`]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{Config, TransportKind};
pub use error::{ConfigError, StoreError};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use types::{
    CacheMeta, Field, FieldShape, Owner, OwnerKind, PermissionsRecord, Project, ProjectNumber,
    Repository, Snapshot, Visibility, Workspace,
};
