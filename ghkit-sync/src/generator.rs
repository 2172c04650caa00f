//! Snapshot generation: remote state in, one complete [`Snapshot`] out.

use chrono::{DateTime, Utc};

use ghkit_core::{CacheMeta, Owner, Project, ProjectNumber, Repository, Snapshot, Workspace};
use ghkit_gateway::QueryGateway;

use crate::collector::{collect_project_items, CollectOptions};
use crate::error::SyncError;
use crate::normalize::normalize_fields;
use crate::validate;

/// Recorded in `cache.toolkit_version` of every generated snapshot.
pub const TOOLKIT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetches and assembles snapshot entries through a gateway.
pub struct Generator<'g, G> {
    gateway: &'g G,
    options: CollectOptions,
}

impl<'g, G: QueryGateway> Generator<'g, G> {
    pub fn new(gateway: &'g G, options: CollectOptions) -> Self {
        Self { gateway, options }
    }

    /// One project: item count from a full collection, schema from the
    /// fields query.
    pub fn project(&self, owner: &Owner, number: ProjectNumber) -> Result<Project, SyncError> {
        let items = collect_project_items(self.gateway, owner, number, self.options)?;
        let schema = self.gateway.project_fields(owner, number)?;
        if schema.id != items.summary.id {
            return Err(SyncError::Integrity(format!(
                "project {number} changed identity mid-generation ({} vs {})",
                items.summary.id, schema.id
            )));
        }
        let fields = normalize_fields(&schema.fields)?;
        tracing::debug!(
            "project {number}: {} items, {} fields",
            items.items.len(),
            fields.len()
        );
        Ok(Project {
            number,
            id: schema.id,
            title: schema.title,
            url: schema.url,
            item_count: items.items.len() as u64,
            fields,
        })
    }

    pub fn repository(&self, login: &str, name: &str) -> Result<Repository, SyncError> {
        validate::repository_name(name)?;
        let repository = self.gateway.repository(login, name)?;
        tracing::debug!("repository {}: {}", repository.full_name, repository.visibility);
        Ok(repository)
    }

    pub fn projects(
        &self,
        owner: &Owner,
        numbers: &[ProjectNumber],
    ) -> Result<Vec<Project>, SyncError> {
        numbers.iter().map(|&n| self.project(owner, n)).collect()
    }

    pub fn repositories(
        &self,
        login: &str,
        names: &[String],
    ) -> Result<Vec<Repository>, SyncError> {
        names.iter().map(|n| self.repository(login, n)).collect()
    }

    /// Build a full snapshot for `workspace`.
    ///
    /// `previous` carries `initialized_at` over from an earlier snapshot.
    pub fn generate(
        &self,
        workspace: &Workspace,
        numbers: &[ProjectNumber],
        names: &[String],
        previous: Option<&CacheMeta>,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, SyncError> {
        let owner = workspace.owner();
        let projects = self.projects(&owner, numbers)?;
        let repositories = self.repositories(&workspace.login, names)?;
        Ok(Snapshot::new(
            workspace.clone(),
            projects,
            repositories,
            cache_meta(previous, now),
        ))
    }
}

/// Cache block for a snapshot generated at `now`.
///
/// `last_synced_at` never moves backwards: a clock that reads earlier than
/// the previous sync keeps the previous timestamp.
pub fn cache_meta(previous: Option<&CacheMeta>, now: DateTime<Utc>) -> CacheMeta {
    let Some(previous) = previous else {
        return CacheMeta {
            initialized_at: now,
            last_synced_at: Some(now),
            toolkit_version: TOOLKIT_VERSION.to_string(),
        };
    };
    let last_synced_at = match previous.last_synced_at {
        Some(last) if last > now => {
            tracing::warn!("clock reads {now}, before the last sync at {last}; keeping {last}");
            last
        }
        _ => now,
    };
    CacheMeta {
        initialized_at: previous.initialized_at,
        last_synced_at: Some(last_synced_at),
        toolkit_version: TOOLKIT_VERSION.to_string(),
    }
}
