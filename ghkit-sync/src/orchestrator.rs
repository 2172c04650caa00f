//! Refresh orchestration.
//!
//! ```text
//! Uninitialized --initialize--> Initializing --> Ready
//! Ready --refresh--> Refreshing --> Ready
//! ```
//!
//! A failed operation leaves the orchestrator in the state it started in and
//! the persisted snapshot untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use ghkit_core::{
    Owner, OwnerKind, PermissionsRecord, ProjectNumber, Snapshot, SnapshotStore, Workspace,
};
use ghkit_gateway::QueryGateway;

use crate::collector::CollectOptions;
use crate::drift::{self, report_for, sorted_keys, ChangeCategory, ChangeReport, Identifier};
use crate::error::SyncError;
use crate::generator::{cache_meta, Generator};
use crate::staleness::{check_staleness_at, Staleness};
use crate::validate;

// ---------------------------------------------------------------------------
// State & scope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Initializing,
    Ready,
    Refreshing,
}

/// Which part of the snapshot a refresh re-fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshScope {
    #[default]
    All,
    Projects,
    Repositories,
}

impl RefreshScope {
    pub fn includes_projects(self) -> bool {
        matches!(self, RefreshScope::All | RefreshScope::Projects)
    }

    pub fn includes_repositories(self) -> bool {
        matches!(self, RefreshScope::All | RefreshScope::Repositories)
    }
}

impl fmt::Display for RefreshScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshScope::All => write!(f, "all"),
            RefreshScope::Projects => write!(f, "projects"),
            RefreshScope::Repositories => write!(f, "repositories"),
        }
    }
}

impl FromStr for RefreshScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "projects" => Ok(Self::Projects),
            "repositories" | "repos" => Ok(Self::Repositories),
            other => Err(format!(
                "unknown refresh scope '{other}'; expected: all, projects, repositories"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What a refresh would write, computed without writing it.
#[derive(Debug, Clone)]
pub struct RefreshPlan {
    pub cached: Snapshot,
    pub reports: Vec<ChangeReport>,
    pub next: Snapshot,
}

impl RefreshPlan {
    /// Whether `next` differs from `cached` beyond the sync timestamp.
    pub fn changes_content(&self) -> Result<bool, SyncError> {
        Ok(self.next.fingerprint()? != self.cached.fingerprint()?)
    }
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub reports: Vec<ChangeReport>,
    pub snapshot: Snapshot,
    /// `false` when only `last_synced_at` moved.
    pub changed: bool,
    pub last_synced_at: DateTime<Utc>,
}

impl RefreshOutcome {
    pub fn has_drift(&self) -> bool {
        self.reports.iter().any(|r| !r.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Drives initialize and refresh for one workspace.
pub struct Orchestrator<G, S> {
    login: String,
    gateway: G,
    store: S,
    options: CollectOptions,
    state: SyncState,
    clock: Clock,
}

impl<G: QueryGateway, S: SnapshotStore> Orchestrator<G, S> {
    /// Bind to `login`, deriving the initial state from the store.
    pub fn open(
        login: impl Into<String>,
        gateway: G,
        store: S,
        options: CollectOptions,
    ) -> Result<Self, SyncError> {
        let login = login.into();
        validate::login(&login)?;
        let state = match store.load()? {
            Some(_) => SyncState::Ready,
            None => SyncState::Uninitialized,
        };
        Ok(Self {
            login,
            gateway,
            store,
            options,
            state,
            clock: Box::new(Utc::now),
        })
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The persisted snapshot, if any.
    pub fn snapshot(&self) -> Result<Option<Snapshot>, SyncError> {
        let Some(snapshot) = self.store.load()? else {
            return Ok(None);
        };
        if snapshot.workspace.login != self.login {
            return Err(SyncError::Integrity(format!(
                "stored snapshot belongs to '{}', not '{}'",
                snapshot.workspace.login, self.login
            )));
        }
        Ok(Some(snapshot))
    }

    /// Create the first snapshot for this workspace.
    ///
    /// `kind` may be omitted, in which case the platform is asked what kind
    /// of account the login belongs to.
    pub fn initialize(
        &mut self,
        kind: Option<OwnerKind>,
        projects: &[ProjectNumber],
        repositories: &[String],
    ) -> Result<Snapshot, SyncError> {
        for &number in projects {
            validate::project_number(number)?;
        }
        for name in repositories {
            validate::repository_name(name)?;
        }
        if self.state != SyncState::Uninitialized || self.snapshot()?.is_some() {
            return Err(SyncError::AlreadyInitialized {
                login: self.login.clone(),
            });
        }

        self.transition(SyncState::Initializing, |this| {
            this.run_initialize(kind, projects, repositories)
        })
    }

    fn run_initialize(
        &mut self,
        kind: Option<OwnerKind>,
        projects: &[ProjectNumber],
        repositories: &[String],
    ) -> Result<Snapshot, SyncError> {
        let workspace = self.resolve_workspace(kind)?;
        let now = (self.clock)();
        let snapshot = Generator::new(&self.gateway, self.options).generate(
            &workspace,
            &sorted_keys(projects.iter().copied()),
            &sorted_keys(repositories.iter().cloned()),
            None,
            now,
        )?;

        // The snapshot is what marks a workspace initialized, so it goes last.
        self.store
            .save_permissions(&PermissionsRecord::from_snapshot(&snapshot, now))?;
        self.store.save(&snapshot)?;
        tracing::info!(
            "initialized {}: {} project(s), {} repositor{}",
            workspace.owner(),
            snapshot.projects.len(),
            snapshot.repositories.len(),
            if snapshot.repositories.len() == 1 { "y" } else { "ies" }
        );
        Ok(snapshot)
    }

    fn resolve_workspace(&self, kind: Option<OwnerKind>) -> Result<Workspace, SyncError> {
        let (kind, id) = match kind {
            Some(kind) => {
                let id = self.gateway.workspace_id(&Owner::new(self.login.clone(), kind))?;
                (kind, id)
            }
            None => self.gateway.resolve_owner(&self.login)?,
        };
        Ok(Workspace {
            login: self.login.clone(),
            kind,
            id,
        })
    }

    /// Full refresh.
    pub fn refresh(&mut self) -> Result<RefreshOutcome, SyncError> {
        self.refresh_scope(RefreshScope::All)
    }

    /// Detect drift, regenerate the scoped part over the cached identifier
    /// sets, and save. Drift additions are reported, never adopted.
    pub fn refresh_scope(&mut self, scope: RefreshScope) -> Result<RefreshOutcome, SyncError> {
        self.require_ready()?;
        self.transition(SyncState::Refreshing, |this| this.run_refresh(scope))
    }

    fn run_refresh(&mut self, scope: RefreshScope) -> Result<RefreshOutcome, SyncError> {
        let plan = self.plan_refresh(scope)?;
        let changed = plan.changes_content()?;
        self.store.save(&plan.next)?;

        let last_synced_at = plan.next.cache.last_synced_at.unwrap_or_else(|| (self.clock)());
        let drifted = plan.reports.iter().filter(|r| !r.is_empty()).count();
        tracing::info!(
            "refreshed {} ({scope}): {drifted} categor{} drifted, content {}",
            self.login,
            if drifted == 1 { "y" } else { "ies" },
            if changed { "changed" } else { "unchanged" }
        );
        Ok(RefreshOutcome {
            reports: plan.reports,
            snapshot: plan.next,
            changed,
            last_synced_at,
        })
    }

    /// Everything a refresh does except the write.
    pub fn plan_refresh(&self, scope: RefreshScope) -> Result<RefreshPlan, SyncError> {
        let cached = self.require_snapshot()?;
        let live = drift::collect_live_state(&self.gateway, &cached, scope, self.options)?;
        let reports = drift::detect(&cached, &live)?;

        // Entities gone remotely cannot be regenerated and are dropped; new
        // ones stay out until they are added explicitly.
        let generator = Generator::new(&self.gateway, self.options);
        let owner = cached.workspace.owner();
        let projects = if scope.includes_projects() {
            let numbers = surviving(&reports, ChangeCategory::Projects, cached.project_numbers());
            generator.projects(&owner, &numbers)?
        } else {
            cached.projects.clone()
        };
        let repositories = if scope.includes_repositories() {
            let names = surviving(
                &reports,
                ChangeCategory::Repositories,
                cached.repository_names(),
            );
            generator.repositories(&cached.workspace.login, &names)?
        } else {
            cached.repositories.clone()
        };

        let next = Snapshot::new(
            cached.workspace.clone(),
            projects,
            repositories,
            cache_meta(Some(&cached.cache), (self.clock)()),
        );
        Ok(RefreshPlan {
            cached,
            reports,
            next,
        })
    }

    /// Drift reports only; nothing is written.
    pub fn detect_drift(&self, scope: RefreshScope) -> Result<Vec<ChangeReport>, SyncError> {
        let cached = self.require_snapshot()?;
        let live = drift::collect_live_state(&self.gateway, &cached, scope, self.options)?;
        drift::detect(&cached, &live)
    }

    pub fn check_staleness(&self, max_age_days: u32) -> Result<Staleness, SyncError> {
        Ok(check_staleness_at(
            self.snapshot()?.as_ref(),
            max_age_days,
            (self.clock)(),
        ))
    }

    // -----------------------------------------------------------------------

    fn require_ready(&self) -> Result<(), SyncError> {
        match self.state {
            SyncState::Ready => Ok(()),
            _ => Err(SyncError::NotInitialized {
                login: self.login.clone(),
            }),
        }
    }

    fn require_snapshot(&self) -> Result<Snapshot, SyncError> {
        self.snapshot()?.ok_or_else(|| SyncError::NotInitialized {
            login: self.login.clone(),
        })
    }

    /// Run `op` in `during`; land in `Ready` on success, restore on failure.
    fn transition<T>(
        &mut self,
        during: SyncState,
        op: impl FnOnce(&mut Self) -> Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        let before = self.state;
        self.state = during;
        match op(self) {
            Ok(value) => {
                self.state = SyncState::Ready;
                Ok(value)
            }
            Err(err) => {
                self.state = before;
                Err(err)
            }
        }
    }
}

fn surviving<K>(reports: &[ChangeReport], category: ChangeCategory, keys: Vec<K>) -> Vec<K>
where
    K: Clone + Into<Identifier>,
{
    let Some(report) = report_for(reports, category) else {
        return keys;
    };
    keys.into_iter()
        .filter(|key| !report.removes(&key.clone().into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_and_prints() {
        assert_eq!("ALL".parse::<RefreshScope>().unwrap(), RefreshScope::All);
        assert_eq!("repos".parse::<RefreshScope>().unwrap(), RefreshScope::Repositories);
        assert!("fields".parse::<RefreshScope>().is_err());
        assert_eq!(RefreshScope::Projects.to_string(), "projects");
    }

    #[test]
    fn scope_coverage() {
        assert!(RefreshScope::All.includes_projects() && RefreshScope::All.includes_repositories());
        assert!(!RefreshScope::Projects.includes_repositories());
        assert!(!RefreshScope::Repositories.includes_projects());
    }
}
