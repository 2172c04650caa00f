//! Drift detection between a cached snapshot and live remote state.
//!
//! Only existence is compared: a project, field or repository is either
//! present on both sides or reported as added/removed. Attribute changes
//! (renamed titles, new option ids) show up in the regenerated snapshot, not
//! here.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use ghkit_core::{ProjectNumber, Snapshot};
use ghkit_gateway::QueryGateway;

use crate::collector::{collect_workspace_projects, collect_workspace_repositories, CollectOptions};
use crate::error::SyncError;
use crate::normalize::normalize_fields;
use crate::orchestrator::RefreshScope;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Key of a drifted entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(ProjectNumber),
    Name(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "#{n}"),
            Identifier::Name(name) => f.write_str(name),
        }
    }
}

impl From<ProjectNumber> for Identifier {
    fn from(n: ProjectNumber) -> Self {
        Identifier::Number(n)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::Name(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Projects,
    Fields(ProjectNumber),
    Repositories,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeCategory::Projects => f.write_str("projects"),
            ChangeCategory::Fields(n) => write!(f, "fields of project {n}"),
            ChangeCategory::Repositories => f.write_str("repositories"),
        }
    }
}

/// Additions and removals for one category. Both lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub category: ChangeCategory,
    pub added: Vec<Identifier>,
    pub removed: Vec<Identifier>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn removes(&self, key: &Identifier) -> bool {
        self.removed.binary_search(key).is_ok()
    }

    fn between<K>(category: ChangeCategory, cached: &[K], live: &[K]) -> Result<Self, SyncError>
    where
        K: Ord + Clone + fmt::Display + Into<Identifier>,
    {
        let (added, removed) = diff_keys(cached, live)?;
        Ok(Self {
            category,
            added: added.into_iter().map(Into::into).collect(),
            removed: removed.into_iter().map(Into::into).collect(),
        })
    }
}

/// The report for `category`, if it was produced.
pub fn report_for(reports: &[ChangeReport], category: ChangeCategory) -> Option<&ChangeReport> {
    reports.iter().find(|r| r.category == category)
}

// ---------------------------------------------------------------------------
// Set difference
// ---------------------------------------------------------------------------

/// Sort and deduplicate keys so they can be fed to [`diff_keys`].
pub fn sorted_keys<K: Ord>(keys: impl IntoIterator<Item = K>) -> Vec<K> {
    let mut keys: Vec<K> = keys.into_iter().collect();
    keys.sort();
    keys.dedup();
    keys
}

/// `(live - cached, cached - live)` over two strictly increasing key lists.
///
/// Unsorted or duplicated input is rejected rather than silently repaired.
pub fn diff_keys<K>(cached: &[K], live: &[K]) -> Result<(Vec<K>, Vec<K>), SyncError>
where
    K: Ord + Clone + fmt::Display,
{
    ensure_strictly_sorted("cached", cached)?;
    ensure_strictly_sorted("live", live)?;

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let (mut c, mut l) = (cached.iter().peekable(), live.iter().peekable());
    loop {
        match (c.peek(), l.peek()) {
            (Some(a), Some(b)) if a < b => removed.extend(c.next().cloned()),
            (Some(a), Some(b)) if a > b => added.extend(l.next().cloned()),
            (Some(_), Some(_)) => {
                c.next();
                l.next();
            }
            (Some(_), None) => removed.extend(c.next().cloned()),
            (None, Some(_)) => added.extend(l.next().cloned()),
            (None, None) => break,
        }
    }
    Ok((added, removed))
}

fn ensure_strictly_sorted<K: Ord + fmt::Display>(side: &str, keys: &[K]) -> Result<(), SyncError> {
    match keys.windows(2).find(|w| w[0] >= w[1]) {
        Some(w) => Err(SyncError::Integrity(format!(
            "{side} keys are not sorted and unique ('{}' before '{}')",
            w[0], w[1]
        ))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Live state
// ---------------------------------------------------------------------------

/// Keys observed remotely. A `None` category was not queried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveState {
    pub projects: Option<Vec<ProjectNumber>>,
    pub repositories: Option<Vec<String>>,
    /// Field names of every cached project still present remotely.
    pub fields: BTreeMap<ProjectNumber, Vec<String>>,
}

/// Query the keys needed to compare `snapshot` for `scope`.
pub fn collect_live_state<G: QueryGateway>(
    gateway: &G,
    snapshot: &Snapshot,
    scope: RefreshScope,
    options: CollectOptions,
) -> Result<LiveState, SyncError> {
    let owner = snapshot.workspace.owner();
    let mut live = LiveState::default();

    if scope.includes_projects() {
        let projects = sorted_keys(collect_workspace_projects(gateway, &owner, options)?);
        for number in snapshot.project_numbers() {
            if projects.binary_search(&number).is_err() {
                continue;
            }
            let schema = gateway.project_fields(&owner, number)?;
            let names = normalize_fields(&schema.fields)?.into_keys().collect();
            live.fields.insert(number, names);
        }
        live.projects = Some(projects);
    }
    if scope.includes_repositories() {
        live.repositories = Some(sorted_keys(collect_workspace_repositories(
            gateway, &owner, options,
        )?));
    }
    Ok(live)
}

/// Compare `cached` against `live`.
///
/// Reports come in a fixed order: projects, then fields per cached project by
/// number, then repositories. Categories absent from `live` are skipped.
pub fn detect(cached: &Snapshot, live: &LiveState) -> Result<Vec<ChangeReport>, SyncError> {
    let mut reports = Vec::new();

    if let Some(projects) = &live.projects {
        reports.push(ChangeReport::between(
            ChangeCategory::Projects,
            &cached.project_numbers(),
            projects,
        )?);
        for project in sorted_projects(cached) {
            let cached_fields: Vec<String> = project.fields.keys().cloned().collect();
            let live_fields = live.fields.get(&project.number).map(Vec::as_slice).unwrap_or(&[]);
            reports.push(ChangeReport::between(
                ChangeCategory::Fields(project.number),
                &cached_fields,
                live_fields,
            )?);
        }
    }
    if let Some(repositories) = &live.repositories {
        reports.push(ChangeReport::between(
            ChangeCategory::Repositories,
            &cached.repository_names(),
            repositories,
        )?);
    }
    Ok(reports)
}

fn sorted_projects(snapshot: &Snapshot) -> Vec<&ghkit_core::Project> {
    let mut projects: Vec<_> = snapshot.projects.iter().collect();
    projects.sort_by_key(|p| p.number);
    projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case::no_change(&[1, 2], &[1, 2], &[], &[])]
    #[case::new_project(&[1, 2], &[1, 2, 3], &[3], &[])]
    #[case::removed(&[1, 2, 5], &[2], &[], &[1, 5])]
    #[case::disjoint(&[1], &[2], &[2], &[1])]
    #[case::both_empty(&[], &[], &[], &[])]
    fn diff_keys_over_numbers(
        #[case] cached: &[u32],
        #[case] live: &[u32],
        #[case] added: &[u32],
        #[case] removed: &[u32],
    ) {
        let (a, r) = diff_keys(cached, live).unwrap();
        assert_eq!(a, added);
        assert_eq!(r, removed);
    }

    #[rstest]
    #[case::overlapping(&["api", "docs", "web"], &["api", "cli"])]
    #[case::disjoint(&["api"], &["web"])]
    #[case::one_side_empty(&[], &["api", "web"])]
    #[case::both_empty(&[], &[])]
    #[case::identical(&["api", "web"], &["api", "web"])]
    fn diff_is_symmetric(#[case] a: &[&str], #[case] b: &[&str]) {
        let (a, b) = (names(a), names(b));
        let (added_ab, removed_ab) = diff_keys(&a, &b).unwrap();
        let (added_ba, removed_ba) = diff_keys(&b, &a).unwrap();
        assert_eq!(added_ab, removed_ba);
        assert_eq!(removed_ab, added_ba);
        assert!(added_ab.iter().all(|k| b.contains(k) && !a.contains(k)));
        assert!(removed_ab.iter().all(|k| a.contains(k) && !b.contains(k)));
    }

    #[rstest]
    #[case::unsorted(&[2, 1])]
    #[case::duplicated(&[1, 1])]
    fn unsorted_or_duplicate_input_is_rejected(#[case] bad: &[u32]) {
        assert!(matches!(diff_keys(bad, &[1]), Err(SyncError::Integrity(_))));
        assert!(matches!(diff_keys(&[1], bad), Err(SyncError::Integrity(_))));
    }

    #[test]
    fn sorted_keys_normalizes() {
        assert_eq!(sorted_keys(vec![3, 1, 3, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn report_serializes_category_and_keys() {
        let report = ChangeReport {
            category: ChangeCategory::Fields(ProjectNumber(4)),
            added: vec![Identifier::Name("Priority".into())],
            removed: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"]["fields"], 4);
        assert_eq!(json["added"][0], "Priority");
    }
}
