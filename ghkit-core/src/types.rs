//! Domain types for the ghkit workspace snapshot.
//!
//! All types are serializable/deserializable via serde + serde_yaml. Maps are
//! `BTreeMap` so the rendered YAML is stable across runs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Per-workspace human-facing project number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectNumber(pub u32);

impl fmt::Display for ProjectNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for ProjectNumber {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of account that owns a workspace.
///
/// Every remote query is scoped by this: user-owned and organization-owned
/// projects live under different GraphQL roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    Organization,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::User => write!(f, "user"),
            OwnerKind::Organization => write!(f, "organization"),
        }
    }
}

impl FromStr for OwnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "org" | "organization" => Ok(Self::Organization),
            other => Err(format!(
                "unknown owner kind '{other}'; expected: user, org, organization"
            )),
        }
    }
}

/// Repository visibility as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Internal,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
            Visibility::Internal => write!(f, "internal"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "internal" => Ok(Self::Internal),
            other => Err(format!("unknown repository visibility '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Workspace identity
// ---------------------------------------------------------------------------

/// Login + kind: enough to address any owner-scoped query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    pub login: String,
    pub kind: OwnerKind,
}

impl Owner {
    pub fn new(login: impl Into<String>, kind: OwnerKind) -> Self {
        Self {
            login: login.into(),
            kind,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.login, self.kind)
    }
}

/// A resolved workspace. Immutable once the platform id is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub login: String,
    pub kind: OwnerKind,
    pub id: String,
}

impl Workspace {
    pub fn owner(&self) -> Owner {
        Owner::new(self.login.clone(), self.kind)
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Normalized shape of a project field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Any non-select, non-iteration field; `data_type` is lowercased (`text`, `date`, ...).
    Plain { data_type: String },
    /// Option name -> option id. Always replaced wholesale.
    SingleSelect { options: BTreeMap<String, String> },
    /// Iteration title -> iteration id.
    Iteration { iterations: BTreeMap<String, String> },
}

impl FieldShape {
    /// The persisted `type` key.
    pub fn type_name(&self) -> &str {
        match self {
            FieldShape::Plain { data_type } => data_type,
            FieldShape::SingleSelect { .. } => SINGLE_SELECT_TYPE,
            FieldShape::Iteration { .. } => ITERATION_TYPE,
        }
    }
}

const SINGLE_SELECT_TYPE: &str = "single_select";
const ITERATION_TYPE: &str = "iteration";

/// A project field: platform id plus normalized shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FieldRecord", into = "FieldRecord")]
pub struct Field {
    pub id: String,
    pub shape: FieldShape,
}

impl Field {
    pub fn plain(id: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shape: FieldShape::Plain {
                data_type: data_type.into().to_ascii_lowercase(),
            },
        }
    }

    pub fn single_select(id: impl Into<String>, options: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            shape: FieldShape::SingleSelect { options },
        }
    }

    pub fn iteration(id: impl Into<String>, iterations: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            shape: FieldShape::Iteration { iterations },
        }
    }

    /// Overwrite the option set of a single-select field.
    ///
    /// The platform only supports full replacement of options, so there is no
    /// per-option update: the previous set is dropped entirely. Returns `false`
    /// (and leaves the field untouched) if this is not a single-select field.
    pub fn replace_options(&mut self, options: BTreeMap<String, String>) -> bool {
        match &mut self.shape {
            FieldShape::SingleSelect { options: current } => {
                *current = options;
                true
            }
            _ => false,
        }
    }
}

/// On-disk form of [`Field`]: `{ id, type, options?, iterations? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldRecord {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iterations: Option<BTreeMap<String, String>>,
}

impl From<Field> for FieldRecord {
    fn from(field: Field) -> Self {
        let kind = field.shape.type_name().to_string();
        let (options, iterations) = match field.shape {
            FieldShape::Plain { .. } => (None, None),
            FieldShape::SingleSelect { options } => (Some(options), None),
            FieldShape::Iteration { iterations } => (None, Some(iterations)),
        };
        Self {
            id: field.id,
            kind,
            options,
            iterations,
        }
    }
}

impl TryFrom<FieldRecord> for Field {
    type Error = String;

    fn try_from(record: FieldRecord) -> Result<Self, Self::Error> {
        let shape = match record.kind.as_str() {
            SINGLE_SELECT_TYPE => {
                if record.iterations.is_some() {
                    return Err(format!(
                        "field {} is single_select but lists iterations",
                        record.id
                    ));
                }
                FieldShape::SingleSelect {
                    options: record.options.unwrap_or_default(),
                }
            }
            ITERATION_TYPE => {
                if record.options.is_some() {
                    return Err(format!("field {} is iteration but lists options", record.id));
                }
                FieldShape::Iteration {
                    iterations: record.iterations.unwrap_or_default(),
                }
            }
            "" => return Err(format!("field {} has an empty type", record.id)),
            other => {
                if record.options.is_some() || record.iterations.is_some() {
                    return Err(format!(
                        "plain field {} ({other}) cannot carry options or iterations",
                        record.id
                    ));
                }
                FieldShape::Plain {
                    data_type: other.to_ascii_lowercase(),
                }
            }
        };
        Ok(Field {
            id: record.id,
            shape,
        })
    }
}

// ---------------------------------------------------------------------------
// Projects & repositories
// ---------------------------------------------------------------------------

/// A project board with its field schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub number: ProjectNumber,
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub item_count: u64,
    #[serde(default)]
    pub fields: BTreeMap<String, Field>,
}

/// Repository metadata captured in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub id: String,
    pub full_name: String,
    pub default_branch: String,
    pub visibility: Visibility,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Bookkeeping for staleness and versioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub initialized_at: DateTime<Utc>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    pub toolkit_version: String,
}

/// The persisted declarative description of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub workspace: Workspace,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    pub cache: CacheMeta,
}

impl Snapshot {
    /// Build a snapshot, sorting projects by number and repositories by name
    /// and dropping duplicate keys (first occurrence wins).
    pub fn new(
        workspace: Workspace,
        mut projects: Vec<Project>,
        mut repositories: Vec<Repository>,
        cache: CacheMeta,
    ) -> Self {
        projects.sort_by_key(|p| p.number);
        projects.dedup_by_key(|p| p.number);
        repositories.sort_by(|a, b| a.name.cmp(&b.name));
        repositories.dedup_by(|a, b| a.name == b.name);
        Self {
            workspace,
            projects,
            repositories,
            cache,
        }
    }

    /// Sorted project numbers.
    pub fn project_numbers(&self) -> Vec<ProjectNumber> {
        let mut numbers: Vec<_> = self.projects.iter().map(|p| p.number).collect();
        numbers.sort();
        numbers.dedup();
        numbers
    }

    /// Sorted repository names.
    pub fn repository_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.repositories.iter().map(|r| r.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn project(&self, number: ProjectNumber) -> Option<&Project> {
        self.projects.iter().find(|p| p.number == number)
    }

    /// Reject duplicate project numbers or repository names.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut numbers: Vec<_> = self.projects.iter().map(|p| p.number).collect();
        numbers.sort();
        if let Some(pair) = numbers.windows(2).find(|w| w[0] == w[1]) {
            return Err(StoreError::Integrity(format!(
                "duplicate project number {} in snapshot",
                pair[0]
            )));
        }
        let mut names: Vec<_> = self.repositories.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(StoreError::Integrity(format!(
                "duplicate repository '{}' in snapshot",
                pair[0]
            )));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, StoreError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// SHA-256 of the YAML rendering with `last_synced_at` blanked.
    ///
    /// Two snapshots generated from identical remote state share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, StoreError> {
        let mut unstamped = self.clone();
        unstamped.cache.last_synced_at = None;
        let yaml = unstamped.to_yaml()?;
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Side record written once at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsRecord {
    pub login: String,
    pub kind: OwnerKind,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub repositories: Vec<RepositoryAccess>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryAccess {
    pub name: String,
    pub visibility: Visibility,
}

impl PermissionsRecord {
    pub fn from_snapshot(snapshot: &Snapshot, recorded_at: DateTime<Utc>) -> Self {
        Self {
            login: snapshot.workspace.login.clone(),
            kind: snapshot.workspace.kind,
            recorded_at,
            repositories: snapshot
                .repositories
                .iter()
                .map(|r| RepositoryAccess {
                    name: r.name.clone(),
                    visibility: r.visibility,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
