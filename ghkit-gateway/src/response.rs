//! Typed response shapes and the JSON → type mapping for each query.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ghkit_core::{OwnerKind, ProjectNumber, Repository, Visibility};

use crate::error::GatewayError;
use crate::page::{Connection, Page, PageInfo};
use crate::query::MAX_FIELDS;

// ---------------------------------------------------------------------------
// Project items
// ---------------------------------------------------------------------------

/// What a project item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Issue,
    PullRequest,
    DraftIssue,
    Redacted,
}

/// One row of a project board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectItem {
    pub id: String,
    pub kind: ItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Project metadata captured from the first page of an item query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsPage {
    pub summary: ProjectSummary,
    pub page: Page<ProjectItem>,
}

#[derive(Deserialize)]
struct ItemsProjectNode {
    id: String,
    title: String,
    items: Connection<ItemNode>,
}

#[derive(Deserialize)]
struct ItemNode {
    id: String,
    #[serde(rename = "type")]
    kind: ItemKind,
    #[serde(default)]
    content: Option<ItemContent>,
}

#[derive(Deserialize, Default)]
struct ItemContent {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

pub(crate) fn parse_items_page(node: Value) -> Result<ItemsPage, GatewayError> {
    let project: ItemsProjectNode = serde_json::from_value(node)?;
    let total_count = project.items.total_count.ok_or_else(|| {
        GatewayError::UnexpectedShape("project items page is missing totalCount".to_string())
    })?;
    let page = project.items.into_page(|n| {
        let content = n.content.unwrap_or_default();
        ProjectItem {
            id: n.id,
            kind: n.kind,
            number: content.number,
            title: content.title.unwrap_or_default(),
            url: content.url,
        }
    });
    Ok(ItemsPage {
        summary: ProjectSummary {
            id: project.id,
            title: project.title,
            total_count,
        },
        page,
    })
}

// ---------------------------------------------------------------------------
// Project fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIteration {
    pub id: String,
    pub title: String,
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// A field definition as the platform reports it, tagged by category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawField {
    Plain {
        id: String,
        name: String,
        data_type: String,
    },
    SingleSelect {
        id: String,
        name: String,
        options: Vec<RawOption>,
    },
    Iteration {
        id: String,
        name: String,
        iterations: Vec<RawIteration>,
    },
}

impl RawField {
    pub fn name(&self) -> &str {
        match self {
            RawField::Plain { name, .. }
            | RawField::SingleSelect { name, .. }
            | RawField::Iteration { name, .. } => name,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RawField::Plain { id, .. }
            | RawField::SingleSelect { id, .. }
            | RawField::Iteration { id, .. } => id,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "__typename")]
enum FieldNode {
    ProjectV2Field {
        id: String,
        name: String,
        #[serde(rename = "dataType")]
        data_type: String,
    },
    ProjectV2SingleSelectField {
        id: String,
        name: String,
        #[serde(default)]
        options: Vec<RawOption>,
    },
    ProjectV2IterationField {
        id: String,
        name: String,
        #[serde(default)]
        configuration: Option<IterationConfiguration>,
    },
}

#[derive(Deserialize)]
struct IterationConfiguration {
    #[serde(default)]
    iterations: Vec<RawIteration>,
}

impl From<FieldNode> for RawField {
    fn from(node: FieldNode) -> Self {
        match node {
            FieldNode::ProjectV2Field {
                id,
                name,
                data_type,
            } => RawField::Plain {
                id,
                name,
                data_type,
            },
            FieldNode::ProjectV2SingleSelectField { id, name, options } => {
                RawField::SingleSelect { id, name, options }
            }
            FieldNode::ProjectV2IterationField {
                id,
                name,
                configuration,
            } => RawField::Iteration {
                id,
                name,
                iterations: configuration.map(|c| c.iterations).unwrap_or_default(),
            },
        }
    }
}

/// A project's identity plus its raw field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFields {
    pub id: String,
    pub title: String,
    pub url: String,
    pub fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct FieldsProjectNode {
    id: String,
    title: String,
    url: String,
    fields: FieldNodes,
}

#[derive(Deserialize)]
struct FieldNodes {
    #[serde(rename = "pageInfo", default)]
    page_info: Option<PageInfo>,
    #[serde(default)]
    nodes: Vec<FieldNode>,
}

pub(crate) fn parse_project_fields(node: Value) -> Result<ProjectFields, GatewayError> {
    let project: FieldsProjectNode = serde_json::from_value(node)?;
    if project.fields.page_info.is_some_and(|p| p.has_next_page) {
        return Err(GatewayError::UnexpectedShape(format!(
            "project {} has more than {MAX_FIELDS} fields",
            project.id
        )));
    }
    Ok(ProjectFields {
        id: project.id,
        title: project.title,
        url: project.url,
        fields: project.fields.nodes.into_iter().map(RawField::from).collect(),
    })
}

// ---------------------------------------------------------------------------
// Workspace listings, identity, repositories
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NumberNode {
    number: u32,
}

#[derive(Deserialize)]
struct NameNode {
    name: String,
}

pub(crate) fn parse_project_numbers(node: Value) -> Result<Page<ProjectNumber>, GatewayError> {
    let conn: Connection<NumberNode> = serde_json::from_value(node)?;
    Ok(conn.into_page(|n| ProjectNumber(n.number)))
}

pub(crate) fn parse_repository_names(node: Value) -> Result<Page<String>, GatewayError> {
    let conn: Connection<NameNode> = serde_json::from_value(node)?;
    Ok(conn.into_page(|n| n.name))
}

#[derive(Deserialize)]
struct IdNode {
    id: String,
}

pub(crate) fn parse_id(node: Value) -> Result<String, GatewayError> {
    let node: IdNode = serde_json::from_value(node)?;
    Ok(node.id)
}

#[derive(Deserialize)]
struct OwnerNode {
    #[serde(rename = "__typename")]
    typename: String,
    id: String,
}

pub(crate) fn parse_owner(node: Value) -> Result<(OwnerKind, String), GatewayError> {
    let node: OwnerNode = serde_json::from_value(node)?;
    let kind = node
        .typename
        .parse::<OwnerKind>()
        .map_err(GatewayError::UnexpectedShape)?;
    Ok((kind, node.id))
}

#[derive(Deserialize)]
struct RepositoryNode {
    name: String,
    id: String,
    #[serde(rename = "nameWithOwner")]
    name_with_owner: String,
    visibility: String,
    #[serde(rename = "defaultBranchRef", default)]
    default_branch_ref: Option<NameNode>,
}

pub(crate) fn parse_repository(node: Value) -> Result<Repository, GatewayError> {
    let node: RepositoryNode = serde_json::from_value(node)?;
    let visibility = node
        .visibility
        .parse::<Visibility>()
        .map_err(GatewayError::UnexpectedShape)?;
    Ok(Repository {
        name: node.name,
        id: node.id,
        full_name: node.name_with_owner,
        default_branch: node.default_branch_ref.map(|b| b.name).unwrap_or_default(),
        visibility,
    })
}

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Turn a top-level `errors` array into a [`GatewayError`].
pub(crate) fn check_errors(body: &Value) -> Result<(), GatewayError> {
    let Some(errors) = body.get("errors") else {
        return Ok(());
    };
    let entries: Vec<GraphqlErrorEntry> = serde_json::from_value(errors.clone())?;
    if entries.is_empty() {
        return Ok(());
    }
    if let Some(missing) = entries
        .iter()
        .find(|e| e.kind.as_deref() == Some("NOT_FOUND"))
    {
        return Err(GatewayError::NotFound {
            what: missing.message.clone(),
        });
    }
    Err(GatewayError::Graphql(
        entries.into_iter().map(|e| e.message).collect(),
    ))
}

/// Pull the node at `pointer` out of a response body; a missing or `null`
/// node means the addressed entity does not exist.
pub(crate) fn extract(body: &Value, pointer: &str, what: &str) -> Result<Value, GatewayError> {
    match body.pointer(pointer) {
        Some(Value::Null) | None => Err(GatewayError::NotFound {
            what: what.to_string(),
        }),
        Some(node) => Ok(node.clone()),
    }
}
