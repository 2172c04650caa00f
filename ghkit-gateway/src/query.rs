//! GraphQL query construction.
//!
//! A [`QueryDescriptor`] is a plain value: operation tag, query text and typed
//! variables. Transports only ever see descriptors, never ad-hoc strings.
//! Owner kind is resolved to a GraphQL root field in exactly one place,
//! [`owner_root`].

use std::fmt;

use serde_json::{Map, Value};

use ghkit_core::{Owner, OwnerKind, ProjectNumber};

use crate::page::PageRequest;

/// The queries this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ResolveOwner,
    WorkspaceId,
    ProjectItems,
    ProjectFields,
    WorkspaceProjects,
    WorkspaceRepositories,
    Repository,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ResolveOwner => "resolve_owner",
            Operation::WorkspaceId => "workspace_id",
            Operation::ProjectItems => "project_items",
            Operation::ProjectFields => "project_fields",
            Operation::WorkspaceProjects => "workspace_projects",
            Operation::WorkspaceRepositories => "workspace_repositories",
            Operation::Repository => "repository",
        };
        f.write_str(name)
    }
}

/// A ready-to-send GraphQL request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub operation: Operation,
    pub query: String,
    pub variables: Map<String, Value>,
    /// JSON pointer to the node the caller cares about, e.g. `/data/user/projectV2`.
    pub data_pointer: String,
}

/// GraphQL root field for an owner kind.
pub fn owner_root(kind: OwnerKind) -> &'static str {
    match kind {
        OwnerKind::User => "user",
        OwnerKind::Organization => "organization",
    }
}

const PAGE_INFO: &str = "pageInfo { hasNextPage endCursor }";

/// Field schemas are fetched in one request; a longer schema is rejected.
pub const MAX_FIELDS: u32 = 100;

impl QueryDescriptor {
    fn new(operation: Operation, query: String, data_pointer: String) -> Self {
        Self {
            operation,
            query,
            variables: Map::new(),
            data_pointer,
        }
    }

    fn var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    fn page(self, page: &PageRequest) -> Self {
        let this = self.var("first", page.first);
        match &page.after {
            Some(cursor) => this.var("after", cursor.0.clone()),
            None => this,
        }
    }

    /// `repositoryOwner(login)`: works without knowing the kind up front.
    pub fn resolve_owner(login: &str) -> Self {
        let query = "query($login: String!) { repositoryOwner(login: $login) { __typename id } }";
        Self::new(
            Operation::ResolveOwner,
            query.to_string(),
            "/data/repositoryOwner".to_string(),
        )
        .var("login", login)
    }

    pub fn workspace_id(owner: &Owner) -> Self {
        let root = owner_root(owner.kind);
        let query = format!("query($login: String!) {{ {root}(login: $login) {{ id }} }}");
        Self::new(Operation::WorkspaceId, query, format!("/data/{root}"))
            .var("login", owner.login.as_str())
    }

    pub fn project_items(owner: &Owner, number: ProjectNumber, page: &PageRequest) -> Self {
        let root = owner_root(owner.kind);
        let query = format!(
            "query($login: String!, $number: Int!, $first: Int!, $after: String) {{ \
             {root}(login: $login) {{ projectV2(number: $number) {{ id title \
             items(first: $first, after: $after) {{ totalCount {PAGE_INFO} \
             nodes {{ id type content {{ \
             ... on Issue {{ number title url }} \
             ... on PullRequest {{ number title url }} \
             ... on DraftIssue {{ title }} }} }} }} }} }} }}"
        );
        Self::new(
            Operation::ProjectItems,
            query,
            format!("/data/{root}/projectV2"),
        )
        .var("login", owner.login.as_str())
        .var("number", number.0)
        .page(page)
    }

    pub fn project_fields(owner: &Owner, number: ProjectNumber) -> Self {
        let root = owner_root(owner.kind);
        let query = format!(
            "query($login: String!, $number: Int!) {{ \
             {root}(login: $login) {{ projectV2(number: $number) {{ id title url \
             fields(first: {MAX_FIELDS}) {{ {PAGE_INFO} nodes {{ __typename \
             ... on ProjectV2Field {{ id name dataType }} \
             ... on ProjectV2SingleSelectField {{ id name dataType options {{ id name }} }} \
             ... on ProjectV2IterationField {{ id name dataType \
             configuration {{ iterations {{ id title startDate duration }} }} }} }} }} }} }} }}"
        );
        Self::new(
            Operation::ProjectFields,
            query,
            format!("/data/{root}/projectV2"),
        )
        .var("login", owner.login.as_str())
        .var("number", number.0)
    }

    pub fn workspace_projects(owner: &Owner, page: &PageRequest) -> Self {
        let root = owner_root(owner.kind);
        let query = format!(
            "query($login: String!, $first: Int!, $after: String) {{ \
             {root}(login: $login) {{ projectsV2(first: $first, after: $after) {{ \
             totalCount {PAGE_INFO} nodes {{ number }} }} }} }}"
        );
        Self::new(
            Operation::WorkspaceProjects,
            query,
            format!("/data/{root}/projectsV2"),
        )
        .var("login", owner.login.as_str())
        .page(page)
    }

    pub fn workspace_repositories(owner: &Owner, page: &PageRequest) -> Self {
        let root = owner_root(owner.kind);
        let query = format!(
            "query($login: String!, $first: Int!, $after: String) {{ \
             {root}(login: $login) {{ repositories(first: $first, after: $after, \
             ownerAffiliations: OWNER, orderBy: {{ field: NAME, direction: ASC }}) {{ \
             totalCount {PAGE_INFO} nodes {{ name }} }} }} }}"
        );
        Self::new(
            Operation::WorkspaceRepositories,
            query,
            format!("/data/{root}/repositories"),
        )
        .var("login", owner.login.as_str())
        .page(page)
    }

    pub fn repository(login: &str, name: &str) -> Self {
        let query = "query($owner: String!, $name: String!) { \
                     repository(owner: $owner, name: $name) { \
                     name id nameWithOwner visibility defaultBranchRef { name } } }";
        Self::new(
            Operation::Repository,
            query.to_string(),
            "/data/repository".to_string(),
        )
        .var("owner", login)
        .var("name", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Cursor;

    fn org() -> Owner {
        Owner::new("acme", OwnerKind::Organization)
    }

    #[test]
    fn owner_kind_selects_root() {
        let user = QueryDescriptor::workspace_id(&Owner::new("octocat", OwnerKind::User));
        let org = QueryDescriptor::workspace_id(&org());
        assert!(user.query.contains("user(login: $login)"));
        assert!(org.query.contains("organization(login: $login)"));
        assert_eq!(user.data_pointer, "/data/user");
        assert_eq!(org.data_pointer, "/data/organization");
    }

    #[test]
    fn first_page_omits_cursor() {
        let q = QueryDescriptor::project_items(&org(), ProjectNumber(3), &PageRequest::first(100));
        assert_eq!(q.variables["first"], 100);
        assert_eq!(q.variables["number"], 3);
        assert!(!q.variables.contains_key("after"));
        assert_eq!(q.operation, Operation::ProjectItems);
    }

    #[test]
    fn later_pages_carry_cursor() {
        let page = PageRequest::after(50, Some(Cursor::from("Y3Vyc29y")));
        let q = QueryDescriptor::workspace_projects(&org(), &page);
        assert_eq!(q.variables["after"], "Y3Vyc29y");
        assert_eq!(q.variables["first"], 50);
    }

    #[test]
    fn repository_query_is_owner_kind_agnostic() {
        let q = QueryDescriptor::repository("acme", "api");
        assert_eq!(q.variables["owner"], "acme");
        assert_eq!(q.variables["name"], "api");
        assert!(q.query.contains("defaultBranchRef"));
    }

    #[test]
    fn braces_balance() {
        let page = PageRequest::first(10);
        for q in [
            QueryDescriptor::resolve_owner("acme"),
            QueryDescriptor::workspace_id(&org()),
            QueryDescriptor::project_items(&org(), ProjectNumber(1), &page),
            QueryDescriptor::project_fields(&org(), ProjectNumber(1)),
            QueryDescriptor::workspace_projects(&org(), &page),
            QueryDescriptor::workspace_repositories(&org(), &page),
            QueryDescriptor::repository("acme", "api"),
        ] {
            let open = q.query.matches('{').count();
            let close = q.query.matches('}').count();
            assert_eq!(open, close, "{} has unbalanced braces", q.operation);
        }
    }
}
