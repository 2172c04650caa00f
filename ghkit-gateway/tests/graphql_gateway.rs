//! `GraphqlGateway` response mapping against canned GraphQL payloads.

use std::cell::RefCell;
use std::collections::VecDeque;

use ghkit_core::{Owner, OwnerKind, ProjectNumber, Visibility};
use ghkit_gateway::{
    Cursor, GatewayError, GraphqlGateway, ItemKind, Operation, PageRequest, QueryDescriptor,
    QueryGateway, RawField, Transport,
};
use rstest::rstest;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct CannedTransport {
    responses: RefCell<VecDeque<Value>>,
    seen: RefCell<Vec<QueryDescriptor>>,
}

impl CannedTransport {
    fn with(responses: Vec<Value>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for CannedTransport {
    fn execute(&self, query: &QueryDescriptor) -> Result<Value, GatewayError> {
        self.seen.borrow_mut().push(query.clone());
        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .expect("no canned response left"))
    }
}

fn gateway(responses: Vec<Value>) -> GraphqlGateway<CannedTransport> {
    GraphqlGateway::new(CannedTransport::with(responses))
}

fn items_body(root: &str) -> Value {
    json!({
        "data": {
            root: {
                "projectV2": {
                    "id": "PVT_1",
                    "title": "Roadmap",
                    "items": {
                        "totalCount": 3,
                        "pageInfo": { "hasNextPage": true, "endCursor": "MQ" },
                        "nodes": [
                            { "id": "I1", "type": "ISSUE",
                              "content": { "number": 10, "title": "Bug", "url": "https://x/10" } },
                            { "id": "I2", "type": "DRAFT_ISSUE", "content": { "title": "Idea" } }
                        ]
                    }
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[rstest]
#[case::user(OwnerKind::User, "user")]
#[case::org(OwnerKind::Organization, "organization")]
fn items_page_maps_for_both_owner_kinds(#[case] kind: OwnerKind, #[case] root: &str) {
    let gw = gateway(vec![items_body(root)]);
    let page = gw
        .project_items(&Owner::new("acme", kind), ProjectNumber(1), &PageRequest::first(2))
        .expect("items");

    assert_eq!(page.summary.id, "PVT_1");
    assert_eq!(page.summary.total_count, 3);
    assert!(page.page.has_more);
    assert_eq!(page.page.next_cursor, Some(Cursor::from("MQ")));
    assert_eq!(page.page.items.len(), 2);
    assert_eq!(page.page.items[0].kind, ItemKind::Issue);
    assert_eq!(page.page.items[0].number, Some(10));
    assert_eq!(page.page.items[1].kind, ItemKind::DraftIssue);
    assert_eq!(page.page.items[1].url, None);
}

#[test]
fn missing_project_is_not_found() {
    let gw = gateway(vec![json!({ "data": { "user": { "projectV2": null } } })]);
    let err = gw
        .project_items(
            &Owner::new("octocat", OwnerKind::User),
            ProjectNumber(9),
            &PageRequest::first(100),
        )
        .unwrap_err();
    match err {
        GatewayError::NotFound { what } => assert!(what.contains("project 9")),
        other => panic!("expected not found, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

#[test]
fn fields_are_tagged_by_typename() {
    let gw = gateway(vec![json!({
        "data": { "organization": { "projectV2": {
            "id": "PVT_1", "title": "Roadmap", "url": "https://x/p/1",
            "fields": {
              "pageInfo": { "hasNextPage": false, "endCursor": "Mw" },
              "nodes": [
                { "__typename": "ProjectV2Field", "id": "F1", "name": "Title",
                  "dataType": "TITLE" },
                { "__typename": "ProjectV2SingleSelectField", "id": "F2", "name": "Status",
                  "dataType": "SINGLE_SELECT",
                  "options": [ { "id": "O1", "name": "Done" }, { "id": "O2", "name": "Todo" } ] },
                { "__typename": "ProjectV2IterationField", "id": "F3", "name": "Sprint",
                  "dataType": "ITERATION",
                  "configuration": { "iterations": [
                      { "id": "IT1", "title": "Sprint 1", "startDate": "2026-01-05",
                        "duration": 14 }
                  ] } }
            ] }
        } } }
    })]);

    let project = gw
        .project_fields(&Owner::new("acme", OwnerKind::Organization), ProjectNumber(1))
        .expect("fields");
    assert_eq!(project.url, "https://x/p/1");
    assert_eq!(project.fields.len(), 3);
    assert!(matches!(
        &project.fields[0],
        RawField::Plain { data_type, .. } if data_type == "TITLE"
    ));
    match &project.fields[1] {
        RawField::SingleSelect { options, .. } => assert_eq!(options.len(), 2),
        other => panic!("expected single select, got {other:?}"),
    }
    match &project.fields[2] {
        RawField::Iteration { iterations, .. } => {
            assert_eq!(iterations[0].title, "Sprint 1");
            assert_eq!(iterations[0].duration, Some(14));
        }
        other => panic!("expected iteration, got {other:?}"),
    }
}

#[test]
fn schema_longer_than_one_page_is_rejected() {
    let gw = gateway(vec![json!({
        "data": { "user": { "projectV2": {
            "id": "PVT_9", "title": "Huge", "url": "https://x/p/9",
            "fields": {
                "pageInfo": { "hasNextPage": true, "endCursor": "MTAw" },
                "nodes": [
                    { "__typename": "ProjectV2Field", "id": "F1", "name": "Title",
                      "dataType": "TITLE" }
                ]
            }
        } } }
    })]);

    let err = gw
        .project_fields(&Owner::new("octocat", OwnerKind::User), ProjectNumber(9))
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnexpectedShape(ref m) if m.contains("PVT_9")), "{err}");
    let seen = gw.transport().seen.borrow();
    assert!(seen[0].query.contains("pageInfo { hasNextPage endCursor } nodes { __typename"));
}

// ---------------------------------------------------------------------------
// Identity, listings, repositories
// ---------------------------------------------------------------------------

#[test]
fn resolve_owner_reads_typename() {
    let gw = gateway(vec![json!({
        "data": { "repositoryOwner": { "__typename": "Organization", "id": "O_1" } }
    })]);
    let (kind, id) = gw.resolve_owner("acme").expect("owner");
    assert_eq!(kind, OwnerKind::Organization);
    assert_eq!(id, "O_1");
}

#[test]
fn workspace_listing_pages() {
    let gw = gateway(vec![json!({
        "data": { "user": { "projectsV2": {
            "totalCount": 2,
            "pageInfo": { "hasNextPage": false, "endCursor": null },
            "nodes": [ { "number": 1 }, { "number": 4 } ]
        } } }
    })]);
    let page = gw
        .workspace_projects(&Owner::new("octocat", OwnerKind::User), &PageRequest::first(100))
        .expect("projects");
    assert_eq!(page.items, vec![ProjectNumber(1), ProjectNumber(4)]);
    assert!(!page.has_more);
    assert_eq!(page.total_count, Some(2));
}

#[test]
fn repository_maps_visibility_and_default_branch() {
    let gw = gateway(vec![json!({
        "data": { "repository": {
            "name": "api", "id": "R_1", "nameWithOwner": "acme/api",
            "visibility": "INTERNAL", "defaultBranchRef": { "name": "trunk" }
        } }
    })]);
    let repo = gw.repository("acme", "api").expect("repo");
    assert_eq!(repo.full_name, "acme/api");
    assert_eq!(repo.default_branch, "trunk");
    assert_eq!(repo.visibility, Visibility::Internal);
    assert_eq!(gw.transport().seen.borrow()[0].operation, Operation::Repository);
}

#[test]
fn empty_repository_has_blank_default_branch() {
    let gw = gateway(vec![json!({
        "data": { "repository": {
            "name": "empty", "id": "R_2", "nameWithOwner": "acme/empty",
            "visibility": "PRIVATE", "defaultBranchRef": null
        } }
    })]);
    let repo = gw.repository("acme", "empty").expect("repo");
    assert_eq!(repo.default_branch, "");
}

// ---------------------------------------------------------------------------
// Envelope errors
// ---------------------------------------------------------------------------

#[test]
fn graphql_errors_are_surfaced() {
    let gw = gateway(vec![json!({
        "data": null,
        "errors": [ { "message": "Resource not accessible by integration" } ]
    })]);
    let err = gw.repository("acme", "secret").unwrap_err();
    match err {
        GatewayError::Graphql(messages) => {
            assert_eq!(messages, vec!["Resource not accessible by integration"])
        }
        other => panic!("expected graphql error, got {other:?}"),
    }
}

#[test]
fn not_found_error_type_maps_to_not_found() {
    let gw = gateway(vec![json!({
        "data": { "repository": null },
        "errors": [ { "type": "NOT_FOUND", "message": "Could not resolve to a Repository" } ]
    })]);
    let err = gw.repository("acme", "gone").unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }), "got {err:?}");
}
