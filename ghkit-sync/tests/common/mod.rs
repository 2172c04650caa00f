//! In-memory remote for ghkit-sync integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use ghkit_core::{Owner, OwnerKind, ProjectNumber, Repository, Visibility};
use ghkit_gateway::{
    Cursor, GatewayError, ItemKind, ItemsPage, Page, PageRequest, ProjectFields, ProjectItem,
    ProjectSummary, QueryGateway, RawField, RawOption,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone)]
pub struct FakeProject {
    pub id: String,
    pub title: String,
    pub items: Vec<ProjectItem>,
    pub fields: Vec<RawField>,
    /// Overrides the reported `totalCount` when set.
    pub reported_total: Option<u64>,
}

impl FakeProject {
    pub fn new(number: u32, items: usize) -> Self {
        Self {
            id: format!("PVT_{number}"),
            title: format!("Board {number}"),
            items: (0..items).map(|i| issue(i as u64 + 1)).collect(),
            fields: vec![
                RawField::Plain {
                    id: format!("PVTF_{number}_title"),
                    name: "Title".into(),
                    data_type: "TITLE".into(),
                },
                status_field(number, &[("Todo", "O1"), ("Done", "O2")]),
            ],
            reported_total: None,
        }
    }
}

pub fn issue(n: u64) -> ProjectItem {
    ProjectItem {
        id: format!("PVTI_{n}"),
        kind: ItemKind::Issue,
        number: Some(n),
        title: format!("Issue {n}"),
        url: Some(format!("https://example.test/issues/{n}")),
    }
}

pub fn status_field(number: u32, options: &[(&str, &str)]) -> RawField {
    RawField::SingleSelect {
        id: format!("PVTF_{number}_status"),
        name: "Status".into(),
        options: options
            .iter()
            .map(|(name, id)| RawOption {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect(),
    }
}

pub fn repo(login: &str, name: &str) -> Repository {
    Repository {
        name: name.into(),
        id: format!("R_{name}"),
        full_name: format!("{login}/{name}"),
        default_branch: "main".into(),
        visibility: Visibility::Private,
    }
}

/// A remote workspace whose state tests mutate between calls.
pub struct FakeGateway {
    pub login: String,
    pub kind: OwnerKind,
    pub projects: RefCell<BTreeMap<u32, FakeProject>>,
    pub repositories: RefCell<BTreeMap<String, Repository>>,
    /// Operation name that fails on its next call.
    pub fail_on: RefCell<Option<&'static str>>,
    pub calls: Cell<usize>,
}

impl FakeGateway {
    pub fn new(login: &str, kind: OwnerKind) -> Self {
        Self {
            login: login.into(),
            kind,
            projects: RefCell::new(BTreeMap::new()),
            repositories: RefCell::new(BTreeMap::new()),
            fail_on: RefCell::new(None),
            calls: Cell::new(0),
        }
    }

    pub fn with_projects(self, projects: &[(u32, usize)]) -> Self {
        for &(number, items) in projects {
            self.add_project(number, FakeProject::new(number, items));
        }
        self
    }

    pub fn with_repositories(self, names: &[&str]) -> Self {
        for name in names {
            self.add_repository(name);
        }
        self
    }

    pub fn add_project(&self, number: u32, project: FakeProject) {
        self.projects.borrow_mut().insert(number, project);
    }

    pub fn add_repository(&self, name: &str) {
        self.repositories
            .borrow_mut()
            .insert(name.to_string(), repo(&self.login, name));
    }

    pub fn remove_repository(&self, name: &str) {
        self.repositories.borrow_mut().remove(name);
    }

    pub fn fail_next(&self, operation: &'static str) {
        *self.fail_on.borrow_mut() = Some(operation);
    }

    fn enter(&self, operation: &'static str) -> Result<(), GatewayError> {
        self.calls.set(self.calls.get() + 1);
        let mut fail_on = self.fail_on.borrow_mut();
        if *fail_on == Some(operation) {
            *fail_on = None;
            return Err(GatewayError::Transport(format!("{operation}: connection reset")));
        }
        Ok(())
    }

    fn check_owner(&self, owner: &Owner) -> Result<(), GatewayError> {
        if owner.login != self.login || owner.kind != self.kind {
            return Err(GatewayError::NotFound {
                what: owner.to_string(),
            });
        }
        Ok(())
    }

    fn project(&self, number: ProjectNumber) -> Result<FakeProject, GatewayError> {
        self.projects
            .borrow()
            .get(&number.0)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                what: format!("project {number}"),
            })
    }
}

/// Offset cursors: the cursor is the index of the next element.
pub fn slice_page<T: Clone>(all: &[T], request: &PageRequest) -> Page<T> {
    let start = request
        .after
        .as_ref()
        .map(|c| c.0.parse::<usize>().expect("offset cursor"))
        .unwrap_or(0);
    let end = (start + request.first as usize).min(all.len());
    let has_more = end < all.len();
    Page {
        items: all[start.min(end)..end].to_vec(),
        next_cursor: Some(Cursor(end.to_string())),
        has_more,
        total_count: Some(all.len() as u64),
    }
}

impl QueryGateway for FakeGateway {
    fn resolve_owner(&self, login: &str) -> Result<(OwnerKind, String), GatewayError> {
        self.enter("resolve_owner")?;
        if login != self.login {
            return Err(GatewayError::NotFound {
                what: format!("owner '{login}'"),
            });
        }
        Ok((self.kind, format!("ID_{login}")))
    }

    fn workspace_id(&self, owner: &Owner) -> Result<String, GatewayError> {
        self.enter("workspace_id")?;
        self.check_owner(owner)?;
        Ok(format!("ID_{}", owner.login))
    }

    fn project_items(
        &self,
        owner: &Owner,
        number: ProjectNumber,
        page: &PageRequest,
    ) -> Result<ItemsPage, GatewayError> {
        self.enter("project_items")?;
        self.check_owner(owner)?;
        let project = self.project(number)?;
        Ok(ItemsPage {
            summary: ProjectSummary {
                id: project.id.clone(),
                title: project.title.clone(),
                total_count: project
                    .reported_total
                    .unwrap_or(project.items.len() as u64),
            },
            page: slice_page(&project.items, page),
        })
    }

    fn project_fields(
        &self,
        owner: &Owner,
        number: ProjectNumber,
    ) -> Result<ProjectFields, GatewayError> {
        self.enter("project_fields")?;
        self.check_owner(owner)?;
        let project = self.project(number)?;
        Ok(ProjectFields {
            id: project.id,
            title: project.title,
            url: format!("https://example.test/{}/projects/{number}", self.login),
            fields: project.fields,
        })
    }

    fn workspace_projects(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<ProjectNumber>, GatewayError> {
        self.enter("workspace_projects")?;
        self.check_owner(owner)?;
        let numbers: Vec<_> = self.projects.borrow().keys().map(|&n| ProjectNumber(n)).collect();
        Ok(slice_page(&numbers, page))
    }

    fn workspace_repositories(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<String>, GatewayError> {
        self.enter("workspace_repositories")?;
        self.check_owner(owner)?;
        let names: Vec<_> = self.repositories.borrow().keys().cloned().collect();
        Ok(slice_page(&names, page))
    }

    fn repository(&self, login: &str, name: &str) -> Result<Repository, GatewayError> {
        self.enter("repository")?;
        if login != self.login {
            return Err(GatewayError::NotFound {
                what: format!("repository {login}/{name}"),
            });
        }
        self.repositories
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                what: format!("repository {login}/{name}"),
            })
    }
}
