//! The Remote Query Gateway: typed queries over any [`Transport`].

use serde_json::Value;

use ghkit_core::{Owner, OwnerKind, ProjectNumber, Repository};

use crate::error::GatewayError;
use crate::page::{Page, PageRequest};
use crate::query::QueryDescriptor;
use crate::response::{self, ItemsPage, ProjectFields};
use crate::transport::Transport;

/// Typed access to the remote platform.
///
/// Every call is one blocking request; failures are returned verbatim.
pub trait QueryGateway {
    /// Kind and platform id for a login, without knowing the kind up front.
    fn resolve_owner(&self, login: &str) -> Result<(OwnerKind, String), GatewayError>;

    fn workspace_id(&self, owner: &Owner) -> Result<String, GatewayError>;

    fn project_items(
        &self,
        owner: &Owner,
        number: ProjectNumber,
        page: &PageRequest,
    ) -> Result<ItemsPage, GatewayError>;

    fn project_fields(
        &self,
        owner: &Owner,
        number: ProjectNumber,
    ) -> Result<ProjectFields, GatewayError>;

    fn workspace_projects(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<ProjectNumber>, GatewayError>;

    fn workspace_repositories(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<String>, GatewayError>;

    fn repository(&self, login: &str, name: &str) -> Result<Repository, GatewayError>;
}

impl<G: QueryGateway + ?Sized> QueryGateway for &G {
    fn resolve_owner(&self, login: &str) -> Result<(OwnerKind, String), GatewayError> {
        (**self).resolve_owner(login)
    }

    fn workspace_id(&self, owner: &Owner) -> Result<String, GatewayError> {
        (**self).workspace_id(owner)
    }

    fn project_items(
        &self,
        owner: &Owner,
        number: ProjectNumber,
        page: &PageRequest,
    ) -> Result<ItemsPage, GatewayError> {
        (**self).project_items(owner, number, page)
    }

    fn project_fields(
        &self,
        owner: &Owner,
        number: ProjectNumber,
    ) -> Result<ProjectFields, GatewayError> {
        (**self).project_fields(owner, number)
    }

    fn workspace_projects(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<ProjectNumber>, GatewayError> {
        (**self).workspace_projects(owner, page)
    }

    fn workspace_repositories(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<String>, GatewayError> {
        (**self).workspace_repositories(owner, page)
    }

    fn repository(&self, login: &str, name: &str) -> Result<Repository, GatewayError> {
        (**self).repository(login, name)
    }
}

/// [`QueryGateway`] backed by the platform's GraphQL API.
pub struct GraphqlGateway<T> {
    transport: T,
}

impl<T: Transport> GraphqlGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send, check the envelope, and return the node the query points at.
    fn fetch(&self, query: &QueryDescriptor, what: &str) -> Result<Value, GatewayError> {
        let body = self.transport.execute(query)?;
        response::check_errors(&body)?;
        response::extract(&body, &query.data_pointer, what)
    }
}

impl<T: Transport> QueryGateway for GraphqlGateway<T> {
    fn resolve_owner(&self, login: &str) -> Result<(OwnerKind, String), GatewayError> {
        let node = self.fetch(
            &QueryDescriptor::resolve_owner(login),
            &format!("owner '{login}'"),
        )?;
        response::parse_owner(node)
    }

    fn workspace_id(&self, owner: &Owner) -> Result<String, GatewayError> {
        let node = self.fetch(&QueryDescriptor::workspace_id(owner), &owner.to_string())?;
        response::parse_id(node)
    }

    fn project_items(
        &self,
        owner: &Owner,
        number: ProjectNumber,
        page: &PageRequest,
    ) -> Result<ItemsPage, GatewayError> {
        let node = self.fetch(
            &QueryDescriptor::project_items(owner, number, page),
            &format!("project {number} of {owner}"),
        )?;
        response::parse_items_page(node)
    }

    fn project_fields(
        &self,
        owner: &Owner,
        number: ProjectNumber,
    ) -> Result<ProjectFields, GatewayError> {
        let node = self.fetch(
            &QueryDescriptor::project_fields(owner, number),
            &format!("project {number} of {owner}"),
        )?;
        response::parse_project_fields(node)
    }

    fn workspace_projects(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<ProjectNumber>, GatewayError> {
        let node = self.fetch(
            &QueryDescriptor::workspace_projects(owner, page),
            &format!("projects of {owner}"),
        )?;
        response::parse_project_numbers(node)
    }

    fn workspace_repositories(
        &self,
        owner: &Owner,
        page: &PageRequest,
    ) -> Result<Page<String>, GatewayError> {
        let node = self.fetch(
            &QueryDescriptor::workspace_repositories(owner, page),
            &format!("repositories of {owner}"),
        )?;
        response::parse_repository_names(node)
    }

    fn repository(&self, login: &str, name: &str) -> Result<Repository, GatewayError> {
        let node = self.fetch(
            &QueryDescriptor::repository(login, name),
            &format!("repository {login}/{name}"),
        )?;
        response::parse_repository(node)
    }
}
