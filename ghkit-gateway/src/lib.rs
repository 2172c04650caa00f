//! # ghkit-gateway
//!
//! Remote Query Gateway for the collaboration platform's GraphQL API.
//!
//! Build a [`GraphqlGateway`] over a [`Transport`] ([`GhCliTransport`] or
//! [`HttpTransport`]) and call it through the [`QueryGateway`] trait. Queries
//! are [`QueryDescriptor`] values; owner kind picks the GraphQL root in one
//! place.

pub mod client;
pub mod error;
pub mod page;
pub mod query;
pub mod response;
pub mod transport;

pub use client::{GraphqlGateway, QueryGateway};
pub use error::GatewayError;
pub use page::{Cursor, Page, PageRequest};
pub use query::{Operation, QueryDescriptor};
pub use response::{
    ItemKind, ItemsPage, ProjectFields, ProjectItem, ProjectSummary, RawField, RawIteration,
    RawOption,
};
pub use transport::{GhCliTransport, HttpTransport, Transport};
