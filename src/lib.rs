//! Schema composition for a GraphQL gateway.
//!
//! Each upstream (GraphQL, database, OpenAPI) is introspected into an [`Api`]
//! composite: its schema text, the data sources able to resolve each (type, field)
//! pair, and the per-field and per-type configuration the execution engine needs.
//! Composites are namespaced and renamed independently, then merged downstream.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate tracing;

pub mod api;
pub mod application;
pub mod configuration;
pub mod custom_scalars;
mod errors;
pub mod introspection;
pub mod namespace;
pub mod rename;
pub mod root_types;
pub mod schema_configuration;
pub mod selection_set;
mod shared;
pub mod upstream;
pub mod visitor;

pub use api::{create_mock_api, Api, DataSource, UpstreamCustom};
pub use application::Application;
pub use custom_scalars::ReplaceCustomScalarTypeField;
pub use errors::ComposeError;
pub use introspection::{IntrospectionOptions, Introspector, PollOutcome};
pub use namespace::Namespace;
pub use rename::{RenameType, RenameTypeField};
pub use root_types::{OperationType, RootTypeStatus, RootTypes};
pub use schema_configuration::{configuration, GraphQLConfiguration};
pub use shared::{normalize_schema, parse_schema};
