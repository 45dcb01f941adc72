//! # Resource Framework
//!
//! This crate exposes REST resources on top of an external CQRS command/query
//! bus. It owns no business logic: each resource declares its fields and its
//! operations, every operation binds an HTTP verb and URI template to a CQRS
//! query or command, and rename tables translate between the flat field names
//! of the API and the nested names of the domain layer.
//!
//! ## Architecture Overview
//!
//! 1. **Declaration Layer** ([`ResourceDescriptor`], [`Operation`], [`ResourceRegistry`]) -
//!    resources built once at startup and read-only afterwards
//! 2. **Adapter Layer** ([`QueryProvider`], [`CommandProcessor`], [`GridListProvider`],
//!    [`ActionProcessor`]) - turns requests into queries, commands or grid lookups
//! 3. **Mapping Layer** ([`PropertyPath`], [`MappingTable`], [`Normalizer`]) - pure
//!    functions over `serde_json::Value`
//!
//! The [`ApiKernel`] glues them together and maps every failure to a status
//! through the resource's [`ExceptionTable`](resource::ExceptionTable).
//!
//! ## Mapping Tables
//!
//! ```rust
//! use resource_framework::MappingTable;
//! use serde_json::json;
//!
//! let table = MappingTable::from_pairs([
//!     ("[id_api_client]", "apiClientId"),
//!     ("client_name", "clientName"),
//! ])
//! .unwrap();
//!
//! let renamed = table.apply(&json!({"id_api_client": 1, "client_name": null, "enabled": true}));
//! assert_eq!(renamed, json!({"apiClientId": 1, "clientName": null, "enabled": true}));
//! ```
//!
//! ## Request Context
//!
//! Shop, language, currency and employee are carried by a [`RequestContext`]
//! passed with each request. Parameters are merged with the precedence
//! `context < filters < body < URI variables`.
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockQueryBus`](mock::MockQueryBus) and
//! [`MockCommandBus`](mock::MockCommandBus) with fluent expectations.

pub mod bus;
pub mod context;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod mapping;
pub mod mock;
pub mod normalizer;
pub mod path;
pub mod processor;
pub mod provider;
pub mod resource;

// Re-export core types for convenience
pub use bus::{Command, CommandBus, HandlerBus, Query, QueryBus};
pub use context::{Language, LanguageCatalog, RequestContext};
pub use error::{ApiError, BusError, ErrorKind, GridError, MappingError, RegistryError};
pub use grid::{
    GridData, GridDataSource, GridListProvider, PageLimits, PaginatedList, RowEnricher,
    SearchCriteria, SortOrder,
};
pub use kernel::{ActionProcessor, ApiKernel, ApiRequest, ApiResponse, RequestBody};
pub use mapping::MappingTable;
pub use normalizer::Normalizer;
pub use path::PropertyPath;
pub use processor::CommandProcessor;
pub use provider::QueryProvider;
pub use resource::{
    FieldType, HttpMethod, Operation, ResourceDescriptor, ResourceRegistry, UriVariables,
};
