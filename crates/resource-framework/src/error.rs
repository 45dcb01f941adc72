//! # Framework Errors
//!
//! This module defines the error taxonomy shared by every provider and processor.
//! Each concern has its own `thiserror` enum; they all converge into [`ApiError`],
//! which is what the kernel classifies into an HTTP status through a resource's
//! [`ExceptionTable`](crate::resource::ExceptionTable).

use serde::{Deserialize, Serialize};

/// Errors raised while parsing or applying property paths.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum MappingError {
    #[error("Invalid property path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("Iteration segments of `{source_path}` and `{destination}` do not line up")]
    MismatchedIteration {
        source_path: String,
        destination: String,
    },
}

/// Errors raised while building the resource registry.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate operation name: {0}")]
    DuplicateOperation(String),
    #[error("Duplicate route: {method} {template}")]
    DuplicateRoute { method: String, template: String },
    #[error("Invalid URI template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },
    #[error("Invalid requirement for `{variable}`: {reason}")]
    InvalidRequirement { variable: String, reason: String },
    #[error("Invalid mapping in operation `{operation}`: {error}")]
    InvalidMapping {
        operation: String,
        error: MappingError,
    },
}

/// Errors returned by a CQRS bus.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum BusError {
    #[error("No handler registered for {0}")]
    NoHandler(String),
    /// A domain-level failure raised by a handler, classified for status mapping.
    #[error("{message}")]
    Domain { kind: ErrorKind, message: String },
    #[error("Bus unavailable: {0}")]
    Unavailable(String),
}

impl BusError {
    pub fn not_found(message: impl Into<String>) -> Self {
        BusError::Domain {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        BusError::Domain {
            kind: ErrorKind::Constraint,
            message: message.into(),
        }
    }
}

/// Errors returned by a grid data source or row enricher.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GridError {
    #[error("Grid `{0}` is not registered")]
    UnknownGrid(String),
    #[error("Grid backing store failed: {0}")]
    Backend(String),
    #[error("Row enrichment failed: {0}")]
    Enrichment(String),
}

/// Classification of an [`ApiError`], used as the key of exception tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    NotFound,
    InvalidArgument,
    Validation,
    Constraint,
    Persistence,
    Transformation,
    Unavailable,
    Unsupported,
}

/// The error every provider, processor and the kernel return.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ApiError {
    #[error("No CQRS query bound to operation `{operation}`")]
    QueryNotBound { operation: String },
    #[error("No CQRS command bound to operation `{operation}`")]
    CommandNotBound { operation: String },
    #[error("No processor registered under `{0}`")]
    ProcessorNotRegistered(String),
    #[error("No grid registered under `{0}`")]
    GridNotRegistered(String),
    #[error("{0}")]
    NotFound(String),
    #[error("No route matches {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Transformation failed: {0}")]
    Transformation(String),
    #[error("Unsupported input: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::QueryNotBound { .. }
            | ApiError::CommandNotBound { .. }
            | ApiError::ProcessorNotRegistered(_)
            | ApiError::GridNotRegistered(_)
            | ApiError::Mapping(_) => ErrorKind::Configuration,
            ApiError::NotFound(_) | ApiError::RouteNotFound { .. } => ErrorKind::NotFound,
            ApiError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Constraint(_) => ErrorKind::Constraint,
            ApiError::PersistenceFailure(_) => ErrorKind::Persistence,
            ApiError::Transformation(_) => ErrorKind::Transformation,
            ApiError::Unsupported(_) => ErrorKind::Unsupported,
            ApiError::Bus(BusError::Domain { kind, .. }) => *kind,
            ApiError::Bus(BusError::NoHandler(_)) => ErrorKind::Configuration,
            ApiError::Bus(BusError::Unavailable(_)) => ErrorKind::Unavailable,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Transformation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_bus_errors_keep_their_kind() {
        let err: ApiError = BusError::not_found("Api client 7 not found").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Api client 7 not found");
    }

    #[test]
    fn test_missing_bindings_are_configuration_errors() {
        let err = ApiError::QueryNotBound {
            operation: "get_thing".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            ApiError::Bus(BusError::NoHandler("X".into())).kind(),
            ErrorKind::Configuration
        );
    }
}
