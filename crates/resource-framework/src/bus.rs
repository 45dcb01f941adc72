//! # CQRS Bus
//!
//! Commands and queries are dispatched to an external domain layer. The adapter
//! only needs their name and an untyped payload, so both are plain values here.
//! [`QueryBus`] and [`CommandBus`] are the seams; [`HandlerBus`] is an
//! in-process implementation with handlers registered by message name.

use crate::error::BusError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A read request for the domain layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    pub payload: Value,
}

/// A write request for the domain layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub payload: Value,
}

impl Query {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

impl Command {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Dispatches queries; `Ok(None)` means the handler returned nothing.
#[async_trait]
pub trait QueryBus: Send + Sync {
    async fn ask(&self, query: Query) -> Result<Option<Value>, BusError>;
}

/// Dispatches commands; the optional value is the handler's result (e.g. a new id).
#[async_trait]
pub trait CommandBus: Send + Sync {
    async fn dispatch(&self, command: Command) -> Result<Option<Value>, BusError>;
}

type Handler = Arc<dyn Fn(Value) -> Result<Option<Value>, BusError> + Send + Sync>;

/// In-process bus with handlers keyed by message name.
///
/// Serves as both [`QueryBus`] and [`CommandBus`].
#[derive(Clone, Default)]
pub struct HandlerBus {
    handlers: HashMap<String, Handler>,
}

impl HandlerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `name`, replacing any previous one.
    pub fn handle<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Option<Value>, BusError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    fn run(&self, name: &str, payload: Value) -> Result<Option<Value>, BusError> {
        let handler = self.handlers.get(name).ok_or_else(|| {
            warn!(message = name, "No handler registered");
            BusError::NoHandler(name.to_string())
        })?;
        debug!(message = name, ?payload, "Dispatch");
        handler(payload)
    }
}

#[async_trait]
impl QueryBus for HandlerBus {
    async fn ask(&self, query: Query) -> Result<Option<Value>, BusError> {
        self.run(&query.name, query.payload)
    }
}

#[async_trait]
impl CommandBus for HandlerBus {
    async fn dispatch(&self, command: Command) -> Result<Option<Value>, BusError> {
        self.run(&command.name, command.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_handler_bus_routes_by_name() {
        let bus = HandlerBus::new()
            .handle("GetThing", |payload| Ok(Some(json!({"echo": payload}))))
            .handle("DeleteThing", |_| Ok(None));

        let result = bus
            .ask(Query::new("GetThing", json!({"id": 1})))
            .await
            .unwrap();
        assert_eq!(result, Some(json!({"echo": {"id": 1}})));

        let result = bus
            .dispatch(Command::new("DeleteThing", json!({})))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_unknown_message_fails() {
        let bus = HandlerBus::new();
        let err = bus.ask(Query::new("Nope", json!({}))).await.unwrap_err();
        assert_eq!(err, BusError::NoHandler("Nope".into()));
    }
}
