//! # Mock Buses & Testing Guide
//!
//! [`MockQueryBus`] and [`MockCommandBus`] implement the same bus traits as the
//! production buses but answer from a queue of expectations. They let you test
//! providers, processors and whole kernels deterministically, without a domain
//! layer behind them.
//!
//! ## When to use Mocks vs a `HandlerBus`
//!
//! | Feature | Mock bus | `HandlerBus` |
//! |---------|----------|--------------|
//! | **Ordering** | Asserted (FIFO expectations) | Not checked |
//! | **Payload checks** | `with_payload` | Manual, inside the handler |
//! | **Error injection** | Easy (`return_err`) | Handler returns `Err` |
//! | **Use Case** | Unit testing one pipeline | Demo and end-to-end wiring |
//!
//! ## Example
//!
//! ```rust
//! use resource_framework::bus::{Query, QueryBus};
//! use resource_framework::mock::MockQueryBus;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockQueryBus::new();
//!     mock.expect_ask("GetApiClientForEditing")
//!         .with_payload(json!({"apiClientId": 1}))
//!         .return_ok(Some(json!({"id_api_client": 1})));
//!
//!     let bus = mock.shared();
//!     let result = bus
//!         .ask(Query::new("GetApiClientForEditing", json!({"apiClientId": 1})))
//!         .await
//!         .unwrap();
//!     assert_eq!(result, Some(json!({"id_api_client": 1})));
//!     mock.verify();
//! }
//! ```
//!
//! ## Testing Failure Scenarios
//!
//! ```rust
//! use resource_framework::bus::{Command, CommandBus};
//! use resource_framework::error::BusError;
//! use resource_framework::mock::MockCommandBus;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockCommandBus::new();
//!     mock.expect_dispatch("DeleteApiClientCommand")
//!         .return_err(BusError::not_found("Api client 3 not found"));
//!
//!     let result = mock
//!         .shared()
//!         .dispatch(Command::new("DeleteApiClientCommand", json!({"apiClientId": 3})))
//!         .await;
//!     assert!(matches!(result, Err(BusError::Domain { .. })));
//! }
//! ```

use crate::bus::{Command, CommandBus, Query, QueryBus};
use crate::error::BusError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// =============================================================================
// EXPECTATION QUEUE
// =============================================================================

struct Expectation {
    name: String,
    payload: Option<Value>,
    response: Result<Option<Value>, BusError>,
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;
type Log = Arc<Mutex<Vec<Value>>>;

fn answer(
    queue: &Queue,
    log: &Log,
    kind: &str,
    name: &str,
    payload: Value,
) -> Result<Option<Value>, BusError> {
    let expectation = queue.lock().unwrap().pop_front();
    let Some(expectation) = expectation else {
        panic!("Unexpected {kind} `{name}`: no expectation left");
    };
    assert_eq!(
        expectation.name, name,
        "Expected {kind} `{}`, got `{name}`",
        expectation.name
    );
    if let Some(expected) = &expectation.payload {
        assert_eq!(expected, &payload, "Unexpected payload for {kind} `{name}`");
    }
    log.lock().unwrap().push(payload);
    expectation.response
}

/// Fluent builder for one bus expectation.
pub struct ExpectationBuilder {
    name: String,
    payload: Option<Value>,
    queue: Queue,
}

impl ExpectationBuilder {
    /// Also asserts the dispatched payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: Option<Value>) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: BusError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Option<Value>, BusError>) {
        self.queue.lock().unwrap().push_back(Expectation {
            name: self.name,
            payload: self.payload,
            response,
        });
    }
}

// =============================================================================
// MOCK BUSES
// =============================================================================

/// A query bus answering from queued expectations.
#[derive(Clone, Default)]
pub struct MockQueryBus {
    expectations: Queue,
    received: Log,
}

impl MockQueryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a query named `name`.
    pub fn expect_ask(&mut self, name: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            name: name.to_string(),
            payload: None,
            queue: self.expectations.clone(),
        }
    }

    /// A handle sharing this mock's expectations, for wiring into providers.
    pub fn shared(&self) -> Arc<dyn QueryBus> {
        Arc::new(self.clone())
    }

    /// Payloads received so far, in dispatch order.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all query expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl QueryBus for MockQueryBus {
    async fn ask(&self, query: Query) -> Result<Option<Value>, BusError> {
        answer(&self.expectations, &self.received, "query", &query.name, query.payload)
    }
}

/// A command bus answering from queued expectations.
#[derive(Clone, Default)]
pub struct MockCommandBus {
    expectations: Queue,
    received: Log,
}

impl MockCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a command named `name`.
    pub fn expect_dispatch(&mut self, name: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            name: name.to_string(),
            payload: None,
            queue: self.expectations.clone(),
        }
    }

    pub fn shared(&self) -> Arc<dyn CommandBus> {
        Arc::new(self.clone())
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all command expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl CommandBus for MockCommandBus {
    async fn dispatch(&self, command: Command) -> Result<Option<Value>, BusError> {
        answer(
            &self.expectations,
            &self.received,
            "command",
            &command.name,
            command.payload,
        )
    }
}
