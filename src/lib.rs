//! # Shop API
//!
//! > **Resource adapters between a REST surface and a CQRS domain layer.**
//!
//! This crate declares the shop's API resources on top of
//! [`resource_framework`] and wires them to their collaborators: the query and
//! command buses, the legacy grids, and the legacy order store.
//!
//! ## Design Philosophy
//!
//! A resource is pure configuration. It names its routes, the CQRS message each
//! route sends, and how field names translate between the API and the domain.
//! The framework does the rest:
//! - **Reads** go through a query provider or a paginated grid provider.
//! - **Writes** go through the command processor, or a named custom processor
//!   when the domain layer has no command for the action.
//! - **Errors** are classified once and mapped to statuses per resource.
//!
//! ## Module Tour
//!
//! ### 1. Declarations ([`resources`])
//! One module per resource, collected into an immutable registry.
//!
//! ### 2. Legacy order actions ([`order_actions`])
//! Status and tracking changes applied directly to the legacy order store.
//! - **Key items**: [`OrderAction`](order_actions::OrderAction),
//!   [`OrderActionProcessor`](order_actions::OrderActionProcessor).
//!
//! ### 3. Grids ([`grids`])
//! In-memory grid sources and the module row enricher.
//!
//! ### 4. Runtime ([`runtime`])
//! Settings, tracing setup and [`ApiSystem`](runtime::ApiSystem), the wired API.
//!
//! ### 5. Demo collaborators ([`demo`])
//! In-memory handlers used by the demo binary and end-to-end tests.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test --workspace
//! ```

pub mod demo;
pub mod grids;
pub mod order_actions;
pub mod resources;
pub mod runtime;
