//! Runtime wiring and environment setup.
//!
//! This module contains the infrastructure for running the API:
//!
//! - **Wiring**: building the registry and connecting collaborators to the kernel
//! - **Configuration**: page limits and shop defaults
//! - **Observability setup**: initializing tracing and logging
//!
//! # Main Components
//!
//! - [`ApiSystem`] - The wired API, ready to serve requests
//! - [`ApiSettings`] - Serde-loadable settings with defaults
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod settings;
pub mod system;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use settings::{ApiSettings, SettingsError};
pub use system::{ApiSystem, Collaborators};
