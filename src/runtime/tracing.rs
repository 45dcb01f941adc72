/// Initializes the tracing/logging infrastructure for the application.
///
/// This sets up structured logging using the `tracing` crate with:
/// - **Environment-based filtering**: Controlled via `RUST_LOG` environment variable
/// - **Compact formatting**: One line per event, without module targets
///
/// # Environment Variables
///
/// Set `RUST_LOG` to control log verbosity:
/// - `RUST_LOG=info` - Show served requests, warnings and errors
/// - `RUST_LOG=debug` - Also show dispatched query/command payloads
/// - `RUST_LOG=resource_framework=debug,shop_api=info` - Per-crate levels
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("API started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
