//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the wardbook REST API server on its own, backed by the in-memory
//! document store.
//!
//! ## Intended use
//! Development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `wardbook-run` binary is the
//! one to deploy.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use wardbook_core::{
    config::invoice_due_days_from_env_value, CoreConfig, Dispatcher, InboxSink,
};
use wardbook_docstore::MemoryStore;

/// Main entry point for the wardbook REST API server.
///
/// Starts the REST API server on the configured address (default:
/// 0.0.0.0:3000) with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `WARDBOOK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `WARDBOOK_INVOICE_DUE_DAYS`: Payment horizon for new invoices
///   (default: 30)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("wardbook_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WARDBOOK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting wardbook REST API on {}", addr);

    let invoice_due_days =
        invoice_due_days_from_env_value(std::env::var("WARDBOOK_INVOICE_DUE_DAYS").ok())?;
    let cfg = Arc::new(CoreConfig::new(invoice_due_days)?);

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let dispatcher = Arc::new(Dispatcher::spawn(Arc::new(InboxSink::new(store.clone()))));
    let state = AppState::new(cfg, store, dispatcher.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    dispatcher.close();
    Ok(())
}
