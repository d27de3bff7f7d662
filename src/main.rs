//! Main entry point for the wardbook server.
//!
//! Wires the in-memory document store, the core services, and the
//! notification dispatcher, then serves the REST API until the process is
//! asked to stop. Shutdown closes the notification queue so queued inbox
//! writes drain before exit.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, AppState};
use wardbook_core::{
    config::invoice_due_days_from_env_value, CoreConfig, Dispatcher, InboxSink,
};
use wardbook_docstore::MemoryStore;

/// # Environment Variables
/// - `WARDBOOK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `WARDBOOK_INVOICE_DUE_DAYS`: Payment horizon in days for invoices the
///   system creates (default: 30)
///
/// # Errors
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wardbook=info".parse()?)
                .add_directive("wardbook_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("WARDBOOK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let invoice_due_days =
        invoice_due_days_from_env_value(std::env::var("WARDBOOK_INVOICE_DUE_DAYS").ok())?;
    let cfg = Arc::new(CoreConfig::new(invoice_due_days)?);

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let dispatcher = Arc::new(Dispatcher::spawn(Arc::new(InboxSink::new(store.clone()))));
    let state = AppState::new(cfg, store, dispatcher.clone());

    tracing::info!("++ Starting wardbook REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispatcher.close();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
