//! # bizhubd — bizhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`bizhub.toml` + environment overrides)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` pool backing the engine's key-value blobs and
//!   the activity journal
//! - Build the action registry and the automation engine, then start it
//!   (load persisted rules, subscribe to the store, start the scanner)
//! - Serve the axum router until SIGINT/SIGTERM, then stop the scanner
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bizhub_adapter_http_axum::state::AppState;
use bizhub_adapter_memory::{InMemoryEntityStore, TracingNotificationSink};
use bizhub_adapter_storage_sqlite_sqlx::{SqliteActivityLog, SqliteKeyValueStore};
use bizhub_app::actions::{ActionRegistry, BuiltinPorts};
use bizhub_app::automation_engine::AutomationEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    let bind_addr = config.bind_addr();

    // Database
    let db = bizhub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Ports
    let store = Arc::new(InMemoryEntityStore::new());
    let registry = ActionRegistry::builtin(BuiltinPorts {
        store: Arc::clone(&store),
        notifications: TracingNotificationSink,
        activity: SqliteActivityLog::new(pool.clone()),
        webhook: config.webhook.build()?,
    });

    // Engine
    let engine = Arc::new(AutomationEngine::new(
        store,
        SqliteKeyValueStore::new(pool),
        registry,
        config.automation,
    ));
    engine.init().await?;

    // HTTP
    let app = bizhub_adapter_http_axum::router::build(AppState::new(Arc::clone(&engine)));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "bizhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.dispose().await;
    tracing::info!("bizhubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown requested");
}
