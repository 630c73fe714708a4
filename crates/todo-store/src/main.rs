//! Todo API
//!
//! Serves the todo item endpoints. Each request's owner is the principal
//! the bearer-token authorizer resolves.

use authorizer::auth::Authorizer;
use authorizer::config::Config as AuthzConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use todo_store::routes::{self, AppState};
use todo_store::{PgItemStore, PresignedObjectStore, StoreConfig, TodoService};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_store=debug,authorizer=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting todo API");

    let authz_config = AuthzConfig::from_env().map_err(|e| {
        error!("Failed to load authorizer configuration: {}", e);
        e
    })?;
    let store_config = StoreConfig::from_env().map_err(|e| {
        error!("Failed to load store configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %authz_config.bind_address,
        bucket = %store_config.attachments.bucket,
        "Configuration loaded successfully"
    );

    let items = PgItemStore::connect(&store_config.database_url).await?;
    items.migrate().await?;
    info!("Database migrations applied");

    let objects = PresignedObjectStore::new(&store_config.attachments)?;

    let state = Arc::new(AppState {
        service: Arc::new(TodoService::new(Arc::new(items), Arc::new(objects))),
        authorizer: Arc::new(Authorizer::from_config(&authz_config)),
    });
    let app = routes::build_routes(state);

    let addr: SocketAddr = authz_config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Todo API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(authz_config.drain_seconds))
        .await?;

    info!("Todo API shutdown complete");

    Ok(())
}

/// Returns once SIGINT or SIGTERM arrives and the drain period has elapsed.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
    }
}
