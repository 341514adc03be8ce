//! sofie-monitor server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use monitor_agent::{SharedAgent, SofieCoreAgent};
use monitor_api::{AppState, health_router, router as api_router};
use monitor_common::{AppResult, Config, StorageConfig};
use monitor_core::{InstanceService, ServiceMessageService};
use monitor_db::{
    InstanceRepository, KeyedLocks, MessageRepository, SharedInstanceStore, SharedMessageStore,
};
use monitor_distribution::{
    DistributionCoordinator, JobScheduler, ProcessorContext, ProcessorRegistry, RetryingExecutor,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Open the message and instance registries.
async fn open_stores(
    storage: &StorageConfig,
) -> AppResult<(SharedMessageStore, SharedInstanceStore)> {
    match (storage.messages_path(), storage.instances_path()) {
        (Some(messages_path), Some(instances_path)) => {
            let messages = MessageRepository::open(&messages_path).await?;
            let instances = InstanceRepository::open(&instances_path).await?;
            info!(
                messages = %messages_path.display(),
                instances = %instances_path.display(),
                "Opened registries"
            );
            Ok((Arc::new(messages), Arc::new(instances)))
        }
        _ => {
            warn!("No storage.data_dir configured, registries are kept in memory only");
            Ok((
                Arc::new(MessageRepository::in_memory()),
                Arc::new(InstanceRepository::in_memory()),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,monitor_distribution=debug,monitor_agent=debug,tower_http=debug".into()
            }),
        )
        .init();

    info!("Starting sofie-monitor...");

    // Load configuration
    let config = Config::load()?;

    let (messages, instances) = open_stores(&config.storage).await?;
    let agent: SharedAgent = Arc::new(SofieCoreAgent::new(&config.agent)?);

    // Distribution engine
    let locks = KeyedLocks::new();
    let scheduler = JobScheduler::new();
    let registry = ProcessorRegistry::standard(ProcessorContext {
        messages: messages.clone(),
        instances: instances.clone(),
        agent: agent.clone(),
        locks: locks.clone(),
    });
    let coordinator = DistributionCoordinator::new(
        registry,
        RetryingExecutor::new(scheduler.clone()),
        &config.distribution,
    );

    // Services
    let message_service = ServiceMessageService::new(
        messages.clone(),
        instances.clone(),
        agent,
        coordinator,
        locks,
        &config.messages,
    );
    let instance_service = InstanceService::new(instances, messages);

    if config.distribution.resume_on_startup {
        message_service.resume_pending().await?;
    }

    let state = AppState {
        message_service,
        instance_service,
        scheduler: scheduler.clone(),
    };

    // Build router
    let app = Router::new()
        .merge(health_router())
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let pending = scheduler.shutdown();
    if pending > 0 {
        warn!(
            pending,
            "Dropped pending distribution jobs, they are rescheduled on next start"
        );
    }

    info!("Server shutdown complete");
    Ok(())
}
