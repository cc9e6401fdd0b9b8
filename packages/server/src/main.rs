use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use server::config::AppConfig;
use server::events::EventHub;
use server::state::AppState;
use server::{build_router, database, jobs, runner, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codymatch_server=info,server=info,tower_http=info")),
        )
        .with(fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    seed::seed_all(&db, &config.bootstrap)
        .await
        .context("Failed to seed reference data")?;

    let runner = runner::from_config(&config.runner).context("Failed to build code runner")?;
    let events = EventHub::new();

    let shutdown = CancellationToken::new();
    let sweep = tokio::spawn(jobs::run_phase_sweep(
        db.clone(),
        events.clone(),
        config.scheduler.phase_sweep_interval_secs,
        shutdown.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db,
        config,
        events: events.clone(),
        runner,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("CodyMatch listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(events))
        .await?;

    shutdown.cancel();
    if let Err(e) = sweep.await {
        tracing::warn!(error = %e, "Phase sweep task ended abnormally");
    }
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. Open SSE streams are closed so the server can drain.
async fn shutdown_signal(events: EventHub) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }

    events.close_all();
}
