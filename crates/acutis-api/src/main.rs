use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod sink;
mod state;

use acutis_intake::{IntakeService, ServiceOptions};
use config::LogFormat;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // `acutis-intake init-config` writes the effective config and exits.
    if std::env::args().nth(1).as_deref() == Some("init-config") {
        let path = config::config_path()?;
        let config = config::load_config()?;
        config::save_config_to(&config, &path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = config::load_config()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init(),
    }

    tracing::info!(
        storage = %config.storage.describe(),
        bind_addr = %config.bind_addr,
        "starting intake service"
    );

    let store = config.storage.open().await;
    let intake = IntakeService::open(
        store,
        ServiceOptions {
            seed_catalog: config.seed_catalog,
            sink: Arc::new(sink::AdmissionAuditSink),
        },
    )
    .await?;
    let intake = Arc::new(intake);

    let app = routes::router(AppState {
        intake: Arc::clone(&intake),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    intake.flush().await?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
