//! Segment service binary.
//!
//! Loads configuration, connects to PostgreSQL, starts the expiry sweeper
//! and serves the REST API until Ctrl-C or SIGTERM.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use segment_service::adapters::http::{api_router, SegmentAppState};
use segment_service::adapters::{
    CsvReportStorage, ExpirySweeper, ExpirySweeperConfig, PostgresSegmentRepository,
};
use segment_service::config::{AppConfig, ConfigError, ValidationError};
use segment_service::domain::segment::CohortSampler;
use segment_service::ports::{ReportStorage, SegmentRepository};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "segment-service failed");
        eprintln!("segment-service: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        check_period = ?config.sweeper.check_period,
        "Segment service starting"
    );

    let pool = config.database.connect().await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    tokio::fs::create_dir_all(&config.reports.directory).await?;

    let repository: Arc<dyn SegmentRepository> = Arc::new(PostgresSegmentRepository::new(pool));
    let report_storage: Arc<dyn ReportStorage> = Arc::new(CsvReportStorage::new(
        config.reports.directory.clone(),
        config.reports.public_base_url.clone(),
    ));
    let state = SegmentAppState::new(
        Arc::clone(&repository),
        report_storage,
        Arc::new(CohortSampler::from_entropy()),
    );

    let sweeper = ExpirySweeper::with_config(
        Arc::clone(&repository),
        ExpirySweeperConfig::default().with_check_period(config.sweeper.check_period),
    )
    .spawn();

    let app = api_router(
        state,
        &config.server.cors_origins_list(),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let stats = sweeper.shutdown().await;
    tracing::info!(
        sweeps = stats.sweeps,
        failures = stats.failures,
        rows_removed = stats.rows_removed,
        "Expiry sweeper stopped"
    );

    served?;
    tracing::info!("Segment service stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
