use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uptime_notify::{AlertDispatcher, LogOnlyGateway, MessageGateway, SmsConfig, TwilioSmsGateway};
use uptime_store::{FsLogStore, FsRecordStore};
use uptime_worker::config::LogFormat;
use uptime_worker::{AuditLogger, CheckScheduler, HttpProber, RotationManager, WorkerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    tracing::info!(
        data_dir = %config.data_dir.display(),
        logs_dir = %config.logs_dir.display(),
        "Starting uptime worker",
    );

    // --- Adapters ---
    let records = Arc::new(FsRecordStore::new(&config.data_dir));
    let logs = Arc::new(FsLogStore::new(&config.logs_dir));

    let gateway: Arc<dyn MessageGateway> = match SmsConfig::from_env() {
        Some(sms) => match TwilioSmsGateway::new(sms) {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build SMS gateway");
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::warn!("TWILIO_* not set, alerts will only be logged");
            Arc::new(LogOnlyGateway)
        }
    };

    let prober = match HttpProber::new() {
        Ok(prober) => Arc::new(prober),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    // --- Background workers ---
    let scheduler = CheckScheduler::new(
        records,
        AuditLogger::new(logs.clone()),
        prober,
        AlertDispatcher::new(gateway),
    )
    .with_interval(config.check_interval)
    .spawn();

    let rotation = RotationManager::new(logs)
        .with_interval(config.rotation_interval)
        .spawn();

    tracing::info!("Background workers are running");

    shutdown_signal().await;

    scheduler.stop().await;
    rotation.stop().await;
    tracing::info!("Uptime worker stopped");
    ExitCode::SUCCESS
}

fn init_tracing(format: LogFormat) {
    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "uptime_worker=info,uptime_notify=info,uptime_store=info".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Wait for SIGINT or SIGTERM. If a handler cannot be installed, that
/// signal is never awaited and the other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
