// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc, time::Duration};

use axum_server::tls_rustls::RustlsConfig;
use confidential_sports::{
    api::router,
    auth::AuthConfig,
    clock::SystemClock,
    config::{AppConfig, ConfigError, LogFormat, TlsPaths, DEFAULT_LOG_FILTER},
    fhe::{FheError, MockCoprocessor},
    gateway::OracleWorker,
    ledger::{LedgerError, LocalLedger},
    registry::RegistryConfig,
    state::AppState,
    storage::{self, StorageError},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("coprocessor: {0}")]
    Coprocessor(#[from] FheError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("TLS: {0}")]
    Tls(String),

    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let coprocessor = Arc::new(match &config.coprocessor_secret {
        Some(secret) => MockCoprocessor::from_hex_secret(secret)?,
        None => {
            if config.data_dir.is_some() {
                warn!("COPROCESSOR_SECRET is unset; stored input proofs will not verify after restart");
            }
            MockCoprocessor::random()
        }
    });

    let registry_config = RegistryConfig::new(config.contract_address, config.owner, config.oracle_signer)
        .with_proposal_expiry(config.proposal_expiry_secs);
    let clock = Arc::new(SystemClock);

    let ledger = match &config.data_dir {
        Some(dir) => {
            let db = storage::open_in(dir)?;
            info!(path = %storage::database_path(dir).display(), "Opened registry database");
            LocalLedger::open(registry_config, coprocessor.clone(), clock, db)?
        }
        None => {
            warn!("DATA_DIR is unset; registry state is kept in memory only");
            LocalLedger::new(registry_config, coprocessor.clone(), clock)
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let oracle_worker = config.oracle.is_some();
    let worker_task = config.oracle.clone().map(|signer| {
        let worker = OracleWorker::new(ledger.clone(), signer, coprocessor.clone())
            .with_poll_interval(config.oracle_poll_interval);
        tokio::spawn(worker.run(shutdown.clone()))
    });

    let auth = AuthConfig {
        require_signatures: config.require_signatures,
    };
    if !auth.require_signatures {
        warn!("Request signatures are disabled (development mode)");
    }

    let state = AppState::new(ledger, auth).with_oracle_worker(oracle_worker);
    let app = router(state);
    let addr = config.bind_addr()?;

    info!(
        %addr,
        contract = %config.contract_address,
        oracle_signer = %config.oracle_signer,
        oracle_worker,
        persistent = config.data_dir.is_some(),
        "Confidential Sports server starting (docs at /docs)"
    );

    match &config.tls {
        Some(paths) => serve_tls(app, addr, paths, shutdown.clone()).await?,
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .await?;
        }
    }

    shutdown.cancel();
    if let Some(task) = worker_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Oracle worker task ended abnormally");
        }
    }
    info!("Server stopped");
    Ok(())
}

async fn serve_tls(
    app: axum::Router,
    addr: std::net::SocketAddr,
    paths: &TlsPaths,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| StartupError::Tls("a rustls crypto provider is already installed".into()))?;

    let tls = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(|e| StartupError::Tls(e.to_string()))?;
    info!(cert = %paths.cert.display(), "Loaded TLS certificate");

    let handle = axum_server::Handle::new();
    let on_shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        on_shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
