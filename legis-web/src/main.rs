//! legis-web - legislative monitor web server
//!
//! Serves the deputy/proposal pages, news portal, task management,
//! parliamentary dashboard, AI analysis pages and the admin browser.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legis_common::ai::AnalysisService;
use legis_common::config::{CliOverrides, Config};
use legis_common::db::init_database;
use legis_web::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "legis-web")]
#[command(about = "Web pages of the legislative monitor")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "LEGIS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8000
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legis_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting legis-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    let args = Args::parse();
    let config = Config::load(
        args.config.as_deref(),
        &CliOverrides {
            database_path: args.database,
            bind_addr: args.bind,
        },
    )
    .context("Failed to load configuration")?;

    info!("Database: {}", config.database_path.display());
    let db = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let ai = AnalysisService::from_config(&config).context("Failed to configure AI client")?;
    if ai.is_enabled() {
        info!("AI analysis enabled (model {})", ai.chat_model());
    } else {
        info!("AI analysis disabled: OPENAI_API_KEY not set, semantic search uses text matching");
    }

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(db, config, ai));

    info!("Listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
