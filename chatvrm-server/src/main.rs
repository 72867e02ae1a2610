// ChatVRM voice and screenplay API server

use chatvrm_core::ChatVrmConfig;
use chatvrm_server::{create_router, ApiState};
use chatvrm_spk::KoeiromapClient;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatvrm-server")]
#[command(about = "ChatVRM voice synthesis and screenplay API", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short)]
    config: Option<String>,

    /// Bind address, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// HTTP port, overrides the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => ChatVrmConfig::from_file(path)?,
        None => ChatVrmConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(host) = args.host {
        config.server.bind_address = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    info!("🚀 Starting ChatVRM server...");

    let synthesizer = KoeiromapClient::new(config.koeiromap.clone())?;
    if config.koeiromap.api_key.is_some() {
        info!("✅ Koemotion API key loaded");
    }
    let state = ApiState::new(Arc::new(synthesizer), config.segmenter.clone(), config.voice);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

/// Wait for shutdown signal
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
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

    info!("🛑 Shutdown signal received");
}
