//! SailSim Client - real-time client for the SailSim 2D sailing simulation
//!
//! This is the main entry point for the client. It handles:
//! - WebSocket connection to the authoritative simulation server
//! - Mirroring boats, wake trails and the race course from server messages
//! - Mapping terminal input to rudder/throttle commands and zoom
//! - Reconnecting with a fresh state when the connection drops

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sailsim_client::config::Config;
use sailsim_client::game::InputEvent;
use sailsim_client::render::{LogRenderer, Renderer};
use sailsim_client::ws::session::run_session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting SailSim client");
    info!("Server: {}", config.server_url);
    info!("Input: 'press <key>', 'release <key>', 'wheel <delta>' (keys: left right up down)");

    // Terminal input feeds the session loop
    let (input_tx, mut input_rx) = mpsc::channel(64);
    tokio::spawn(read_terminal_input(input_tx));

    let mut renderer = LogRenderer::new();

    tokio::select! {
        _ = connection_loop(&config, &mut renderer, &mut input_rx) => {}
        _ = shutdown_signal() => {}
    }

    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Connect, run until the server goes away, wait, reconnect. Every
/// connection starts from an empty client state.
async fn connection_loop<R: Renderer>(
    config: &Config,
    renderer: &mut R,
    input_rx: &mut mpsc::Receiver<InputEvent>,
) {
    loop {
        match run_session(config, renderer, input_rx).await {
            Ok(stats) => {
                debug!(?stats, "Session finished");
            }
            Err(e) => {
                error!(error = %e, "Session failed");
            }
        }

        info!(
            delay_secs = config.reconnect_delay.as_secs(),
            "Reconnecting after delay"
        );
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Read input lines from stdin and forward parsed events
async fn read_terminal_input(tx: mpsc::Sender<InputEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<InputEvent>() {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring input"),
                }
            }
            Ok(None) => {
                debug!("Terminal input closed");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to read terminal input");
                break;
            }
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
