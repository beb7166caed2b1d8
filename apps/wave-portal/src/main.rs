use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod config;
mod contract;
mod error;
mod wallet;

#[cfg(test)]
mod testing;

use app::{Page, WaveApp};
use config::Config;
use error::Result;
use wallet::{RpcWallet, WalletProvider};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// "Wave at Me", with an optional message.
    Wave(Option<String>),
    Connect,
    Refresh,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "wave" | "w" => Some(Command::Wave((!rest.is_empty()).then(|| rest.to_owned()))),
        "connect" | "c" => Some(Command::Connect),
        "refresh" | "r" => Some(Command::Refresh),
        "quit" | "q" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting Wave Portal v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Contract: {}", config.contract_address);

    let wallet: Option<Arc<dyn WalletProvider>> = match &config.wallet_rpc_url {
        Some(rpc_url) => {
            tracing::info!("Wallet RPC: {}", rpc_url);
            Some(Arc::new(RpcWallet::connect(
                rpc_url,
                config.wallet_ws_url.clone(),
            )?))
        }
        None => None,
    };

    let page = Page::mount(WaveApp::new(wallet, config.contract_address)).await;
    tracing::info!(
        state = ?page.app().connection_state().await,
        listening = page.is_listening(),
        "Page mounted"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut changes = page.app().waves().subscribe_updates();
    let mut in_flight = JoinSet::new();

    draw(&page).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Ok(()) = changes.changed() => draw(&page).await,
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("Wave task failed: {e}");
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Failed to read input: {e}");
                        break;
                    }
                };

                match parse_command(&line) {
                    Some(Command::Quit) => break,
                    Some(Command::Connect) => page.app().request_connection().await,
                    Some(Command::Refresh) => page.app().fetch_all_waves().await,
                    Some(Command::Wave(message)) => {
                        let app = page.app().clone();
                        let message = message.unwrap_or_else(|| config.wave_message.clone());
                        // Confirmation has no timeout, keep the page responsive meanwhile.
                        in_flight.spawn(async move {
                            app.send_wave(&message).await;
                        });
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("Commands: wave [message], connect, refresh, quit"),
                }
                draw(&page).await;
            }
        }
    }

    cancel_in_flight_waves(&mut in_flight).await;
    page.unmount().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn draw(page: &Page) {
    let mut stdout = tokio::io::stdout();
    let frame = format!("\n{}\n> ", page.render().await);

    if let Err(e) = stdout.write_all(frame.as_bytes()).await {
        tracing::warn!("Failed to draw page: {e}");
    }
    if let Err(e) = stdout.flush().await {
        tracing::warn!("Failed to flush page: {e}");
    }
}

/// Aborts waves still waiting for confirmation. Returns how many were dropped.
async fn cancel_in_flight_waves(in_flight: &mut JoinSet<()>) -> usize {
    let pending = in_flight.len();
    if pending > 0 {
        tracing::warn!("Abandoning {pending} unconfirmed wave(s)");
        in_flight.shutdown().await;
    }
    pending
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install is logged
/// and never fires, leaving `quit` and end of input to stop the page.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, closing page..."),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM, closing page...");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
}
