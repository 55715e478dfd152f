//! Shutdown signal wiring.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Create a token that cancels on SIGTERM or SIGINT.
///
/// Both signal streams are registered before this returns, so a signal
/// arriving right after startup is not missed.
#[cfg(unix)]
pub fn shutdown_token() -> std::io::Result<CancellationToken> {
    use tokio::signal::unix::{SignalKind, signal};

    let token = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let handle = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
        handle.cancel();
    });

    Ok(token)
}

/// Create a token that cancels on Ctrl+C (non-Unix fallback).
#[cfg(not(unix))]
pub fn shutdown_token() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
        }
        handle.cancel();
    });
    Ok(token)
}
