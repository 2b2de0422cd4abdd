use anyhow::Result;
use mira_core::Mira;
use tracing::{info, warn};

/// Run the event processor until Ctrl-C (or SIGTERM on unix).
pub async fn run(mira: Mira) -> Result<()> {
    let handle = mira.start_events();
    println!("MIRA daemon running. Press Ctrl-C to stop.");

    wait_for_shutdown().await;
    info!("Shutdown signal received");

    let status = handle.status();
    handle.stop().await?;
    println!(
        "Stopped after processing {} event(s).",
        status.processed_events
    );
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler, waiting for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
