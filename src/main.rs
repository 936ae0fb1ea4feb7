use anyhow::{Context, Result};
use lotus_core::{App, Config};
use lotus_services::{Sidebar, SidebarCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

fn main() -> Result<()> {
    // Initialize core
    lotus_core::init()?;

    let config_path = Config::resolve_path(std::env::args().nth(1))?;

    // Timers, fetches and commands all share one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(run(config_path));
    // The stdin reader may be parked in a blocking read
    runtime.shutdown_background();
    result
}

async fn run(config_path: std::path::PathBuf) -> Result<()> {
    let app = App::new(&config_path)?;
    tracing::info!("Lotus sidebar started");

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::channel(16);

    tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            println!("{}", frame);
        }
    });

    let interrupt_tx = command_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt_tx.send(SidebarCommand::Shutdown).await;
        }
    });

    // Settings panel stand-in: one command per line on stdin. End of input
    // stops the reader only; the sidebar keeps running until interrupted.
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::debug!("stdin closed");
                    std::future::pending().await
                }
                Err(e) => {
                    tracing::error!("Failed to read command: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<SidebarCommand>() {
                Ok(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }
    });

    let sidebar = Sidebar::new(app, frame_tx)?;
    sidebar.run(command_rx).await?;

    Ok(())
}
