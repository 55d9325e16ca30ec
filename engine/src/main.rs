// Signal desk entry point: runs the dashboard headless and takes operator
// commands on stdin.
use anyhow::Context;
use engine::config::settings::EngineSettings;
use engine::services::command::{self, Command};
use engine::services::{Clock, Dashboard, DashboardEvent, DashboardHandle, SystemClock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

fn log_event(event: &DashboardEvent) {
    match event {
        DashboardEvent::CandleAppended { candle, snapshot } => {
            tracing::debug!(close = candle.close, rsi = snapshot.rsi, macd = snapshot.macd, "candle")
        }
        DashboardEvent::ExpressBlink { .. } => {}
        other => match serde_json::to_string(other) {
            Ok(json) => info!(event = %json, "dashboard event"),
            Err(e) => warn!(error = %e, "Failed to encode dashboard event"),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting signal desk...");

    let settings = match std::env::args().nth(1) {
        Some(path) => EngineSettings::load(&path).with_context(|| format!("loading settings from {}", path))?,
        None => EngineSettings::embedded().context("loading embedded settings")?,
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut dashboard = Dashboard::new(&settings, Box::new(StdRng::from_entropy()))?;
    dashboard.select_instrument(&settings.market.default_instrument, clock.now())?;
    let handle = DashboardHandle::spawn(dashboard, clock);

    let mut events = handle.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("Commands: express | hourly | 5h | 24h | pair <SYMBOL> | play | pause | toggle | wait | indicators | status | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: keep running until interrupted.
                    tokio::signal::ctrl_c().await?;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(cmd) => match command::apply(&handle, cmd).await {
                        Ok(reply) => println!("{}", reply),
                        Err(e) => warn!(error = %e, "Command failed"),
                    },
                    Err(e) => warn!(error = %e, "Ignoring input"),
                }
            }
        }
    }

    info!("Shutting down...");
    handle.shutdown().await;
    logger.await?;
    Ok(())
}
