//! SmartUI Fusion binary
//!
//! `smartui-fusion replay <file>` feeds a JSON Lines file of interactions and
//! decision requests through the service and prints each decision as JSON.
//! `smartui-fusion serve` idles with maintenance running until Ctrl-C.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartui_common::VERSION;
use smartui_service::{LoggingSink, ReplayRecord, ServiceConfig, SmartUiService};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting SmartUI Fusion v{}", VERSION);

    let config = ServiceConfig::load()?;
    info!(
        strategies = ?config.decision.strategies,
        buffer_capacity = config.analyzer.buffer_capacity,
        "Loaded configuration"
    );

    let service = Arc::new(
        SmartUiService::builder(config)
            .sink(Arc::new(LoggingSink))
            .build()?,
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("replay") => {
            let path = args.get(1).context("usage: smartui-fusion replay <file>")?;
            replay(&service, path).await
        }
        Some("serve") | None => serve(service).await,
        Some(other) => bail!("unknown command: {} (expected `replay <file>` or `serve`)", other),
    }
}

async fn replay(service: &SmartUiService, path: &str) -> Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path))?;
    let mut lines = BufReader::new(file).lines();
    let (mut interactions, mut decisions, mut rejected) = (0u64, 0u64, 0u64);
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed line");
                rejected += 1;
                continue;
            }
        };

        match record {
            ReplayRecord::Interaction(raw) => match service.push_interaction(raw) {
                Ok(_) => interactions += 1,
                Err(e) => {
                    warn!(line = line_no, error = %e, "Interaction rejected");
                    rejected += 1;
                }
            },
            ReplayRecord::Decision(request) => match service.handle_input(request).await {
                Ok(result) => {
                    decisions += 1;
                    println!("{}", serde_json::to_string(&result)?);
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "Decision request rejected");
                    rejected += 1;
                }
            },
        }
    }

    let metrics = service.performance_metrics();
    info!(
        interactions,
        decisions,
        rejected,
        average_confidence = metrics.average_confidence,
        "Replay finished"
    );
    eprintln!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

async fn serve(service: Arc<SmartUiService>) -> Result<()> {
    let maintenance = service.clone().start_maintenance();
    info!("SmartUI Fusion running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Received shutdown signal");

    maintenance.abort();
    let stats = service.analyzer_stats();
    info!(
        users = stats.tracked_users,
        analyses = stats.analyses,
        decisions = service.performance_metrics().total_decisions,
        "Shutting down SmartUI Fusion"
    );
    Ok(())
}
