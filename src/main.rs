//! lping - continuous reachability monitor.
//!
//! Pings a host once per tick, prints each reply line, sounds an alert while
//! consecutive failures pile up and prints totals on Ctrl-C.

mod alert;
mod config;
mod monitor;
mod probe;

use alert::SoundAlert;
use config::{ConfigError, MonitorConfig, ReportFormat};
use monitor::Monitor;
use probe::{CommandProbe, Reply};

use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging; stdout is reserved for replies and the report
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("lping=info".parse()?))
        .init();

    // Load configuration
    let cfg = match MonitorConfig::load(std::env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(ConfigError::Usage) => {
            println!("{}", ConfigError::Usage);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let target = cfg.target.clone();
    let report_format = cfg.report_format;

    let probe = CommandProbe::new(cfg.ping_program.clone(), cfg.probe_timeout);
    let alert = SoundAlert::new(cfg.sound_player.clone());

    let (stop_tx, stop_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(());
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                // Hold the sender so the monitor keeps running.
                std::future::pending::<()>().await;
            }
        }
    });

    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_progress(progress_rx));

    println!();
    println!("Pinging {} with {} bytes of data:", target, cfg.packet_size);

    let monitor = Monitor::new(cfg, probe, alert).with_progress(progress_tx);
    let exit = monitor.run(stop_rx).await;
    drop(monitor);
    printer.await?;

    println!();
    if let Some(report) = exit.report {
        match report_format {
            ReportFormat::Text => print!("{}", report),
            ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
    }

    exit.result?;
    Ok(())
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<Reply>) {
    while let Some(reply) = rx.recv().await {
        println!("{}", reply.raw_line().trim_end());
    }
}
