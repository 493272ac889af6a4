//! Monitor loop: one single-attempt probe per tick, failure-streak alerts
//! and a final report.

mod report;
mod state;

pub use report::*;
pub use state::*;

use crate::alert::AlertDispatcher;
use crate::config::MonitorConfig;
use crate::probe::{parse_session, ProbeError, ProbeExecutor, Reply};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};

/// How a run ended.
#[derive(Debug)]
pub struct MonitorExit {
    /// Summary of every attempt recorded before the loop stopped.
    pub report: Option<Report>,
    /// `Err` if a tick failed and ended the run.
    pub result: Result<(), ProbeError>,
}

/// Drives the probe executor at a fixed cadence.
pub struct Monitor<P, A> {
    config: MonitorConfig,
    probe: P,
    alert: A,
    progress: Option<mpsc::UnboundedSender<Reply>>,
}

impl<P, A> Monitor<P, A>
where
    P: ProbeExecutor,
    A: AlertDispatcher,
{
    pub fn new(config: MonitorConfig, probe: P, alert: A) -> Self {
        Self {
            config,
            probe,
            alert,
            progress: None,
        }
    }

    /// Send every classified attempt to `tx` as it happens.
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<Reply>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Run until a stop signal arrives or a tick fails.
    ///
    /// The stop signal is only observed while waiting for the next tick, so
    /// an in-flight probe always completes.
    pub async fn run(&self, mut stop_rx: broadcast::Receiver<()>) -> MonitorExit {
        let mut state = MonitorState::new();

        tracing::info!(
            "Monitoring {} every {:?} (alert after {} consecutive failures)",
            self.config.target,
            self.config.interval,
            self.config.alert_threshold
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = stop_rx.recv() => break Ok(()),
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            if let Err(e) = self.tick(&mut state).await {
                tracing::error!("Monitoring {} stopped: {}", self.config.target, e);
                break Err(e);
            }
        };

        let elapsed = Utc::now() - state.started_at();
        tracing::info!(
            "Stopped monitoring {} after {} attempts ({} replies) in {}s",
            self.config.target,
            state.total_attempts(),
            state.total_successes(),
            elapsed.num_seconds()
        );

        MonitorExit {
            report: state.report(&self.config.target),
            result,
        }
    }

    async fn tick(&self, state: &mut MonitorState) -> Result<(), ProbeError> {
        let reply = self.probe_once().await?;
        let outcome = state.record(&reply, self.config.alert_threshold);

        tracing::debug!(
            kind = %reply.kind(),
            source = ?reply.source_address(),
            consecutive_failures = outcome.consecutive_failures,
            "Recorded attempt"
        );

        if outcome.alert {
            self.alert.raise_alert(&self.config.alert_signal);
        }

        if let Some(tx) = &self.progress {
            // A closed receiver only means nobody is watching.
            let _ = tx.send(reply);
        }

        Ok(())
    }

    async fn probe_once(&self) -> Result<Reply, ProbeError> {
        let text = self
            .probe
            .run_probe(&self.config.target, 1, self.config.packet_size)
            .await?;
        let session = parse_session(&text)?;
        tracing::trace!(
            computed_loss_percent = ?session.stats.computed_loss_percent(),
            "Parsed batch\n{}",
            session
        );
        let [reply]: [Reply; 1] = session
            .replies
            .try_into()
            .map_err(|replies: Vec<Reply>| ProbeError::ProtocolViolation(replies.len()))?;
        Ok(reply)
    }
}
