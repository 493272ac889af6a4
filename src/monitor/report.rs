//! Final summary of a monitoring run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::probe::RttSummary;

/// Aggregate reachability over every attempt of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub target: String,
    pub sent: u64,
    pub received: u64,
    pub lost: u64,
    pub loss_percent: u8,
    /// Present only if at least one attempt succeeded.
    pub rtt: Option<RttSummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// Mirrors the trailer the echo utility prints for a batch.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ping statistics for {}:", self.target)?;
        writeln!(
            f,
            "    Packets: Sent = {}, Received = {}, Lost = {} ({}% loss),",
            self.sent, self.received, self.lost, self.loss_percent
        )?;
        if let Some(rtt) = self.rtt {
            writeln!(f, "Approximate round trip times in milli-seconds:")?;
            writeln!(
                f,
                "    Minimum = {}ms, Maximum = {}ms, Average = {}ms",
                rtt.min, rtt.max, rtt.avg
            )?;
        }
        Ok(())
    }
}
