//! Extraction of the packet and round-trip trailer of a probe batch.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use super::ProbeError;

/// Round-trip time summary in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RttSummary {
    pub min: u32,
    pub max: u32,
    pub avg: u32,
}

/// Aggregate counters reported at the end of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packets_lost: u32,
    /// Loss as printed by the utility, which truncates rather than rounds.
    /// See [`BatchStats::computed_loss_percent`] for the value derived from
    /// the counters.
    pub loss_percent: u8,
    /// Absent when every attempt in the batch failed.
    pub rtt: Option<RttSummary>,
}

impl BatchStats {
    /// Loss percentage recomputed from the counters, `None` for an empty batch.
    pub fn computed_loss_percent(&self) -> Option<u8> {
        if self.packets_sent == 0 {
            return None;
        }
        let percent = 100.0 * f64::from(self.packets_lost) / f64::from(self.packets_sent);
        Some(percent.round() as u8)
    }
}

fn summary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*Packets: Sent = (?P<sent>[^,]*), Received = (?P<received>[^,]*), Lost = (?P<lost>\S*) \((?P<percent>[^%]*)% loss\),",
        )
        .expect("summary pattern is valid")
    })
}

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*Minimum = (?P<min>\S*?)ms, Maximum = (?P<max>\S*?)ms, Average = (?P<avg>\S*?)ms",
        )
        .expect("timing pattern is valid")
    })
}

fn field(caps: &Captures<'_>, name: &str) -> Result<u32, ProbeError> {
    let raw = &caps[name];
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ProbeError::MalformedStats(format!("{name} is not a count: {raw:?}")))
}

/// Parse the statistics trailer out of a full batch output.
///
/// The summary line is required; the timing line is optional since the
/// utility omits it when no attempt succeeded.
pub fn extract_stats(text: &str) -> Result<BatchStats, ProbeError> {
    let mut counts = None;
    let mut rtt = None;

    for line in text.lines() {
        if let Some(caps) = summary_regex().captures(line) {
            counts = Some((
                field(&caps, "sent")?,
                field(&caps, "received")?,
                field(&caps, "lost")?,
                field(&caps, "percent")?,
            ));
        }

        if let Some(caps) = timing_regex().captures(line) {
            rtt = Some(RttSummary {
                min: field(&caps, "min")?,
                max: field(&caps, "max")?,
                avg: field(&caps, "avg")?,
            });
        }
    }

    let (sent, received, lost, percent) = counts.ok_or(ProbeError::MissingStats)?;

    if received.checked_add(lost) != Some(sent) {
        return Err(ProbeError::MalformedStats(format!(
            "sent {sent} != received {received} + lost {lost}"
        )));
    }
    let loss_percent = u8::try_from(percent)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| ProbeError::MalformedStats(format!("loss of {percent}% is out of range")))?;

    Ok(BatchStats {
        packets_sent: sent,
        packets_received: received,
        packets_lost: lost,
        loss_percent,
        rtt,
    })
}
