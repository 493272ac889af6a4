//! Cross-tick counters of a monitoring run.

use chrono::{DateTime, Utc};

use super::Report;
use crate::probe::{Reply, RttSummary};

/// What a single recorded attempt changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub consecutive_failures: u32,
    /// The failure streak has reached the alert threshold on this tick.
    pub alert: bool,
}

/// Running totals for one monitoring run. Owned by the loop.
#[derive(Debug, Clone)]
pub struct MonitorState {
    total_attempts: u64,
    total_successes: u64,
    consecutive_failures: u32,
    round_trip_times: Vec<u32>,
    started_at: DateTime<Utc>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            total_attempts: 0,
            total_successes: 0,
            consecutive_failures: 0,
            round_trip_times: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Fold one attempt into the totals.
    pub fn record(&mut self, reply: &Reply, alert_threshold: u32) -> TickOutcome {
        self.total_attempts += 1;
        if let Some(ms) = reply.round_trip_ms() {
            self.round_trip_times.push(ms);
        }

        let alert = if reply.is_success() {
            self.total_successes += 1;
            self.consecutive_failures = 0;
            false
        } else {
            self.consecutive_failures += 1;
            self.consecutive_failures >= alert_threshold
        };

        TickOutcome {
            consecutive_failures: self.consecutive_failures,
            alert,
        }
    }

    pub fn total_attempts(&self) -> u64 {
        self.total_attempts
    }

    pub fn total_successes(&self) -> u64 {
        self.total_successes
    }

    #[cfg(test)]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    #[cfg(test)]
    pub fn round_trip_times(&self) -> &[u32] {
        &self.round_trip_times
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Summarise the run, `None` if no attempt was ever recorded.
    pub fn report(&self, target: &str) -> Option<Report> {
        if self.total_attempts == 0 {
            return None;
        }

        let sent = self.total_attempts;
        let received = self.total_successes;
        let loss = 100.0 - 100.0 * received as f64 / sent as f64;

        let rtt = if received > 0 {
            rtt_summary(&self.round_trip_times)
        } else {
            None
        };

        Some(Report {
            target: target.to_string(),
            sent,
            received,
            lost: sent - received,
            loss_percent: loss.round_ties_even() as u8,
            rtt,
            started_at: self.started_at,
            finished_at: Utc::now(),
        })
    }
}

fn rtt_summary(times: &[u32]) -> Option<RttSummary> {
    let min = *times.iter().min()?;
    let max = *times.iter().max()?;
    let sum: u64 = times.iter().map(|&t| u64::from(t)).sum();
    let avg = (sum as f64 / times.len() as f64).round_ties_even() as u32;
    Some(RttSummary { min, max, avg })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(ms: u32) -> Reply {
        Reply::Success {
            line: format!("Reply from 8.8.8.8: bytes=32 time={ms}ms TTL=64"),
            source_address: "8.8.8.8".to_string(),
            byte_count: 32,
            round_trip_ms: ms,
            ttl: 64,
        }
    }

    fn timeout() -> Reply {
        Reply::RequestTimedOut {
            line: "Request timed out.".to_string(),
        }
    }

    fn unreachable() -> Reply {
        Reply::DestinationHostUnreachable {
            line: "Reply from 10.0.0.1: Destination host unreachable.".to_string(),
            source_address: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn test_new_state_is_zeroed() {
        let state = MonitorState::new();
        assert_eq!(state.total_attempts(), 0);
        assert_eq!(state.total_successes(), 0);
        assert_eq!(state.consecutive_failures(), 0);
        assert!(state.round_trip_times().is_empty());
        assert!(state.report("8.8.8.8").is_none());
    }

    #[test]
    fn test_streak_resets_on_success() {
        let mut state = MonitorState::new();
        let streak: Vec<u32> = [timeout(), timeout(), success(10), unreachable(), success(20)]
            .iter()
            .map(|r| state.record(r, 2).consecutive_failures)
            .collect();
        assert_eq!(streak, vec![1, 2, 0, 1, 0]);
        assert_eq!(state.total_attempts(), 5);
        assert_eq!(state.total_successes(), 2);
        assert_eq!(state.round_trip_times(), &[10, 20]);
    }

    #[test]
    fn test_alert_fires_from_threshold_onward() {
        let mut state = MonitorState::new();
        let alerts: Vec<bool> = [timeout(), timeout(), timeout(), timeout(), success(5), timeout()]
            .iter()
            .map(|r| state.record(r, 3).alert)
            .collect();
        assert_eq!(alerts, vec![false, false, true, true, false, false]);
    }

    #[test]
    fn test_threshold_one_alerts_on_every_failure() {
        let mut state = MonitorState::new();
        assert!(state.record(&timeout(), 1).alert);
        assert!(!state.record(&success(1), 1).alert);
        assert!(state.record(&unreachable(), 1).alert);
    }

    #[test]
    fn test_report_with_round_trip_times() {
        let mut state = MonitorState::new();
        for reply in [success(10), timeout(), success(13), success(12)] {
            state.record(&reply, 2);
        }
        let report = state.report("8.8.8.8").unwrap();
        assert_eq!(report.sent, 4);
        assert_eq!(report.received, 3);
        assert_eq!(report.lost, 1);
        assert_eq!(report.loss_percent, 25);
        assert_eq!(
            report.rtt,
            Some(RttSummary {
                min: 10,
                max: 13,
                avg: 12
            })
        );
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_report_rounds_loss_percent() {
        let mut state = MonitorState::new();
        for reply in [success(1), timeout(), timeout()] {
            state.record(&reply, 5);
        }
        let report = state.report("8.8.8.8").unwrap();
        assert_eq!(report.loss_percent, 67);
        assert_eq!(report.rtt.map(|r| r.avg), Some(1));
    }

    #[test]
    fn test_report_rounds_halves_to_even() {
        let mut state = MonitorState::new();
        for ms in [2, 3, 3, 2, 2, 3, 2] {
            state.record(&success(ms), 2);
        }
        state.record(&timeout(), 2);
        let report = state.report("8.8.8.8").unwrap();
        assert_eq!(report.loss_percent, 12);
        assert_eq!(report.rtt.map(|r| r.avg), Some(2));

        let mut state = MonitorState::new();
        state.record(&success(2), 2);
        state.record(&success(3), 2);
        let report = state.report("8.8.8.8").unwrap();
        assert_eq!(report.rtt.map(|r| r.avg), Some(2));
    }

    #[test]
    fn test_report_without_successes_has_no_rtt() {
        let mut state = MonitorState::new();
        state.record(&timeout(), 2);
        state.record(&unreachable(), 2);
        let report = state.report("10.0.0.1").unwrap();
        assert_eq!(report.loss_percent, 100);
        assert_eq!(report.rtt, None);
    }
}
