//! Parsing of a complete probe batch.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::{classify, extract_stats, BatchStats, ProbeError, Reply};

/// One parsed probe batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Target as echoed by the utility header, e.g. `example.com [93.184.216.34]`.
    pub target_identity: String,
    pub replies: Vec<Reply>,
    pub stats: BatchStats,
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Pinging (?P<target>.+?) with \d+ bytes of data")
            .expect("header pattern is valid")
    })
}

/// Parse the full output of one batch. Fails as a whole if the header, any
/// attempt line or the statistics trailer cannot be parsed.
pub fn parse_session(text: &str) -> Result<Session, ProbeError> {
    let target_identity = text
        .lines()
        .find_map(|line| header_regex().captures(line))
        .map(|caps| caps["target"].to_string())
        .ok_or(ProbeError::MissingTarget)?;

    let mut replies = Vec::new();
    for line in text.lines() {
        if let Some(reply) = classify(line)? {
            replies.push(reply);
        }
    }

    let stats = extract_stats(text)?;

    Ok(Session {
        target_identity,
        replies,
        stats,
    })
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.stats;
        writeln!(f, "Session({})", self.target_identity)?;
        write!(
            f,
            "  Stats({}/{}, {}% lost",
            stats.packets_received, stats.packets_sent, stats.loss_percent
        )?;
        if let Some(rtt) = stats.rtt {
            write!(
                f,
                ", Min = {}ms, Max = {}ms, Avg = {}ms",
                rtt.min, rtt.max, rtt.avg
            )?;
        }
        writeln!(f, ")")?;
        for reply in &self.replies {
            match reply.round_trip_ms() {
                Some(ms) => writeln!(
                    f,
                    "    Reply({}, time={}ms, {})",
                    reply.kind(),
                    ms,
                    reply.raw_line().trim_end()
                )?,
                None => writeln!(
                    f,
                    "    Reply({}, {})",
                    reply.kind(),
                    reply.raw_line().trim_end()
                )?,
            }
        }
        Ok(())
    }
}
