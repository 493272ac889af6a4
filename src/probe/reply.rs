//! Classification of single echo-attempt lines.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::ProbeError;

/// The outcome category of one echo attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    Success,
    RequestTimedOut,
    DestinationHostUnreachable,
    DestinationNetUnreachable,
    GeneralFailure,
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyKind::Success => "Success",
            ReplyKind::RequestTimedOut => "RequestTimedOut",
            ReplyKind::DestinationHostUnreachable => "DestinationHostUnreachable",
            ReplyKind::DestinationNetUnreachable => "DestinationNetUnreachable",
            ReplyKind::GeneralFailure => "GeneralFailure",
        };
        f.write_str(name)
    }
}

/// One classified echo attempt. Each variant keeps the verbatim source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Success {
        line: String,
        source_address: String,
        byte_count: u32,
        round_trip_ms: u32,
        ttl: u32,
    },
    RequestTimedOut {
        line: String,
    },
    DestinationHostUnreachable {
        line: String,
        source_address: String,
    },
    DestinationNetUnreachable {
        line: String,
    },
    GeneralFailure {
        line: String,
    },
}

impl Reply {
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Success { .. } => ReplyKind::Success,
            Reply::RequestTimedOut { .. } => ReplyKind::RequestTimedOut,
            Reply::DestinationHostUnreachable { .. } => ReplyKind::DestinationHostUnreachable,
            Reply::DestinationNetUnreachable { .. } => ReplyKind::DestinationNetUnreachable,
            Reply::GeneralFailure { .. } => ReplyKind::GeneralFailure,
        }
    }

    /// The line this reply was parsed from, untouched.
    pub fn raw_line(&self) -> &str {
        match self {
            Reply::Success { line, .. }
            | Reply::RequestTimedOut { line }
            | Reply::DestinationHostUnreachable { line, .. }
            | Reply::DestinationNetUnreachable { line }
            | Reply::GeneralFailure { line } => line,
        }
    }

    pub fn source_address(&self) -> Option<&str> {
        match self {
            Reply::Success { source_address, .. }
            | Reply::DestinationHostUnreachable { source_address, .. } => Some(source_address),
            _ => None,
        }
    }

    pub fn round_trip_ms(&self) -> Option<u32> {
        match self {
            Reply::Success { round_trip_ms, .. } => Some(*round_trip_ms),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }
}

fn success_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^Reply from (?P<addr>.+?): bytes=(?P<bytes>\d+) time[=<](?P<time>\d+)ms TTL=(?P<ttl>\d+)",
        )
        .expect("success pattern is valid")
    })
}

fn host_unreachable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Reply from (?P<addr>.+?): Destination host unreachable\.")
            .expect("unreachable pattern is valid")
    })
}

/// Classify one line of probe output.
///
/// Returns `Ok(None)` for lines that are not echo attempts (banner, blank,
/// statistics trailer). A line that looks like an attempt but lacks its
/// required fields is a `MalformedReply`.
pub fn classify(line: &str) -> Result<Option<Reply>, ProbeError> {
    let trimmed = line.trim_end();

    if trimmed.ends_with("Destination host unreachable.") {
        let caps = host_unreachable_regex()
            .captures(trimmed)
            .ok_or_else(|| ProbeError::MalformedReply(line.to_string()))?;
        return Ok(Some(Reply::DestinationHostUnreachable {
            line: line.to_string(),
            source_address: caps["addr"].to_string(),
        }));
    }

    if trimmed.ends_with("Destination net unreachable.") {
        return Ok(Some(Reply::DestinationNetUnreachable {
            line: line.to_string(),
        }));
    }

    if trimmed.starts_with("Request timed out.") {
        return Ok(Some(Reply::RequestTimedOut {
            line: line.to_string(),
        }));
    }

    if trimmed.starts_with("General failure.") {
        return Ok(Some(Reply::GeneralFailure {
            line: line.to_string(),
        }));
    }

    if trimmed.starts_with("Reply from") {
        let malformed = || ProbeError::MalformedReply(line.to_string());
        let caps = success_regex().captures(trimmed).ok_or_else(malformed)?;
        let number = |name: &str| caps[name].parse::<u32>().map_err(|_| malformed());
        return Ok(Some(Reply::Success {
            line: line.to_string(),
            source_address: caps["addr"].to_string(),
            byte_count: number("bytes")?,
            round_trip_ms: number("time")?,
            ttl: number("ttl")?,
        }));
    }

    Ok(None)
}
