//! Probe module for reachability monitoring.
//!
//! Turns the text output of the echo utility into typed replies, batch
//! statistics and sessions, and defines the executor seam the monitor
//! drives.

mod ping;
mod reply;
mod session;
mod stats;

pub use ping::*;
pub use reply::*;
pub use session::*;
pub use stats::*;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Probe error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("malformed reply line: {0:?}")]
    MalformedReply(String),
    #[error("malformed statistics: {0}")]
    MalformedStats(String),
    #[error("no packet statistics found in probe output")]
    MissingStats,
    #[error("no target header found in probe output")]
    MissingTarget,
    #[error("expected exactly one reply in a single-attempt batch, found {0}")]
    ProtocolViolation(usize),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("command failed: {0}")]
    Command(String),
}

/// Something that can run one batch of echo attempts against a target and
/// hand back the utility's verbatim output.
pub trait ProbeExecutor {
    fn run_probe(
        &self,
        target: &str,
        attempts: u32,
        packet_size: u32,
    ) -> impl Future<Output = Result<String, ProbeError>> + Send;
}
