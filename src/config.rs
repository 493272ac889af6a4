//! Configuration module for lping.
//!
//! The target and alert threshold come from the command line; everything
//! else is loaded from environment variables with sensible defaults.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::alert::{default_player, resolve_resource, DEFAULT_ALERT_SOUND};

/// Configuration error types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("usage: lping <target> [alert_threshold]")]
    Usage,
    #[error("invalid alert threshold {0:?}: expected a non-negative integer")]
    InvalidThreshold(String),
}

/// Final report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Host to probe.
    pub target: String,
    /// Consecutive failures before alerts start (default: 2)
    pub alert_threshold: u32,
    /// Pause before each attempt (default: 1s)
    pub interval: Duration,
    /// Echo payload size in bytes (default: 32)
    pub packet_size: u32,
    /// Upper bound on one probe execution (default: 10s)
    pub probe_timeout: Duration,
    /// Program invoked for each probe (default: "ping")
    pub ping_program: String,
    /// Signal handed to the alert dispatcher (default: bundled sound file)
    pub alert_signal: Arc<str>,
    /// Player command line for the sound alert (default: platform player)
    pub sound_player: Vec<String>,
    /// Final report format (default: text)
    pub report_format: ReportFormat,
}

impl MonitorConfig {
    pub const DEFAULT_ALERT_THRESHOLD: u32 = 2;

    /// Configuration for `target` with every other setting at its default.
    pub fn new(target: impl Into<String>) -> Self {
        let sound = resolve_resource(Path::new(DEFAULT_ALERT_SOUND));
        Self {
            target: target.into(),
            alert_threshold: Self::DEFAULT_ALERT_THRESHOLD,
            interval: Duration::from_secs(1),
            packet_size: 32,
            probe_timeout: Duration::from_secs(10),
            ping_program: "ping".to_string(),
            alert_signal: Arc::from(sound.to_string_lossy().as_ref()),
            sound_player: default_player(),
            report_format: ReportFormat::Text,
        }
    }

    /// Build the configuration from command line arguments (without the
    /// program name) and the environment.
    ///
    /// Environment variables:
    /// - `LPING_INTERVAL_MS`: pause between attempts in milliseconds (default: 1000)
    /// - `LPING_PACKET_SIZE`: echo payload size (default: 32)
    /// - `LPING_PROBE_TIMEOUT_MS`: probe execution timeout (default: 10000)
    /// - `LPING_PING_PROGRAM`: probe utility (default: "ping")
    /// - `LPING_ALERT_SOUND`: alert sound file, relative paths resolve next to the executable
    /// - `LPING_SOUND_PLAYER`: whitespace separated player command line
    /// - `LPING_REPORT_FORMAT`: "text" or "json" (default: "text")
    pub fn load<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = Self::from_args(args)?;
        cfg.apply_env(|key| env::var(key).ok());
        Ok(cfg)
    }

    fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let target = args.next().ok_or(ConfigError::Usage)?;
        let mut cfg = Self::new(target);

        if let Some(raw) = args.next() {
            cfg.alert_threshold = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidThreshold(raw))?;
        }

        Ok(cfg)
    }

    fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = var("LPING_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.interval = Duration::from_millis(ms);
        }

        if let Some(size) = var("LPING_PACKET_SIZE").and_then(|v| v.parse().ok()) {
            self.packet_size = size;
        }

        if let Some(ms) = var("LPING_PROBE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.probe_timeout = Duration::from_millis(ms);
        }

        if let Some(program) = var("LPING_PING_PROGRAM").filter(|v| !v.is_empty()) {
            self.ping_program = program;
        }

        if let Some(sound) = var("LPING_ALERT_SOUND").filter(|v| !v.is_empty()) {
            let path = resolve_resource(Path::new(&sound));
            self.alert_signal = Arc::from(path.to_string_lossy().as_ref());
        }

        if let Some(player) = var("LPING_SOUND_PLAYER") {
            let argv: Vec<String> = player.split_whitespace().map(str::to_string).collect();
            if !argv.is_empty() {
                self.sound_player = argv;
            }
        }

        if let Some(format) = var("LPING_REPORT_FORMAT") {
            match format.to_ascii_lowercase().as_str() {
                "json" => self.report_format = ReportFormat::Json,
                "text" => self.report_format = ReportFormat::Text,
                other => tracing::warn!("Ignoring unknown LPING_REPORT_FORMAT {:?}", other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config() {
        let cfg = MonitorConfig::from_args(args(&["8.8.8.8"])).unwrap();
        assert_eq!(cfg.target, "8.8.8.8");
        assert_eq!(cfg.alert_threshold, 2);
        assert_eq!(cfg.interval, Duration::from_secs(1));
        assert_eq!(cfg.packet_size, 32);
        assert_eq!(cfg.ping_program, "ping");
        assert_eq!(cfg.report_format, ReportFormat::Text);
        assert!(cfg.alert_signal.ends_with("punch_kick.wav"));
    }

    #[test]
    fn test_threshold_argument() {
        let cfg = MonitorConfig::from_args(args(&["example.com", "5"])).unwrap();
        assert_eq!(cfg.alert_threshold, 5);
    }

    #[test]
    fn test_missing_target_is_usage() {
        assert_eq!(
            MonitorConfig::from_args(Vec::new()).unwrap_err(),
            ConfigError::Usage
        );
    }

    #[test]
    fn test_invalid_threshold() {
        assert_eq!(
            MonitorConfig::from_args(args(&["8.8.8.8", "two"])).unwrap_err(),
            ConfigError::InvalidThreshold("two".to_string())
        );
        assert!(MonitorConfig::from_args(args(&["8.8.8.8", "-1"])).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LPING_INTERVAL_MS", "250"),
            ("LPING_PACKET_SIZE", "64"),
            ("LPING_PROBE_TIMEOUT_MS", "3000"),
            ("LPING_PING_PROGRAM", "C:\\Windows\\System32\\PING.EXE"),
            ("LPING_SOUND_PLAYER", "paplay --volume 40000"),
            ("LPING_REPORT_FORMAT", "JSON"),
        ]);
        let mut cfg = MonitorConfig::new("8.8.8.8");
        cfg.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.interval, Duration::from_millis(250));
        assert_eq!(cfg.packet_size, 64);
        assert_eq!(cfg.probe_timeout, Duration::from_secs(3));
        assert_eq!(cfg.ping_program, "C:\\Windows\\System32\\PING.EXE");
        assert_eq!(cfg.sound_player, args(&["paplay", "--volume", "40000"]));
        assert_eq!(cfg.report_format, ReportFormat::Json);
    }

    #[test]
    fn test_unparseable_env_keeps_defaults() {
        let mut cfg = MonitorConfig::new("8.8.8.8");
        cfg.apply_env(|key| match key {
            "LPING_INTERVAL_MS" => Some("soon".to_string()),
            "LPING_PACKET_SIZE" => Some("-3".to_string()),
            "LPING_SOUND_PLAYER" => Some("   ".to_string()),
            "LPING_REPORT_FORMAT" => Some("xml".to_string()),
            _ => None,
        });
        assert_eq!(cfg.interval, Duration::from_secs(1));
        assert_eq!(cfg.packet_size, 32);
        assert_eq!(cfg.sound_player, default_player());
        assert_eq!(cfg.report_format, ReportFormat::Text);
    }
}
