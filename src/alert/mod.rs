//! Alert dispatch for failure streaks.
//!
//! Dispatching never blocks the caller: each alert runs on its own task and
//! is never joined.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

/// Relative location of the bundled alert sound.
pub const DEFAULT_ALERT_SOUND: &str = "wav/punch_kick.wav";

/// Receiver of alert signals. Implementations must return immediately and
/// keep their own failures to themselves.
pub trait AlertDispatcher {
    fn raise_alert(&self, signal_id: &str);
}

/// Plays a sound file by spawning an external player.
#[derive(Debug, Clone)]
pub struct SoundAlert {
    player: Arc<[String]>,
}

impl SoundAlert {
    /// `player` is the program followed by any leading arguments; the signal
    /// id is appended as the final argument.
    pub fn new(player: Vec<String>) -> Self {
        Self {
            player: player.into(),
        }
    }
}

impl Default for SoundAlert {
    fn default() -> Self {
        Self::new(default_player())
    }
}

impl AlertDispatcher for SoundAlert {
    fn raise_alert(&self, signal_id: &str) {
        let player = self.player.clone();
        let signal_id = signal_id.to_string();

        tokio::spawn(async move {
            let Some((program, args)) = player.split_first() else {
                tracing::warn!("Alert player is not configured, dropping alert {}", signal_id);
                return;
            };

            let status = Command::new(program)
                .args(args)
                .arg(&signal_id)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;

            match status {
                Ok(s) if s.success() => {}
                Ok(s) => tracing::warn!("Alert player {} exited with {}", program, s),
                Err(e) => tracing::warn!("Failed to run alert player {}: {}", program, e),
            }
        });
    }
}

/// Platform player that blocks until the file has been played.
pub fn default_player() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "windows") {
        &[
            "powershell",
            "-NoProfile",
            "-Command",
            "& { param($p) (New-Object Media.SoundPlayer $p).PlaySync() }",
        ]
    } else if cfg!(target_os = "macos") {
        &["afplay"]
    } else {
        &["aplay", "-q"]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

/// Resolve a resource path against the directory holding the executable.
/// Absolute paths are returned unchanged.
pub fn resolve_resource(relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join(relative))
        .unwrap_or_else(|| relative.to_path_buf())
}
