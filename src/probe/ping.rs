//! Probe executor that shells out to the system echo utility.
//!
//! The parsers understand the Windows `ping` output format, so the command is
//! invoked with that utility's `-n <count> -l <size>` flags.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{ProbeError, ProbeExecutor};

/// Runs the configured ping program and returns its captured stdout.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command(&self, target: &str, attempts: u32, packet_size: u32) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(ping_args(target, attempts, packet_size))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        detach_from_console(&mut cmd);
        cmd
    }
}

/// Keep console Ctrl-C away from the child so a stop request never cuts an
/// in-flight batch short.
#[cfg(unix)]
fn detach_from_console(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach_from_console(cmd: &mut Command) {
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_console(_cmd: &mut Command) {}

fn ping_args(target: &str, attempts: u32, packet_size: u32) -> Vec<String> {
    vec![
        "-n".to_string(),
        attempts.to_string(),
        "-l".to_string(),
        packet_size.to_string(),
        target.to_string(),
    ]
}

impl ProbeExecutor for CommandProbe {
    async fn run_probe(
        &self,
        target: &str,
        attempts: u32,
        packet_size: u32,
    ) -> Result<String, ProbeError> {
        let output = tokio::time::timeout(
            self.timeout,
            self.command(target, attempts, packet_size).output(),
        )
        .await
        .map_err(|_| ProbeError::Timeout(self.timeout))?
        .map_err(|e| ProbeError::Command(format!("failed to execute {}: {}", self.program, e)))?;

        // Exit status is not inspected; failed attempts still print a batch.
        if !output.stderr.is_empty() {
            tracing::debug!(
                "{} stderr: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_args() {
        assert_eq!(
            ping_args("8.8.8.8", 1, 32),
            vec!["-n", "1", "-l", "32", "8.8.8.8"]
        );
    }

    /// Process group id from `/proc/<pid>/stat`, skipping the parenthesised name.
    #[cfg(target_os = "linux")]
    fn process_group_of(stat: &str) -> Option<String> {
        let after_name = &stat[stat.rfind(')')? + 1..];
        after_name.split_whitespace().nth(2).map(str::to_string)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_child_runs_in_own_process_group() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("stat.sh");
        std::fs::write(&script, "#!/bin/sh\ncat /proc/$$/stat\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let probe = CommandProbe::new(script.to_string_lossy(), Duration::from_secs(5));
        let output = probe.run_probe("127.0.0.1", 1, 32).await;

        let child_group = process_group_of(&output.unwrap()).unwrap();
        let own_stat = std::fs::read_to_string("/proc/self/stat").unwrap();
        let own_group = process_group_of(&own_stat).unwrap();
        assert_ne!(child_group, own_group);
    }

    #[tokio::test]
    async fn test_missing_program_is_command_error() {
        let probe = CommandProbe::new("lping-test-no-such-program", Duration::from_secs(5));
        let result = probe.run_probe("127.0.0.1", 1, 32).await;
        assert!(matches!(result, Err(ProbeError::Command(_))));
    }
}
