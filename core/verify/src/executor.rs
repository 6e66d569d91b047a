//! Shared command-phase executor (spec.md §4.13 "Shared command phase").
//!
//! Re-grounded locally on `tokio::process::Command` + `tokio::time::timeout`
//! rather than depending on the teacher's whole sandboxing-aware `exec/shell`
//! crate, which carries shell-snapshot and background-task concerns out of
//! scope here (SPEC_FULL §2, §6).

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use corestack_config::VerifyPolicyConfig;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::trace;
use tracing::warn;

use crate::types::CommandOutcome;
use crate::types::DiscoveredCommand;

/// Read `reader` to EOF, capping retained bytes at `cap` (excess is
/// truncated with an elision marker) and emitting a throttled trace event
/// at most once per `throttle` (spec.md §4.13, §5 "Backpressure").
async fn drain_stream(mut reader: impl AsyncRead + Unpin + Send + 'static, cap: usize, throttle: Duration, command: String, stream: &'static str) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 4096];
    let mut last_emit = Instant::now();
    let mut first_chunk = true;
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(error) => {
                warn!(command = %command, stream, %error, "failed reading verify command output");
                break;
            }
        };
        if buf.len() < cap {
            let remaining = cap - buf.len();
            let take = remaining.min(n);
            buf.extend_from_slice(&chunk[..take]);
            if take < n {
                truncated = true;
            }
        } else {
            truncated = true;
        }
        if first_chunk || last_emit.elapsed() >= throttle {
            trace!(command = %command, stream, bytes = n, "verify command output chunk");
            last_emit = Instant::now();
            first_chunk = false;
        }
    }
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        text.push_str("\n... [output truncated]");
    }
    text
}

/// Spawn one command with a wall-clock timeout, capturing and capping
/// stdout/stderr (spec.md §4.13).
pub async fn run_command(command: &DiscoveredCommand, workspace_root: &Path, policy: &VerifyPolicyConfig) -> CommandOutcome {
    let start = Instant::now();
    let spawned = Command::new("sh")
        .arg("-c")
        .arg(&command.command)
        .current_dir(workspace_root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(error) => {
            return CommandOutcome {
                name: command.name.clone(),
                command: command.command.clone(),
                exit_code: None,
                stdout: String::new(),
                stderr: format!("failed to spawn command: {error}"),
                duration_ms: start.elapsed().as_millis() as u64,
                timed_out: false,
            };
        }
    };

    let Some(stdout) = child.stdout.take() else {
        return CommandOutcome {
            name: command.name.clone(),
            command: command.command.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: "command spawned without a captured stdout pipe".to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            timed_out: false,
        };
    };
    let Some(stderr) = child.stderr.take() else {
        return CommandOutcome {
            name: command.name.clone(),
            command: command.command.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: "command spawned without a captured stderr pipe".to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            timed_out: false,
        };
    };

    let throttle = Duration::from_millis(policy.chunk_throttle_ms.max(1));
    let cap = policy.max_output_bytes;
    let stdout_task = tokio::spawn(drain_stream(stdout, cap, throttle, command.name.clone(), "stdout"));
    let stderr_task = tokio::spawn(drain_stream(stderr, cap, throttle, command.name.clone(), "stderr"));

    let timeout_secs = policy.timeout_secs.max(1);
    let wait_result = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await;

    match wait_result {
        Ok(status) => {
            let exit_code = status.ok().and_then(|status| status.code());
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            CommandOutcome {
                name: command.name.clone(),
                command: command.command.clone(),
                exit_code,
                stdout,
                stderr,
                duration_ms: start.elapsed().as_millis() as u64,
                timed_out: false,
            }
        }
        Err(_) => {
            let _ = child.start_kill();
            stdout_task.abort();
            stderr_task.abort();
            CommandOutcome {
                name: command.name.clone(),
                command: command.command.clone(),
                exit_code: None,
                stdout: String::new(),
                stderr: format!("command timed out after {timeout_secs}s"),
                duration_ms: start.elapsed().as_millis() as u64,
                timed_out: true,
            }
        }
    }
}

/// Run `commands` in order, stopping at the first non-zero exit (spec.md
/// §4.13: "stop on first non-zero exit, reporting that command as the
/// failed one").
pub async fn run_command_phase(commands: &[DiscoveredCommand], workspace_root: &Path, policy: &VerifyPolicyConfig) -> Vec<CommandOutcome> {
    let mut outcomes = Vec::with_capacity(commands.len());
    for command in commands {
        let outcome = run_command(command, workspace_root, policy).await;
        let failed = outcome.timed_out || outcome.exit_code != Some(0);
        outcomes.push(outcome);
        if failed {
            break;
        }
    }
    outcomes
}

#[cfg(test)]
#[path = "executor.test.rs"]
mod tests;
