use corestack_config::VerifyPolicyConfig;

use super::*;
use crate::types::CommandSource;

fn policy() -> VerifyPolicyConfig {
    VerifyPolicyConfig {
        timeout_secs: 5,
        chunk_throttle_ms: 10,
        max_output_bytes: 1024,
        ..Default::default()
    }
}

fn command(name: &str, command: &str) -> DiscoveredCommand {
    DiscoveredCommand {
        name: name.to_string(),
        command: command.to_string(),
        source: CommandSource::ConfiguredFallback,
    }
}

#[tokio::test]
async fn captures_stdout_on_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = run_command(&command("echo", "echo hello"), dir.path(), &policy()).await;
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.stdout.contains("hello"));
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn reports_non_zero_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = run_command(&command("fail", "exit 3"), dir.path(), &policy()).await;
    assert_eq!(outcome.exit_code, Some(3));
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn times_out_long_running_command() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut slow_policy = policy();
    slow_policy.timeout_secs = 1;
    let outcome = run_command(&command("sleep", "sleep 10"), dir.path(), &slow_policy).await;
    assert!(outcome.timed_out);
    assert_eq!(outcome.exit_code, None);
}

#[tokio::test]
async fn truncates_output_past_cap() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut tight_policy = policy();
    tight_policy.max_output_bytes = 8;
    let outcome = run_command(&command("big", "yes x | head -c 4096"), dir.path(), &tight_policy).await;
    assert!(outcome.stdout.contains("truncated"));
}

#[tokio::test]
async fn command_phase_stops_on_first_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let commands = vec![command("first", "exit 1"), command("second", "echo should-not-run")];
    let outcomes = run_command_phase(&commands, dir.path(), &policy()).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].name, "first");
}

#[tokio::test]
async fn command_phase_runs_all_on_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let commands = vec![command("first", "echo one"), command("second", "echo two")];
    let outcomes = run_command_phase(&commands, dir.path(), &policy()).await;
    assert_eq!(outcomes.len(), 2);
}
