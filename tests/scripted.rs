#![cfg(target_os = "linux")]

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn run_shell(args: &[&str], script: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_rosh"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn shell");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin.write_all(script.as_bytes()).expect("write");
    }
    let output = child.wait_with_output().expect("wait");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(1);
    (stdout, stderr, code)
}

fn run_script(script: &str) -> (String, String, i32) {
    run_shell(&[], script)
}

#[test]
fn scripted_simple_command() {
    let (out, err, code) = run_script("echo one two\nexit\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert!(out.contains("one two"));
    assert_eq!(code, 0);
}

#[test]
fn scripted_pipeline_byte_count() {
    let (out, err, code) = run_script("echo hello | wc -c\nexit\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert!(out.contains('6'), "stdout: {out}");
    assert_eq!(code, 0);
}

#[test]
fn scripted_three_stage_pipeline() {
    let (out, err, code) = run_script("echo hello | cat | wc -c\nexit\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert!(out.contains('6'), "stdout: {out}");
    assert_eq!(code, 0);
}

#[test]
fn scripted_chain_strategy_pipeline() {
    let script = "echo hello | wc -c\necho hello | cat | wc -c\nexit\n";
    let (out, err, code) = run_shell(&["--pipe-strategy=chain"], script);
    assert!(err.is_empty(), "stderr: {err}");
    assert_eq!(out.matches('6').count(), 2, "stdout: {out}");
    assert_eq!(code, 0);
}

#[test]
fn scripted_invalid_strategy_rejected() {
    let (_, err, code) = run_shell(&["--pipe-strategy=bogus"], "");
    assert!(err.contains("invalid pipe strategy"), "stderr: {err}");
    assert_ne!(code, 0);
}

#[test]
fn scripted_redirect_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("out.txt");
    // Stale content checks that > truncates rather than overwrites in place.
    std::fs::write(&path, "stale stale stale\n").unwrap();
    let script = format!(
        "echo hi > {path}\ncat < {path}\nexit\n",
        path = path.display()
    );
    let (out, err, code) = run_script(&script);
    assert!(err.is_empty(), "stderr: {err}");
    assert!(out.contains("hi"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hi\n");
    assert_eq!(code, 0);
}

#[test]
fn scripted_pipeline_with_rim_redirects() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    std::fs::write(&input, "hello\n").unwrap();
    let script = format!(
        "cat < {input} | wc -c > {output}\nexit\n",
        input = input.display(),
        output = output.display()
    );
    let (_, err, code) = run_script(&script);
    assert!(err.is_empty(), "stderr: {err}");
    assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "6");
    assert_eq!(code, 0);
}

#[test]
fn scripted_replay_with_empty_history() {
    let (out, _, code) = run_script("!!\nexit\n");
    assert!(out.contains("No commands in history."));
    assert_eq!(code, 0);
}

#[test]
fn scripted_replay_repeats_last_command() {
    let (out, err, code) = run_script("echo first\n!!\nexit\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert_eq!(out.matches("first").count(), 2, "stdout: {out}");
    assert_eq!(code, 0);
}

#[test]
fn scripted_replay_skips_rejected_lines() {
    // The replay slot only holds lines that parsed; "echo >" never lands.
    let (out, err, code) = run_script("echo keep\necho >\n!!\nexit\n");
    assert!(err.contains("empty file descriptor"), "stderr: {err}");
    assert_eq!(out.matches("keep").count(), 2, "stdout: {out}");
    assert_eq!(code, 0);
}

#[test]
fn scripted_redirect_ordering_rejected_without_execution() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("never.txt");
    let script = format!(
        "echo hi > {path} | cat\nwc -l | cat < {path}\nexit\n",
        path = path.display()
    );
    let (_, err, code) = run_script(&script);
    assert!(
        err.contains("output redirection must be on the last stage"),
        "stderr: {err}"
    );
    assert!(
        err.contains("input redirection must be on the first stage"),
        "stderr: {err}"
    );
    // Rejected at parse time: no process ran and no file was opened.
    assert!(!path.exists());
    assert_eq!(code, 0);
}

#[test]
fn scripted_open_error_aborts_cycle_only() {
    let script = "cat < /nonexistent-dir-xyzzy/in.txt\necho still-here\nexit\n";
    let (out, _, code) = run_script(script);
    assert!(out.contains("Open Error."));
    assert!(out.contains("still-here"));
    assert_eq!(code, 0);
}

#[test]
fn scripted_unknown_command_diagnostic() {
    let (out, _, code) = run_script("no-such-command-xyzzy\nexit\n");
    assert!(out.contains("No command 'no-such-command-xyzzy' found."));
    assert_eq!(code, 0);
}

#[test]
fn scripted_exit_stops_loop() {
    let (out, err, code) = run_script("exit\necho after\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert!(!out.contains("after"));
    assert_eq!(code, 0);
}

#[test]
fn scripted_background_job_reaped() {
    let (out, err, code) = run_script("sleep 0.2 &\nsleep 0.5\nexit\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert!(out.contains("[1]"), "stdout: {out}");
    assert!(out.contains("Done sleep 0.2"), "stdout: {out}");
    assert_eq!(code, 0);
}

#[test]
fn scripted_background_pipeline() {
    let (out, err, code) = run_script("echo hello | wc -c &\nsleep 0.5\nexit\n");
    assert!(err.is_empty(), "stderr: {err}");
    assert!(out.contains('6'), "stdout: {out}");
    assert!(out.contains("Done"), "stdout: {out}");
    assert_eq!(code, 0);
}
