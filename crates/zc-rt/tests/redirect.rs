#![cfg(unix)]

use std::process::{Command, Output};

fn run_redirect(mode: &str) -> Output {
    let exe = env!("CARGO_BIN_EXE_zc-rt");
    Command::new(exe)
        .args(["redirect", "--mode", mode])
        .output()
        .expect("run zc-rt")
}

fn assert_stdout(out: &Output, expected: &str) {
    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&out.stdout), expected);
}

#[test]
fn suppressed_writes_never_reach_the_original_stdout() {
    // Covers buffered prints, raw write(2) on fd 1, and child process output.
    let out = run_redirect("pair");
    assert_stdout(&out, "before\nafter\n");
}

#[test]
fn second_suppress_does_not_stack() {
    // The first restore already brings stdout back.
    let out = run_redirect("nested");
    assert_stdout(&out, "before\nafter\nend\n");
}

#[test]
fn only_the_activating_guard_restores() {
    let out = run_redirect("guard");
    assert_stdout(&out, "before\nafter\n");
}

#[test]
fn restore_without_suppress_is_harmless() {
    let out = run_redirect("restore-only");
    assert_stdout(&out, "before\nafter\n");
}
