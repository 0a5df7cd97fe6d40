use std::process::{Command, Output};

use serde_json::Value;
use zc_contracts::{ZC_RT_DIAG_SCHEMA_VERSION, ZC_RT_REPORT_SCHEMA_VERSION};

fn run_zc_rt(args: &[&str], env: &[(&str, &str)]) -> Output {
    let exe = env!("CARGO_BIN_EXE_zc-rt");
    let mut cmd = Command::new(exe);
    cmd.args(args);
    for (k, v) in env {
        cmd.env(k, v);
    }
    cmd.output().expect("run zc-rt")
}

fn stderr_text(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn in_range_index_passes_through() {
    for (index, limit) in [("0", "3"), ("2", "3"), ("0", "1")] {
        let out = run_zc_rt(&["bounds", "--index", index, "--limit", limit], &[]);
        assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr_text(&out));
        let v: Value = serde_json::from_slice(&out.stdout).expect("parse stdout JSON");
        assert_eq!(v["schema_version"], ZC_RT_REPORT_SCHEMA_VERSION);
        assert_eq!(v["index"].to_string(), index);
    }
}

#[test]
fn index_equal_to_limit_is_fatal() {
    let out = run_zc_rt(&["bounds", "--index", "3", "--limit", "3"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let err = stderr_text(&out);
    assert!(err.contains("Index out of bounds: 3 (limit 3)"), "stderr={err}");
}

#[test]
fn negative_index_is_fatal() {
    let out = run_zc_rt(&["bounds", "--index", "-1", "--limit", "10"], &[]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr_text(&out);
    assert!(err.contains("-1"), "stderr={err}");
    assert!(err.contains("limit 10"), "stderr={err}");
}

#[test]
fn vec_at_past_the_end_is_fatal() {
    let out = run_zc_rt(&["vec", "--count", "10", "--at", "10"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let err = stderr_text(&out);
    assert!(err.contains("Index out of bounds: 10 (limit 10)"), "stderr={err}");

    let out = run_zc_rt(&["vec", "--count", "4", "--at", "-2"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_text(&out).contains("Index out of bounds: -2 (limit 4)"));
}

#[test]
fn panic_reports_message_and_exits_nonzero() {
    let out = run_zc_rt(&["panic", "--message", "out of widgets"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr_text(&out), "Panic: out of widgets\n");
}

#[test]
fn failed_assert_is_fatal_and_passing_assert_is_not() {
    let out = run_zc_rt(&["assert", "--message", "x must be positive"], &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr_text(&out).contains("Assertion failed: x must be positive"));

    let out = run_zc_rt(&["assert", "--holds", "--message", "unused"], &[]);
    assert_eq!(out.status.code(), Some(0), "stderr:\n{}", stderr_text(&out));
    let v: Value = serde_json::from_slice(&out.stdout).expect("parse stdout JSON");
    assert_eq!(v["holds"], true);
}

#[test]
fn fatal_exit_code_comes_from_policy() {
    let out = run_zc_rt(
        &["panic", "--message", "boom"],
        &[("ZC_RT_FATAL_EXIT_CODE", "7")],
    );
    assert_eq!(out.status.code(), Some(7));

    // Zero would read as success; it falls back to the default.
    let out = run_zc_rt(
        &["panic", "--message", "boom"],
        &[("ZC_RT_FATAL_EXIT_CODE", "0")],
    );
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn diag_json_line_follows_human_line() {
    let out = run_zc_rt(
        &["bounds", "--index", "5", "--limit", "2"],
        &[("ZC_RT_DIAG_JSON", "1")],
    );
    assert_eq!(out.status.code(), Some(1));
    let err = stderr_text(&out);
    let mut lines = err.lines();
    assert_eq!(lines.next(), Some("Index out of bounds: 5 (limit 2)"));
    let v: Value = serde_json::from_str(lines.next().expect("json line")).expect("parse diag");
    assert_eq!(v["schema_version"], ZC_RT_DIAG_SCHEMA_VERSION);
    assert_eq!(v["kind"], "bounds");
    assert_eq!(v["index"], 5);
    assert_eq!(v["limit"], 2);
    assert_eq!(v["exit_code"], 1);
}
