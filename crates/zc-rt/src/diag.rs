//! Fatal-path reporting.
//!
//! Every unrecoverable failure in the runtime ends up in [`die`]: buffered output
//! is flushed, a human-readable line goes to stderr (plus an optional JSON line),
//! and the process exits with the policy's fatal status.

use std::io::Write as _;

use serde::Serialize;
use zc_contracts::ZC_RT_DIAG_SCHEMA_VERSION;

use crate::config::policy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalKind {
    Panic,
    Assert,
    Bounds,
}

#[derive(Debug, Serialize)]
struct DiagLine<'a> {
    schema_version: &'static str,
    kind: FatalKind,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<i128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i128>,
    exit_code: i32,
}

/// Flushes Rust's stdout buffer and every C stdio stream.
pub(crate) fn flush_all_stdout() {
    let _ = std::io::stdout().flush();
    unsafe {
        libc::fflush(std::ptr::null_mut());
    }
}

fn human_line(kind: FatalKind, message: &str) -> String {
    match kind {
        FatalKind::Panic => format!("Panic: {message}"),
        FatalKind::Assert => format!("Assertion failed: {message}"),
        FatalKind::Bounds => message.to_string(),
    }
}

fn write_report(kind: FatalKind, message: &str, bounds: Option<(i128, i128)>, exit_code: i32) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", human_line(kind, message));
    if policy().diag_json {
        let line = DiagLine {
            schema_version: ZC_RT_DIAG_SCHEMA_VERSION,
            kind,
            message,
            index: bounds.map(|(i, _)| i),
            limit: bounds.map(|(_, l)| l),
            exit_code,
        };
        if let Ok(s) = serde_json::to_string(&line) {
            let _ = writeln!(stderr, "{s}");
        }
    }
    let _ = stderr.flush();
}

/// Must not return.
pub fn die(kind: FatalKind, message: &str, bounds: Option<(i128, i128)>) -> ! {
    flush_all_stdout();
    let exit_code = policy().fatal_exit_code;
    write_report(kind, message, bounds, exit_code);
    std::process::exit(exit_code)
}
