use once_cell::sync::OnceCell;
use std::path::PathBuf;

use zc_contracts::{ENV_DIAG_JSON, ENV_FATAL_EXIT_CODE, ENV_MAX_LINE_BYTES, ENV_NULL_DEVICE};

pub const DEFAULT_FATAL_EXIT_CODE: i32 = 1;
pub const DEFAULT_MAX_LINE_BYTES: u32 = 16 * 1024 * 1024;

#[cfg(unix)]
const DEFAULT_NULL_DEVICE: &str = "/dev/null";
#[cfg(not(unix))]
const DEFAULT_NULL_DEVICE: &str = "NUL";

// -------------------------
// Policy env plumbing
// -------------------------

#[derive(Clone, Debug)]
pub struct Policy {
    /// Exit status of every fatal path. Always in `1..=255`.
    pub fatal_exit_code: i32,
    /// Emit a JSON diagnostic line next to the human-readable one.
    pub diag_json: bool,
    pub max_line_bytes: usize,
    /// Discard sink opened by `redirect::suppress`.
    pub null_device: PathBuf,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            fatal_exit_code: DEFAULT_FATAL_EXIT_CODE,
            diag_json: false,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES as usize,
            null_device: PathBuf::from(DEFAULT_NULL_DEVICE),
        }
    }
}

static POLICY: OnceCell<Policy> = OnceCell::new();

fn parse_bool(v: &str) -> Option<bool> {
    match v {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn parse_u32_nonzero(v: &str) -> Option<u32> {
    v.trim().parse::<u32>().ok().filter(|&v| v != 0)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn env_u32_nonzero(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u32_nonzero(&v))
        .unwrap_or(default)
}

fn clamp_exit_code(code: u32) -> i32 {
    if (1..=255).contains(&code) {
        code as i32
    } else {
        DEFAULT_FATAL_EXIT_CODE
    }
}

pub fn load_policy() -> Policy {
    let null_device = std::env::var_os(ENV_NULL_DEVICE)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_NULL_DEVICE));

    Policy {
        fatal_exit_code: clamp_exit_code(env_u32_nonzero(
            ENV_FATAL_EXIT_CODE,
            DEFAULT_FATAL_EXIT_CODE as u32,
        )),
        diag_json: env_bool(ENV_DIAG_JSON, false),
        max_line_bytes: env_u32_nonzero(ENV_MAX_LINE_BYTES, DEFAULT_MAX_LINE_BYTES) as usize,
        null_device,
    }
}

/// Process-wide policy, read from the environment on first use.
pub fn policy() -> &'static Policy {
    POLICY.get_or_init(load_policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("NO"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn zero_and_garbage_fall_back() {
        assert_eq!(parse_u32_nonzero("0"), None);
        assert_eq!(parse_u32_nonzero("-3"), None);
        assert_eq!(parse_u32_nonzero(" 42 "), Some(42));
    }

    #[test]
    fn exit_code_is_never_zero_or_out_of_range() {
        assert_eq!(clamp_exit_code(7), 7);
        assert_eq!(clamp_exit_code(255), 255);
        assert_eq!(clamp_exit_code(256), DEFAULT_FATAL_EXIT_CODE);
        assert_eq!(clamp_exit_code(0), DEFAULT_FATAL_EXIT_CODE);
    }

    #[test]
    fn default_policy() {
        let p = Policy::default();
        assert_eq!(p.fatal_exit_code, 1);
        assert!(!p.diag_json);
        assert_eq!(p.max_line_bytes, 16 * 1024 * 1024);
    }
}
