//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable output of the runtime and its driver.

/// One JSON object per line on stderr, written by the runtime's fatal paths.
pub const ZC_RT_DIAG_SCHEMA_VERSION: &str = "zc-rt.diag@0.1.0";

/// Report printed on stdout by the `zc-rt` driver.
pub const ZC_RT_REPORT_SCHEMA_VERSION: &str = "zc-rt.report@0.1.0";

/// Environment variables read by the runtime policy loader.
pub const ENV_FATAL_EXIT_CODE: &str = "ZC_RT_FATAL_EXIT_CODE";
pub const ENV_DIAG_JSON: &str = "ZC_RT_DIAG_JSON";
pub const ENV_MAX_LINE_BYTES: &str = "ZC_RT_MAX_LINE_BYTES";
pub const ENV_NULL_DEVICE: &str = "ZC_RT_NULL_DEVICE";
