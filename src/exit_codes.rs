//! Exit code policy for pgreconcile.
//!
//! ## Findings (0-2)
//!
//! Comparison commands return exit codes based on what they found:
//! - `0` = Remote and local agree (nothing to reconcile)
//! - `1` = Differences found (a report or migration was written)
//! - `2` = Usage error (bad flags, reported by clap)
//!
//! ## Operational Failures (10+)
//!
//! Operational failures (unreadable dumps, connection issues, invalid config,
//! failing child processes) use codes >= 10 to distinguish them from findings:
//! - `10` = General operational failure
//! - `11` = Connection failure
//! - `12` = Configuration error
//!
//! This separation allows scripts to distinguish between:
//! - "The databases differ" (findings, 1)
//! - "We couldn't compare them" (operational failure, 10+)

/// Exit code: nothing to reconcile
pub const NO_DIFFERENCES: i32 = 0;

/// Exit code: differences found
pub const DIFFERENCES_FOUND: i32 = 1;

/// Exit code: invalid command line
pub const USAGE_ERROR: i32 = 2;

/// Exit code: general operational failure
pub const OPERATIONAL_FAILURE: i32 = 10;

/// Exit code: connection failure
pub const CONNECTION_FAILURE: i32 = 11;

/// Exit code: configuration error
pub const CONFIG_ERROR: i32 = 12;

/// Exit code: interrupted by Ctrl+C (SIGINT)
pub const INTERRUPTED: i32 = 130;
