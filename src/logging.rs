//! Process-wide logging setup
//!
//! Log lines go to stderr, stdout is reserved for the single line of check
//! output.

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Set up logging once, before a check starts
///
/// Warnings are always shown, `verbose` turns on debug output. `RUST_LOG`
/// still overrides both. Calling this again is a no-op.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .target(Target::Stderr)
        .format_timestamp(None)
        .try_init();
}
