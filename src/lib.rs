//! Influx Plugins: Nagios-style checks for Telegraf data in InfluxDB 2
//!
//! Each check binary queries an InfluxDB 2 bucket, takes the most recent
//! sample for a single resource (a disk, a mail queue), compares one value
//! against Nagios range thresholds, and prints exactly one line of check
//! output with performance data:
//!
//! ```plain
//! check-telegraf-disk: WARNING <strong>/</strong> 85.00% used (8.5 GB of 10 GB) (12 seconds ago)|'free'=1500000000b ...
//! ```
//!
//! The pieces:
//!
//! * [`threshold`] parses `-w`/`-c` ranges like `80`, `10:90` or `@10:90`
//! * [`aggregate`] folds per-field samples into one record per timestamp
//! * [`query`] writes the Flux query
//! * [`store`] talks to InfluxDB
//! * [`check`] is the trait each check implements, see [`checks`]
//! * [`plugin`] runs the whole thing and turns every failure into check output
//!
//! See the [`scripts`] module for the help text of every check.

use std::fmt;
use std::process;

pub mod aggregate;
pub mod check;
pub mod checks;
pub mod config;
pub mod human;
pub mod logging;
pub mod perfdata;
pub mod plugin;
pub mod query;
pub mod scripts;
pub mod store;
pub mod threshold;

pub use crate::logging::init_logging;

/// All possible exit statuses for a check
///
/// Ordered by severity, so `max` of two statuses is the worse one.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Exit with a return code that indicates the state of the system
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    /// The process exit code Nagios expects for this status
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}
