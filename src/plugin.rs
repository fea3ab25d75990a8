//! Run a check from command line to exit code
//!
//! `Plugin::run` goes through the same stages for every check:
//!
//! ```plain
//! Init -> ConfigLoaded -> ClientReady -> Queried -> Aggregated
//!      -> Extracted -> ThresholdsEvaluated -> Rendered -> Exited
//! ```
//!
//! Whatever goes wrong along the way ends up as an UNKNOWN line of check
//! output, the process never exits without printing one. The time spent
//! from parsing thresholds to evaluating them is always reported as the
//! `runtime` perfdata, also when a stage fails.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use derive_more::From;
use log::debug;
use structopt::clap::ErrorKind;
use structopt::StructOpt;

use crate::aggregate::aggregate;
use crate::check::{Check, CheckError, Target};
use crate::config::{self, ConfigError, ConnectionConfig};
use crate::perfdata::{PerfData, Unit};
use crate::query;
use crate::store::{InfluxClient, QueryApi, StoreError};
use crate::threshold::{ThresholdError, ThresholdRange};
use crate::Status;

/// Options shared by every check
#[derive(StructOpt, Debug)]
pub struct PluginArgs {
    #[structopt(short = "H", long = "host", help = "The host to check, as tagged by telegraf")]
    pub host: String,
    #[structopt(
        short = "w",
        long = "warning",
        allow_hyphen_values = true,
        help = "Warning threshold, e.g. 80, 10:90, @10:90 or :90"
    )]
    pub warning: String,
    #[structopt(
        short = "c",
        long = "critical",
        allow_hyphen_values = true,
        help = "Critical threshold, same syntax as --warning"
    )]
    pub critical: String,
    #[structopt(short = "v", long = "verbose", help = "Print debug logs to stderr")]
    pub verbose: bool,
    #[structopt(
        long = "config",
        parse(from_os_str),
        help = "INI file with an [influx2] section. Default: config.ini next to the check"
    )]
    pub config: Option<PathBuf>,
}

impl PluginArgs {
    pub fn target<S: Into<String>>(&self, instance: S) -> Target {
        Target {
            host: self.host.clone(),
            instance: instance.into(),
        }
    }
}

/// Everything that stops a check from reaching a real status
#[derive(Debug, From)]
pub enum PluginError {
    Config(ConfigError),
    Threshold(ThresholdError),
    Store(StoreError),
    Check(CheckError),
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PluginError::Config(ref e) => write!(f, "{}", e),
            PluginError::Threshold(ref e) => write!(f, "{}", e),
            PluginError::Store(ref e) => write!(f, "{}", e),
            PluginError::Check(ref e) => write!(f, "{}", e),
        }
    }
}

/// Where a run is
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    ConfigLoaded,
    ClientReady,
    Queried,
    Aggregated,
    Extracted,
    ThresholdsEvaluated,
    Rendered,
    Exited,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Warning and critical ranges, parsed up front
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub warning: ThresholdRange,
    pub critical: ThresholdRange,
}

impl Thresholds {
    pub fn parse(warning: &str, critical: &str) -> Result<Thresholds, ThresholdError> {
        Ok(Thresholds {
            warning: warning.parse()?,
            critical: critical.parse()?,
        })
    }

    /// Critical wins over warning, even when both match
    pub fn status(&self, value: f64) -> Status {
        if self.critical.is_alert(value) {
            Status::Critical
        } else if self.warning.is_alert(value) {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}

/// What gets printed
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub status: Status,
    pub statusline: String,
    pub perfdata: PerfData,
    /// The last stage that completed
    pub stage: Stage,
}

impl Report {
    fn new() -> Report {
        Report {
            status: Status::Unknown,
            statusline: String::new(),
            perfdata: PerfData::new(),
            stage: Stage::Init,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!("{} -> {}", self.stage, next);
        self.stage = next;
    }

    /// `<prog>: <STATUS> <statusline>|<perfdata>`
    pub fn render(&self, prog: &str) -> String {
        format!(
            "{}: {} {}|{}",
            prog, self.status, self.statusline, self.perfdata
        )
    }
}

/// A check, what to point it at, and how to judge it
pub struct Plugin<C> {
    prog: String,
    args: PluginArgs,
    target: Target,
    check: C,
}

impl<C: Check> Plugin<C> {
    pub fn new<S: Into<String>>(
        prog: S,
        args: PluginArgs,
        target: Target,
        check: C,
    ) -> Plugin<C> {
        Plugin {
            prog: prog.into(),
            args,
            target,
            check,
        }
    }

    /// Query InfluxDB, print the result and exit with its status
    pub fn run(self) -> ! {
        let mut report = self.execute(InfluxClient::new, Utc::now());
        println!("{}", report.render(&self.prog));
        report.advance(Stage::Rendered);
        report.advance(Stage::Exited);
        report.status.exit()
    }

    /// Run every stage up to rendering
    ///
    /// `connect` builds the store client from the loaded configuration, `now`
    /// is the instant sample ages are measured against.
    pub fn execute<Q, F>(&self, connect: F, now: DateTime<Utc>) -> Report
    where
        Q: QueryApi,
        F: FnOnce(&ConnectionConfig) -> Result<Q, StoreError>,
    {
        let mut report = Report::new();
        if let Err(e) = self.lifecycle(&mut report, connect, now) {
            debug!("Stopped after {}: {:?}", report.stage, e);
            report.status = Status::Unknown;
            report.statusline = e.to_string();
        }
        report
    }

    fn config_path(&self) -> PathBuf {
        self.args
            .config
            .clone()
            .unwrap_or_else(config::default_path)
    }

    /// Every stage from threshold parsing on, timed as `runtime`
    fn lifecycle<Q, F>(
        &self,
        report: &mut Report,
        connect: F,
        now: DateTime<Utc>,
    ) -> Result<(), PluginError>
    where
        Q: QueryApi,
        F: FnOnce(&ConnectionConfig) -> Result<Q, StoreError>,
    {
        let start = Instant::now();
        let result = self.stages(report, connect, now);
        report.perfdata.insert(
            "runtime",
            start.elapsed().as_secs_f64(),
            Unit::Seconds,
        );
        result
    }

    fn stages<Q, F>(
        &self,
        report: &mut Report,
        connect: F,
        now: DateTime<Utc>,
    ) -> Result<(), PluginError>
    where
        Q: QueryApi,
        F: FnOnce(&ConnectionConfig) -> Result<Q, StoreError>,
    {
        let thresholds = Thresholds::parse(&self.args.warning, &self.args.critical)?;

        let config = ConnectionConfig::load(&self.config_path())?;
        report.advance(Stage::ConfigLoaded);

        let client = connect(&config)?;
        report.advance(Stage::ClientReady);

        debug!("Run {} for {:?}", self.prog, self.target);
        self.measure(report, &client, &config, &thresholds, now)
    }

    /// Query, aggregate, extract and judge
    fn measure<Q: QueryApi>(
        &self,
        report: &mut Report,
        client: &Q,
        config: &ConnectionConfig,
        thresholds: &Thresholds,
        now: DateTime<Utc>,
    ) -> Result<(), PluginError> {
        let flux = query::build(&self.check.filter(&self.target), config);
        let samples = client.query(&flux)?;
        report.advance(Stage::Queried);

        let results = aggregate(samples);
        report.advance(Stage::Aggregated);

        let measured = self.check.extract_latest(&results, &self.target, now)?;
        report.advance(Stage::Extracted);

        report.perfdata.extend(measured.perfdata);
        report.statusline = measured.summary;
        report.status = thresholds.status(measured.value);
        report.advance(Stage::ThresholdsEvaluated);
        Ok(())
    }
}

/// The name a check was invoked as, like `check-telegraf-disk`
pub fn program_name(default: &str) -> String {
    env::args_os()
        .next()
        .as_ref()
        .and_then(|arg0| Path::new(arg0).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| default.to_owned())
}

/// Parse the command line, or exit UNKNOWN with a line of check output
///
/// `--help` and `--version` print as usual and exit 0.
pub fn parse_args<T: StructOpt>(prog: &str) -> T {
    match parse_args_from(prog, env::args_os()) {
        Ok(args) => args,
        Err(line) => {
            println!("{}", line);
            Status::Unknown.exit();
        }
    }
}

fn parse_args_from<T, I>(prog: &str, argv: I) -> Result<T, String>
where
    T: StructOpt,
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    match T::from_iter_safe(argv) {
        Ok(args) => Ok(args),
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
            _ => {
                eprintln!("{}", e.message);
                let summary = e
                    .message
                    .lines()
                    .next()
                    .unwrap_or("invalid arguments")
                    .trim_start_matches("error: ")
                    .to_owned();
                Err(format!("{}: {} {}|", prog, Status::Unknown, summary))
            }
        },
    }
}
