//! What a single check has to provide
//!
//! A check knows how to find its data (a Flux filter) and how to turn the
//! newest record into one number to compare against thresholds. Everything
//! else is handled by `plugin::Plugin`.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::aggregate::{Aggregated, CompositeRecord, FieldValue};
use crate::perfdata::{PerfData, Unit};

/// The host and resource a check was asked about
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub host: String,
    pub instance: String,
}

/// The result of looking at the newest record
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    /// The value compared against `--warning` and `--critical`
    pub value: f64,
    pub perfdata: PerfData,
    pub summary: String,
}

/// Reasons a check can't produce a measurement
///
/// All of these are reported as UNKNOWN.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckError {
    NoData {
        host: String,
    },
    MissingField {
        host: String,
        field: String,
    },
    InvalidField {
        field: String,
        value: FieldValue,
    },
    /// A derived value would need a division by zero
    DivisionByZero {
        host: String,
        field: &'static str,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::CheckError::*;
        match *self {
            NoData { ref host } => write!(f, "No data for {}", host),
            MissingField {
                ref host,
                ref field,
            } => write!(f, "No data for {}: the latest sample has no '{}'", host, field),
            InvalidField {
                ref field,
                ref value,
            } => write!(f, "'{}' is not a number: {}", field, value),
            DivisionByZero { ref host, field } => write!(
                f,
                "No data for {}: '{}' is 0, can't derive usage",
                host, field
            ),
        }
    }
}

pub trait Check {
    /// Flux pipeline stages (`|> filter(...)`) that select the target's data
    fn filter(&self, target: &Target) -> String;

    /// Compute the measurement from the newest record
    fn extract(
        &self,
        latest: &CompositeRecord,
        target: &Target,
        now: DateTime<Utc>,
    ) -> Result<Measurement, CheckError>;

    /// `extract` the newest record, or fail with `NoData`
    fn extract_latest(
        &self,
        results: &Aggregated,
        target: &Target,
        now: DateTime<Utc>,
    ) -> Result<Measurement, CheckError> {
        match results.latest() {
            Some(latest) => self.extract(latest, target, now),
            None => Err(CheckError::NoData {
                host: target.host.clone(),
            }),
        }
    }
}

/// Read `field` as a finite number
///
/// NaN and infinities never compare as alerting, so they are rejected here.
pub fn number(record: &CompositeRecord, field: &str, target: &Target) -> Result<f64, CheckError> {
    let value = record.get(field).ok_or_else(|| CheckError::MissingField {
        host: target.host.clone(),
        field: field.to_owned(),
    })?;
    match value.as_f64() {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(CheckError::InvalidField {
            field: field.to_owned(),
            value: value.clone(),
        }),
    }
}

/// Seconds between the record and `now`, recording the sample's unix time
/// as `timestamp` perfdata
pub fn sample_age(record: &CompositeRecord, now: DateTime<Utc>, perfdata: &mut PerfData) -> f64 {
    perfdata.insert("timestamp", record.time.timestamp(), Unit::None);
    (now - record.time).num_milliseconds() as f64 / 1000.0
}
