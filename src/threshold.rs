//! Nagios-style threshold ranges
//!
//! A range describes the values that should *alert*:
//!
//! | spec      | alerts when              |
//! |-----------|--------------------------|
//! | `10`      | `v < 0` or `v > 10`      |
//! | `10:`     | `v < 10`                 |
//! | `:10`     | `v > 10`                 |
//! | `10:20`   | `v < 10` or `v > 20`     |
//! | `@10:20`  | `10 <= v <= 20`          |
//!
//! Both ends are inclusive. A leading `~` is accepted and ignored, an empty
//! lower bound already means negative infinity.

use std::f64;
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

#[derive(Debug, PartialEq, Clone)]
pub enum ThresholdError {
    /// Nothing to parse
    Empty,
    /// More than one `:` in the spec
    Shape(String),
    /// One of the bounds isn't a number
    InvalidBound { spec: String, bound: String },
    /// `lower` is greater than `upper`
    Inverted { spec: String, lower: f64, upper: f64 },
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ThresholdError::*;
        match *self {
            Empty => write!(f, "error parsing thresholds: empty threshold"),
            Shape(ref spec) => write!(
                f,
                "error parsing thresholds: '{}' should look like N, A:B or @A:B",
                spec
            ),
            InvalidBound {
                ref spec,
                ref bound,
            } => write!(
                f,
                "error parsing thresholds: '{}' in '{}' is not a number",
                bound, spec
            ),
            Inverted {
                ref spec,
                lower,
                upper,
            } => write!(
                f,
                "error parsing thresholds: start of '{}' ({}) is greater than its end ({})",
                spec, lower, upper
            ),
        }
    }
}

/// The parsed form of a threshold spec
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ThresholdRange {
    pub lower: f64,
    pub upper: f64,
    /// Alert when the value is *inside* `[lower, upper]`
    pub invert: bool,
}

impl ThresholdRange {
    /// Does `value` fall in the alerting region?
    pub fn is_alert(&self, value: f64) -> bool {
        let inside = self.lower <= value && value <= self.upper;
        if self.invert {
            inside
        } else {
            value < self.lower || value > self.upper
        }
    }
}

impl FromStr for ThresholdRange {
    type Err = ThresholdError;

    fn from_str(spec: &str) -> Result<ThresholdRange, ThresholdError> {
        let raw = spec.trim();
        if raw.is_empty() {
            return Err(ThresholdError::Empty);
        }
        let (invert, rest) = if let Some(rest) = raw.strip_prefix('@') {
            (true, rest)
        } else if let Some(rest) = raw.strip_prefix('~') {
            (false, rest)
        } else {
            (false, raw)
        };

        let bound = |part: &str, open: f64| -> Result<f64, ThresholdError> {
            if part.is_empty() {
                Ok(open)
            } else {
                part.parse()
                    .map_err(|_: ParseFloatError| ThresholdError::InvalidBound {
                        spec: spec.to_owned(),
                        bound: part.to_owned(),
                    })
            }
        };

        let parts = rest.split(':').collect::<Vec<_>>();
        let (lower, upper) = match parts.as_slice() {
            [upper] => {
                if upper.is_empty() {
                    return Err(ThresholdError::Empty);
                }
                (0.0, bound(*upper, f64::INFINITY)?)
            }
            [lower, upper] => (
                bound(*lower, f64::NEG_INFINITY)?,
                bound(*upper, f64::INFINITY)?,
            ),
            _ => return Err(ThresholdError::Shape(spec.to_owned())),
        };

        if lower > upper {
            return Err(ThresholdError::Inverted {
                spec: spec.to_owned(),
                lower,
                upper,
            });
        }

        Ok(ThresholdRange {
            lower,
            upper,
            invert,
        })
    }
}

impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.invert {
            write!(f, "@")?;
        }
        if self.lower.is_finite() {
            write!(f, "{}", self.lower)?;
        }
        write!(f, ":")?;
        if self.upper.is_finite() {
            write!(f, "{}", self.upper)?;
        }
        Ok(())
    }
}

/// Parse `spec` and check `value` against it in one go
pub fn evaluate(value: f64, spec: &str) -> Result<bool, ThresholdError> {
    Ok(spec.parse::<ThresholdRange>()?.is_alert(value))
}
