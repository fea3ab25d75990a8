//! Human friendly sizes and durations for status lines

use itertools::Itertools;

const SIZE_UNITS: [&str; 8] = ["KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

const TIME_UNITS: [(f64, &str); 6] = [
    (31_449_600.0, "year"),
    (604_800.0, "week"),
    (86_400.0, "day"),
    (3_600.0, "hour"),
    (60.0, "minute"),
    (1.0, "second"),
];

/// The number of units that will be shown by `format_timespan`
const MAX_TIME_UNITS: usize = 3;

/// Format with at most two decimals, dropping trailing zeros
fn round_number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_owned()
    } else {
        formatted
    }
}

fn pluralize(count: &str, singular: &str) -> String {
    if count == "1" {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

/// Bytes in decimal units: `999 bytes`, `1.5 KB`, `900 MB`, `1 GB`
pub fn format_size(bytes: f64) -> String {
    let mut value = bytes;
    let mut reductions = 0;
    while reductions < SIZE_UNITS.len() && value.abs() >= 1000.0 {
        value /= 1000.0;
        reductions += 1;
    }
    if reductions == 0 {
        pluralize(&round_number(value), "byte")
    } else {
        format!("{} {}", round_number(value), SIZE_UNITS[reductions - 1])
    }
}

/// Seconds as words: `12.5 seconds`, `1 hour, 3 minutes and 2 seconds`
///
/// Only the largest three units are shown. Negative spans (clock skew
/// between the check host and telegraf) show as zero.
pub fn format_timespan(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    if seconds < 60.0 {
        return pluralize(&round_number(seconds), "second");
    }

    let mut remaining = seconds;
    let mut parts = Vec::new();
    for &(divider, name) in &TIME_UNITS[..TIME_UNITS.len() - 1] {
        if remaining >= divider {
            let count = (remaining / divider).floor();
            remaining -= count * divider;
            parts.push(pluralize(&count.to_string(), name));
        }
    }
    // seconds keep their fraction
    let seconds = round_number(remaining);
    if seconds != "0" {
        parts.push(pluralize(&seconds, "second"));
    }
    parts.truncate(MAX_TIME_UNITS);
    concatenate(&parts)
}

/// `a`, `a and b`, `a, b and c`
fn concatenate(parts: &[String]) -> String {
    match parts.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.iter().join(", "), last),
    }
}
