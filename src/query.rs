//! Build Flux queries

use crate::config::ConnectionConfig;

/// Select the configured bucket and range, then apply `filter` as-is
///
/// `filter` is one or more `|> ...` pipeline stages, it is not validated.
pub fn build(filter: &str, config: &ConnectionConfig) -> String {
    format!(
        "from(bucket: {})\n  |> range(start: {})\n  {}\n",
        flux_string(&config.bucket),
        config.range,
        filter.trim()
    )
}

/// Quote `raw` as a Flux string literal
///
/// Hosts and instances come from the command line, this keeps a stray `"`
/// from ending the literal early.
pub fn flux_string(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
