//! Interact with InfluxDB
//!
//! This module defines the client that sends Flux queries to the InfluxDB 2
//! HTTP API, and the parser that turns the annotated CSV it answers with into
//! `SampleRecord`s.
//!
//! The `QueryApi` trait is the seam between the plugin lifecycle and the
//! network, anything that can answer a Flux query with samples can stand in
//! for the real client.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::aggregate::{FieldValue, SampleRecord};
use crate::config::ConnectionConfig;

/// Something that can run a Flux query
pub trait QueryApi {
    fn query(&self, flux: &str) -> Result<Vec<SampleRecord>, StoreError>;
}

impl<'a, Q: QueryApi + ?Sized> QueryApi for &'a Q {
    fn query(&self, flux: &str) -> Result<Vec<SampleRecord>, StoreError> {
        (**self).query(flux)
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Couldn't talk to InfluxDB at all
    Http(reqwest::Error),
    Url(url::ParseError),
    /// InfluxDB answered with a non-2xx status
    Api { status: u16, message: String },
    Csv(csv::Error),
    /// The query itself failed, reported inside a 200 response
    Query(String),
    /// The response didn't look like the tables we asked for
    Format(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Http(e)
    }
}

impl From<url::ParseError> for StoreError {
    fn from(e: url::ParseError) -> Self {
        StoreError::Url(e)
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StoreError::Http(ref e) => write!(f, "Error querying InfluxDB: {}", e),
            StoreError::Url(ref e) => write!(f, "Invalid InfluxDB url: {}", e),
            StoreError::Api {
                status,
                ref message,
            } => write!(f, "InfluxDB returned status {}: {}", status, message),
            StoreError::Csv(ref e) => write!(f, "Error reading InfluxDB response: {}", e),
            StoreError::Query(ref e) => write!(f, "InfluxDB query failed: {}", e),
            StoreError::Format(ref e) => write!(f, "Unexpected InfluxDB response: {}", e),
        }
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    dialect: Dialect,
}

#[derive(Serialize)]
struct Dialect {
    header: bool,
    annotations: &'static [&'static str],
    delimiter: &'static str,
}

/// The body InfluxDB sends along with a non-2xx status
#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// A blocking client for the `/api/v2/query` endpoint
pub struct InfluxClient {
    client: Client,
    endpoint: Url,
    token: String,
}

impl InfluxClient {
    pub fn new(config: &ConnectionConfig) -> Result<InfluxClient, StoreError> {
        if !config.verify_ssl {
            warn!("SSL verification is disabled");
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;
        Ok(InfluxClient {
            client,
            endpoint: query_endpoint(&config.url, &config.org)?,
            token: config.token.clone(),
        })
    }
}

impl QueryApi for InfluxClient {
    fn query(&self, flux: &str) -> Result<Vec<SampleRecord>, StoreError> {
        debug!("POST {}\n{}", self.endpoint, flux);
        let body = QueryRequest {
            query: flux,
            kind: "flux",
            dialect: Dialect {
                header: true,
                annotations: &["datatype"],
                delimiter: ",",
            },
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(ACCEPT, "application/csv")
            .json(&body)
            .send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.message)
                .unwrap_or_else(|_| text.trim().to_owned());
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        parse_csv(&text)
    }
}

/// `<url>/api/v2/query?org=<org>`, keeping any path prefix of `url`
fn query_endpoint(url: &Url, org: &str) -> Result<Url, StoreError> {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut endpoint = base.join("api/v2/query")?;
    endpoint.query_pairs_mut().append_pair("org", org);
    Ok(endpoint)
}

/// How to read the `_value` column of a table
#[derive(Clone, Copy, Debug, PartialEq)]
enum ValueKind {
    Double,
    Long,
    UnsignedLong,
    Boolean,
    Text,
}

impl ValueKind {
    fn from_datatype(datatype: &str) -> ValueKind {
        match datatype {
            "double" => ValueKind::Double,
            "long" => ValueKind::Long,
            "unsignedLong" => ValueKind::UnsignedLong,
            "boolean" => ValueKind::Boolean,
            _ => ValueKind::Text,
        }
    }

    fn parse(self, raw: &str) -> Option<FieldValue> {
        match self {
            ValueKind::Double => raw.parse().ok().map(FieldValue::Float),
            ValueKind::Long => raw.parse().ok().map(FieldValue::Integer),
            ValueKind::UnsignedLong => raw.parse().ok().map(FieldValue::UInteger),
            ValueKind::Boolean => match raw {
                "true" => Some(FieldValue::Boolean(true)),
                "false" => Some(FieldValue::Boolean(false)),
                _ => None,
            },
            ValueKind::Text => Some(FieldValue::Text(raw.to_owned())),
        }
    }
}

/// Column layout of the table currently being read
enum Table {
    Data {
        time: usize,
        field: usize,
        value: usize,
        kind: ValueKind,
    },
    Error {
        message: usize,
    },
}

impl Table {
    fn from_header(
        header: &csv::StringRecord,
        datatypes: Option<&csv::StringRecord>,
    ) -> Result<Table, StoreError> {
        let column = |name: &str| header.iter().position(|col| col == name);
        if let Some(message) = column("error") {
            return Ok(Table::Error { message });
        }
        let missing = |name: &str| StoreError::Format(format!("table has no {} column", name));
        let value = column("_value").ok_or_else(|| missing("_value"))?;
        let kind = datatypes
            .and_then(|types| types.get(value))
            .map_or(ValueKind::Text, ValueKind::from_datatype);
        Ok(Table::Data {
            time: column("_time").ok_or_else(|| missing("_time"))?,
            field: column("_field").ok_or_else(|| missing("_field"))?,
            value,
            kind,
        })
    }
}

/// Read annotated CSV as returned by `/api/v2/query`
///
/// Every table starts with annotation rows (we ask for `#datatype`) and a
/// header row. Rows with an empty `_value` are nulls and are skipped.
pub fn parse_csv(body: &str) -> Result<Vec<SampleRecord>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut datatypes = None;
    let mut table = None;
    let mut samples = Vec::new();

    for row in reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        if row.get(0).map_or(false, |first| first.starts_with('#')) {
            if row.get(0) == Some("#datatype") {
                datatypes = Some(row.clone());
            }
            table = None;
            continue;
        }
        if table.is_none() {
            table = Some(Table::from_header(&row, datatypes.as_ref())?);
            continue;
        }

        match table {
            Some(Table::Error { message }) => {
                let message = row.get(message).unwrap_or("unknown error");
                return Err(StoreError::Query(message.to_owned()));
            }
            Some(Table::Data {
                time,
                field,
                value,
                kind,
            }) => {
                let raw_value = row.get(value).unwrap_or("");
                if raw_value.is_empty() {
                    continue;
                }
                let value = kind.parse(raw_value).ok_or_else(|| {
                    StoreError::Format(format!("can't read {:?} as {:?}", raw_value, kind))
                })?;
                let raw_time = row.get(time).unwrap_or("");
                let time = DateTime::parse_from_rfc3339(raw_time)
                    .map_err(|e| StoreError::Format(format!("bad _time {:?}: {}", raw_time, e)))?
                    .with_timezone(&Utc);
                let field = row.get(field).unwrap_or("");
                samples.push(SampleRecord::new(time, field, value));
            }
            None => {}
        }
    }

    debug!("Read {} samples from InfluxDB", samples.len());
    Ok(samples)
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use mockito::Matcher;

    use super::*;
    use crate::config::test::connection;

    const TWO_TABLES: &str = "\
#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,double,string,string,string,string\r
,result,table,_start,_stop,_time,_value,_field,_measurement,host,path\r
,_result,0,2022-06-01T10:00:00Z,2022-06-01T11:00:00Z,2022-06-01T10:59:50Z,42,used_percent,disk,db1,/\r
,_result,0,2022-06-01T10:00:00Z,2022-06-01T11:00:00Z,2022-06-01T11:00:00Z,43.5,used_percent,disk,db1,/\r
\r
#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,long,string,string,string,string\r
,result,table,_start,_stop,_time,_value,_field,_measurement,host,path\r
,_result,1,2022-06-01T10:00:00Z,2022-06-01T11:00:00Z,2022-06-01T11:00:00Z,1000,used,disk,db1,/\r
,_result,1,2022-06-01T10:00:00Z,2022-06-01T11:00:00Z,2022-06-01T11:00:00Z,,free,disk,db1,/\r
\r
";

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn reads_typed_values_from_every_table() {
        let samples = parse_csv(TWO_TABLES).unwrap();
        let before = Utc.with_ymd_and_hms(2022, 6, 1, 10, 59, 50).unwrap();
        let last = Utc.with_ymd_and_hms(2022, 6, 1, 11, 0, 0).unwrap();
        assert_eq!(
            samples,
            vec![
                SampleRecord::new(before, "used_percent", FieldValue::Float(42.0)),
                SampleRecord::new(last, "used_percent", FieldValue::Float(43.5)),
                SampleRecord::new(last, "used", FieldValue::Integer(1000)),
            ]
        );
    }

    #[test]
    fn empty_body_is_no_samples() {
        assert_eq!(parse_csv("").unwrap(), vec![]);
        assert_eq!(parse_csv("\r\n").unwrap(), vec![]);
    }

    #[test]
    fn without_annotations_values_are_text() {
        let body = ",result,table,_time,_value,_field\n,,0,1970-01-01T00:01:40Z,12.9,Messages Queued For Delivery\n";
        assert_eq!(
            parse_csv(body).unwrap(),
            vec![SampleRecord::new(
                at(100),
                "Messages Queued For Delivery",
                FieldValue::Text("12.9".into())
            )]
        );
    }

    #[test]
    fn error_tables_are_errors() {
        let body = "#datatype,string,string\n,error,reference\n,bucket \"nope\" not found,\n";
        match parse_csv(body) {
            Err(StoreError::Query(msg)) => assert_eq!(msg, "bucket \"nope\" not found"),
            other => panic!("expected a query error, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_values_are_errors() {
        let body = "#datatype,string,long,dateTime:RFC3339,double,string\n\
                    ,result,table,_time,_value,_field\n\
                    ,,0,1970-01-01T00:01:40Z,lots,used\n";
        match parse_csv(body) {
            Err(StoreError::Format(_)) => {}
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn tables_need_value_columns() {
        let body = ",result,table,_time,used,free\n,,0,1970-01-01T00:01:40Z,1,2\n";
        match parse_csv(body) {
            Err(StoreError::Format(msg)) => assert_eq!(msg, "table has no _value column"),
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn endpoint_keeps_path_prefix() {
        let url = Url::parse("https://metrics.example.com/influx").unwrap();
        assert_eq!(
            query_endpoint(&url, "my org").unwrap().as_str(),
            "https://metrics.example.com/influx/api/v2/query?org=my+org"
        );
        let url = Url::parse("http://localhost:8086").unwrap();
        assert_eq!(
            query_endpoint(&url, "example").unwrap().as_str(),
            "http://localhost:8086/api/v2/query?org=example"
        );
    }

    /// Keeps every warning logged while tests run
    struct Warnings;

    static WARNINGS: Warnings = Warnings;
    static WARNED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    impl log::Log for Warnings {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                WARNED.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    fn capture_warnings() {
        let _ = log::set_logger(&WARNINGS);
        log::set_max_level(log::LevelFilter::Warn);
    }

    #[test]
    fn disabling_ssl_verification_warns() {
        capture_warnings();
        let mut config = connection();
        config.verify_ssl = false;
        let client = InfluxClient::new(&config).unwrap();
        assert!(WARNED
            .lock()
            .unwrap()
            .iter()
            .any(|w| w == "SSL verification is disabled"));
        assert_eq!(
            client.endpoint.as_str(),
            "http://localhost:8086/api/v2/query?org=example"
        );
    }

    #[test]
    fn insecure_clients_still_query() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v2/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(TWO_TABLES)
            .create();

        let mut config = connection();
        config.url = Url::parse(&server.url()).unwrap();
        config.verify_ssl = false;
        let samples = InfluxClient::new(&config)
            .unwrap()
            .query("from(bucket: \"telegraf\")")
            .unwrap();
        mock.assert();
        assert_eq!(samples.len(), 3);
    }

    fn client_for(server: &mockito::ServerGuard) -> InfluxClient {
        let mut config = connection();
        config.url = Url::parse(&server.url()).unwrap();
        InfluxClient::new(&config).unwrap()
    }

    #[test]
    fn queries_with_token_and_org() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v2/query")
            .match_query(Matcher::UrlEncoded("org".into(), "example".into()))
            .match_header("authorization", "Token t0ken")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "query": "from(bucket: \"telegraf\")",
                "type": "flux",
            })))
            .with_status(200)
            .with_header("content-type", "text/csv; charset=utf-8")
            .with_body(TWO_TABLES)
            .create();

        let samples = client_for(&server).query("from(bucket: \"telegraf\")").unwrap();
        mock.assert();
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn api_errors_carry_the_message() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/api/v2/query")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"unauthorized","message":"unauthorized access"}"#)
            .create();

        match client_for(&server).query("from(bucket: \"telegraf\")") {
            Err(StoreError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "unauthorized access");
            }
            other => panic!("expected an api error, got {:?}", other),
        }
    }
}
