//! Connection settings for InfluxDB
//!
//! Settings live in an INI file with a single `[influx2]` section:
//!
//! ```ini
//! [influx2]
//! url = https://influx.example.com:8086
//! token = s3cr3t
//! org = example
//! bucket = telegraf
//! range = -1h
//! verify_ssl = true
//! timeout = 10
//! ```
//!
//! `verify_ssl` and `timeout` (seconds) are optional.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, File, FileFormat};
use log::debug;
use serde::Deserialize;
use url::Url;

pub const SECTION: &str = "influx2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum ConfigError {
    /// The file couldn't be read or isn't valid INI
    Load(PathBuf, ::config::ConfigError),
    MissingSection(PathBuf),
    MissingKey(PathBuf, &'static str),
    InvalidUrl(String, url::ParseError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ConfigError::*;
        match *self {
            Load(ref path, ref e) => write!(f, "Unable to load {}: {}", path.display(), e),
            MissingSection(ref path) => write!(
                f,
                "Missing configuration in {}: no [{}] section",
                path.display(),
                SECTION
            ),
            MissingKey(ref path, key) => write!(
                f,
                "Missing configuration in {}: [{}] has no '{}'",
                path.display(),
                SECTION,
                key
            ),
            InvalidUrl(ref url, ref e) => write!(f, "Invalid url '{}' in configuration: {}", url, e),
        }
    }
}

/// Everything needed to build a client and a query
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub url: Url,
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// A Flux duration like `-1h`, used as the range start
    pub range: String,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    influx2: Option<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    url: Option<String>,
    token: Option<String>,
    org: Option<String>,
    bucket: Option<String>,
    range: Option<String>,
    verify_ssl: Option<bool>,
    timeout: Option<u64>,
}

impl ConnectionConfig {
    /// Read and validate the `[influx2]` section of the INI file at `path`
    pub fn load(path: &Path) -> Result<ConnectionConfig, ConfigError> {
        debug!("Loading configuration from {}", path.display());
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()
            .map_err(|e| ConfigError::Load(path.to_owned(), e))?;
        let raw: RawFile = settings
            .try_deserialize()
            .map_err(|e| ConfigError::Load(path.to_owned(), e))?;
        let section = raw
            .influx2
            .ok_or_else(|| ConfigError::MissingSection(path.to_owned()))?;
        ConnectionConfig::from_section(path, section)
    }

    fn from_section(path: &Path, section: RawSection) -> Result<ConnectionConfig, ConfigError> {
        let required = |value: Option<String>, key: &'static str| match value {
            Some(ref v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
            _ => Err(ConfigError::MissingKey(path.to_owned(), key)),
        };

        let raw_url = required(section.url, "url")?;
        let url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl(raw_url.clone(), e))?;

        Ok(ConnectionConfig {
            url,
            token: required(section.token, "token")?,
            org: required(section.org, "org")?,
            bucket: required(section.bucket, "bucket")?,
            range: required(section.range, "range")?,
            verify_ssl: section.verify_ssl.unwrap_or(true),
            timeout: Duration::from_secs(section.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

/// `config.ini` next to the running executable
///
/// Checks are normally installed into one plugin directory together with
/// their configuration. Falls back to the working directory.
pub fn default_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("config.ini")))
        .unwrap_or_else(|| PathBuf::from("config.ini"))
}
