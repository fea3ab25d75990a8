//! Performance data: the part of the check output after the `|`

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;

/// The unit suffix written directly after a value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    None,
    Bytes,
    Percent,
    Seconds,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Bytes => "b",
            Unit::Percent => "%",
            Unit::Seconds => "s",
        }
    }
}

/// Named, pre-formatted metrics, always rendered sorted by name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerfData(BTreeMap<String, String>);

impl PerfData {
    pub fn new() -> PerfData {
        PerfData(BTreeMap::new())
    }

    /// Record `value` under `name`, replacing anything already there
    pub fn insert<S, V>(&mut self, name: S, value: V, unit: Unit)
    where
        S: Into<String>,
        V: fmt::Display,
    {
        self.0
            .insert(name.into(), format!("{}{}", value, unit.suffix()));
    }

    /// Take every entry from `other`, `other` wins on collisions
    pub fn extend(&mut self, other: PerfData) {
        self.0.extend(other.0)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PerfData {
    /// `'name'=value` pairs separated by single spaces
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|(name, value)| format!("'{}'={}", name, value))
                .join(" ")
        )
    }
}
