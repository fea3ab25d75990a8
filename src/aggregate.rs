//! Fold raw samples into one record per timestamp
//!
//! InfluxDB hands back one row per field, Telegraf writes all the fields of a
//! measurement with the same timestamp. Checks want to look at all the fields
//! of the newest point at once, so `aggregate` merges rows that share a
//! second into a `CompositeRecord`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// A single value as stored in InfluxDB
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    UInteger(u64),
    Boolean(bool),
    Text(String),
}

impl FieldValue {
    /// The value as a float, if it is (or contains) a number
    ///
    /// Text is parsed because some Windows counters are shipped as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Float(v) => Some(v),
            FieldValue::Integer(v) => Some(v as f64),
            FieldValue::UInteger(v) => Some(v as f64),
            FieldValue::Boolean(_) => None,
            FieldValue::Text(ref s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::UInteger(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Text(ref v) => write!(f, "{:?}", v),
        }
    }
}

/// One row from the store
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub time: DateTime<Utc>,
    pub field: String,
    pub value: FieldValue,
}

impl SampleRecord {
    pub fn new<S: Into<String>>(time: DateTime<Utc>, field: S, value: FieldValue) -> SampleRecord {
        SampleRecord {
            time,
            field: field.into(),
            value,
        }
    }
}

/// Every field observed at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRecord {
    /// The instant of the first sample seen for this second
    pub time: DateTime<Utc>,
    fields: BTreeMap<String, FieldValue>,
}

impl CompositeRecord {
    pub fn new(time: DateTime<Utc>) -> CompositeRecord {
        CompositeRecord {
            time,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    fn set(&mut self, field: String, value: FieldValue) {
        self.fields.insert(field, value);
    }
}

impl fmt::Display for CompositeRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {{", self.time.to_rfc3339())?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", k, v)?;
        }
        write!(f, " }}")
    }
}

/// Records keyed by unix second, ordered oldest first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregated(BTreeMap<i64, CompositeRecord>);

impl Aggregated {
    /// The record with the greatest timestamp
    pub fn latest(&self) -> Option<&CompositeRecord> {
        self.0.values().next_back()
    }
}

/// Merge samples into per-second records
///
/// Samples are applied in the order given: if two samples share a second and
/// a field name the later one wins. Other fields are never removed.
pub fn aggregate<I>(samples: I) -> Aggregated
where
    I: IntoIterator<Item = SampleRecord>,
{
    let mut records = BTreeMap::new();
    for SampleRecord { time, field, value } in samples {
        records
            .entry(time.timestamp())
            .or_insert_with(|| CompositeRecord::new(time))
            .set(field, value);
    }
    Aggregated(records)
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(secs: i64, field: &str, value: f64) -> SampleRecord {
        SampleRecord::new(
            Utc.timestamp_opt(secs, 0).unwrap(),
            field,
            FieldValue::Float(value),
        )
    }

    fn samples() -> Vec<SampleRecord> {
        vec![
            // one table per field, like influx returns them
            at(100, "used", 1.0),
            at(110, "used", 2.0),
            at(120, "used", 3.0),
            at(100, "free", 9.0),
            at(110, "free", 8.0),
            at(120, "free", 7.0),
        ]
    }

    #[test]
    fn empty_has_no_latest() {
        let result = aggregate(Vec::new());
        assert!(result.0.is_empty());
        assert_eq!(result.latest(), None);
    }

    #[test]
    fn merges_fields_sharing_a_timestamp() {
        let result = aggregate(samples());
        assert_eq!(result.0.len(), 3);
        let latest = result.latest().unwrap();
        assert_eq!(latest.time.timestamp(), 120);
        assert_eq!(latest.get("used"), Some(&FieldValue::Float(3.0)));
        assert_eq!(latest.get("free"), Some(&FieldValue::Float(7.0)));
        assert_eq!(latest.fields.len(), 2);
    }

    #[test]
    fn later_samples_overwrite_only_their_field() {
        let mut input = samples();
        input.push(at(120, "used", 30.0));
        let result = aggregate(input);
        let latest = result.latest().unwrap();
        assert_eq!(latest.get("used"), Some(&FieldValue::Float(30.0)));
        assert_eq!(latest.get("free"), Some(&FieldValue::Float(7.0)));
    }

    #[test]
    fn sub_second_samples_share_a_record() {
        let first = Utc.timestamp_opt(100, 250_000_000).unwrap();
        let second = Utc.timestamp_opt(100, 750_000_000).unwrap();
        let result = aggregate(vec![
            SampleRecord::new(first, "a", FieldValue::Integer(1)),
            SampleRecord::new(second, "b", FieldValue::Integer(2)),
        ]);
        assert_eq!(result.0.len(), 1);
        let record = &result.0[&100];
        assert_eq!(record.time, first);
        assert!(record.contains("a") && record.contains("b"));
    }

    #[test]
    fn iterates_oldest_first_whatever_the_input_order() {
        let mut reversed = samples();
        reversed.reverse();
        let forward = aggregate(samples());
        let backward = aggregate(reversed);

        assert_eq!(forward, backward);
        assert_eq!(forward, aggregate(samples()));
        let keys = backward.0.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, [100, 110, 120]);
    }

    #[test]
    fn field_values_as_numbers() {
        assert_eq!(FieldValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(FieldValue::UInteger(3).as_f64(), Some(3.0));
        assert_eq!(FieldValue::Text(" 12.75 ".into()).as_f64(), Some(12.75));
        assert_eq!(FieldValue::Text("twelve".into()).as_f64(), None);
        assert_eq!(FieldValue::Boolean(true).as_f64(), None);
    }
}
