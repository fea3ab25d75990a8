//! Mail queue length from telegraf's `postfix` input or the Exchange
//! transport performance counters

use chrono::{DateTime, Utc};
use log::debug;

use crate::aggregate::CompositeRecord;
use crate::check::{number, sample_age, Check, CheckError, Measurement, Target};
use crate::human::format_timespan;
use crate::perfdata::{PerfData, Unit};
use crate::query::flux_string;

/// Check the number of mails waiting in a queue
///
/// For postfix the instance is the queue name (`active`, `deferred`, ...).
/// For Exchange it is the name of the counter, e.g.
/// `Messages_Queued_For_Delivery`.
pub struct MailQueueCheck;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QueueSample {
    Postfix { length: i64 },
    Exchange { length: i64 },
}

impl QueueSample {
    /// Postfix reports a `length` field, Exchange stores the counter under
    /// its own name
    pub fn detect(record: &CompositeRecord, target: &Target) -> Result<QueueSample, CheckError> {
        if record.contains("length") {
            debug!("Detected postfix");
            let length = number(record, "length", target)?;
            Ok(QueueSample::Postfix {
                length: length.trunc() as i64,
            })
        } else {
            debug!("Detected msexchange");
            let length = number(record, &target.instance, target)?;
            Ok(QueueSample::Exchange {
                length: length.floor() as i64,
            })
        }
    }

    pub fn length(self) -> i64 {
        match self {
            QueueSample::Postfix { length } | QueueSample::Exchange { length } => length,
        }
    }
}

impl Check for MailQueueCheck {
    fn filter(&self, target: &Target) -> String {
        let instance = flux_string(&target.instance);
        format!(
            r#"|> filter(fn: (r) => r["_measurement"] == "postfix_queue" or r["_measurement"] == "msexchange.transport")
  |> filter(fn: (r) => r["host"] == {host})
  |> filter(fn: (r) => r["_field"] == {instance} or r["queue"] == {instance})"#,
            host = flux_string(&target.host),
            instance = instance
        )
    }

    fn extract(
        &self,
        latest: &CompositeRecord,
        target: &Target,
        now: DateTime<Utc>,
    ) -> Result<Measurement, CheckError> {
        debug!("Influx data={}", latest);
        let length = QueueSample::detect(latest, target)?.length();

        let mut perfdata = PerfData::new();
        perfdata.insert("length", length, Unit::None);
        let age = sample_age(latest, now, &mut perfdata);

        Ok(Measurement {
            value: length as f64,
            perfdata,
            summary: format!(
                "<strong>{}</strong> with {} items ({} ago)",
                target.instance,
                length,
                format_timespan(age)
            ),
        })
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::aggregate::{aggregate, FieldValue, SampleRecord};

    fn target(instance: &str) -> Target {
        Target {
            host: "mx1".into(),
            instance: instance.into(),
        }
    }

    fn record(fields: Vec<(&str, FieldValue)>) -> CompositeRecord {
        let at = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let results = aggregate(
            fields
                .into_iter()
                .map(|(field, value)| SampleRecord::new(at, field, value)),
        );
        results.latest().unwrap().clone()
    }

    #[test]
    fn postfix_queue() {
        let latest = record(vec![
            ("length", FieldValue::Integer(12)),
            ("size", FieldValue::Integer(4096)),
            ("age", FieldValue::Integer(30)),
        ]);
        let now = latest.time + Duration::seconds(3);
        let measured = MailQueueCheck
            .extract(&latest, &target("deferred"), now)
            .unwrap();
        assert_eq!(measured.value, 12.0);
        assert_eq!(measured.perfdata.to_string(), "'length'=12 'timestamp'=1600000000");
        assert_eq!(
            measured.summary,
            "<strong>deferred</strong> with 12 items (3 seconds ago)"
        );
    }

    #[test]
    fn exchange_counter_is_floored() {
        let instance = "Messages_Queued_For_Delivery";
        let latest = record(vec![(instance, FieldValue::Text("7.9".into()))]);
        assert_eq!(
            QueueSample::detect(&latest, &target(instance)),
            Ok(QueueSample::Exchange { length: 7 })
        );

        let latest = record(vec![(instance, FieldValue::Float(3.2))]);
        let measured = MailQueueCheck
            .extract(&latest, &target(instance), latest.time)
            .unwrap();
        assert_eq!(measured.value, 3.0);
    }

    #[test]
    fn exchange_counter_must_match_the_instance() {
        let latest = record(vec![("Something_Else", FieldValue::Float(3.0))]);
        match MailQueueCheck.extract(&latest, &target("Messages_Queued_For_Delivery"), latest.time) {
            Err(CheckError::MissingField { field, host }) => {
                assert_eq!(field, "Messages_Queued_For_Delivery");
                assert_eq!(host, "mx1");
            }
            other => panic!("expected a missing field, got {:?}", other),
        }
    }

    #[test]
    fn nan_counters_are_not_empty_queues() {
        let instance = "Messages_Queued_For_Delivery";
        let latest = record(vec![(instance, FieldValue::Text("NaN".into()))]);
        match MailQueueCheck.extract(&latest, &target(instance), latest.time) {
            Err(CheckError::InvalidField { field, .. }) => assert_eq!(field, instance),
            other => panic!("expected an invalid field, got {:?}", other),
        }

        let latest = record(vec![("length", FieldValue::Float(f64::INFINITY))]);
        assert!(MailQueueCheck
            .extract(&latest, &target("deferred"), latest.time)
            .is_err());
    }

    #[test]
    fn filter_selects_field_or_queue() {
        let filter = MailQueueCheck.filter(&target("active"));
        assert!(filter.contains(r#"r["host"] == "mx1""#));
        assert!(filter.contains(r#"r["_field"] == "active" or r["queue"] == "active""#));
    }
}
