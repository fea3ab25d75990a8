//! Disk usage as reported by telegraf's `disk` and `win_disk` inputs

use chrono::{DateTime, Utc};
use log::debug;

use crate::aggregate::CompositeRecord;
use crate::check::{number, sample_age, Check, CheckError, Measurement, Target};
use crate::human::{format_size, format_timespan};
use crate::perfdata::{PerfData, Unit};
use crate::query::flux_string;

/// Bytes in one of the megabytes reported by `win_disk`
const WINDOWS_MEGABYTE: f64 = 1_000_000.0;

/// Check how full a single disk is
///
/// The value compared against thresholds is the percent of the disk used.
pub struct DiskCheck;

/// The two ways telegraf reports disk space
#[derive(Clone, Debug, PartialEq)]
pub enum DiskSample {
    /// `inputs.disk`, bytes everywhere
    Posix {
        used: f64,
        total: f64,
        free: f64,
        used_percent: f64,
    },
    /// `inputs.win_perf_counters`, only free space is reported
    Windows {
        free_percent: f64,
        free_megabytes: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiskUsage {
    pub used: f64,
    pub free: f64,
    pub total: f64,
    pub used_percent: f64,
    pub free_percent: f64,
}

impl DiskSample {
    /// Pick the dialect by looking for `inodes_free`, which only the posix
    /// input reports
    pub fn detect(record: &CompositeRecord, target: &Target) -> Result<DiskSample, CheckError> {
        if record.contains("inodes_free") {
            debug!("Detected *nix metric");
            Ok(DiskSample::Posix {
                used: number(record, "used", target)?,
                total: number(record, "total", target)?,
                free: number(record, "free", target)?,
                used_percent: number(record, "used_percent", target)?,
            })
        } else {
            debug!("Detected windows metric");
            Ok(DiskSample::Windows {
                free_percent: number(record, "Percent_Free_Space", target)?,
                free_megabytes: number(record, "Free_Megabytes", target)?,
            })
        }
    }

    pub fn usage(&self, target: &Target) -> Result<DiskUsage, CheckError> {
        match *self {
            DiskSample::Posix {
                used,
                total,
                free,
                used_percent,
            } => Ok(DiskUsage {
                used,
                free,
                total,
                used_percent,
                free_percent: 100.0 - used_percent,
            }),
            DiskSample::Windows {
                free_percent,
                free_megabytes,
            } => {
                if free_percent == 0.0 {
                    return Err(CheckError::DivisionByZero {
                        host: target.host.clone(),
                        field: "Percent_Free_Space",
                    });
                }
                let free = free_megabytes * WINDOWS_MEGABYTE;
                let used_percent = 100.0 - free_percent;
                let used = free / free_percent * used_percent;
                Ok(DiskUsage {
                    used,
                    free,
                    total: free + used,
                    used_percent,
                    free_percent,
                })
            }
        }
    }
}

impl Check for DiskCheck {
    fn filter(&self, target: &Target) -> String {
        let instance = flux_string(&target.instance);
        format!(
            r#"|> filter(fn: (r) => r["_measurement"] == "disk" or r["_measurement"] == "win_disk")
  |> filter(fn: (r) => r["host"] == {host})
  |> filter(fn: (r) => r["instance"] == {instance} or r["device"] == {instance} or r["path"] == {instance})"#,
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
        let usage = DiskSample::detect(latest, target)?.usage(target)?;

        let mut perfdata = PerfData::new();
        perfdata.insert("used", usage.used, Unit::Bytes);
        perfdata.insert("free", usage.free, Unit::Bytes);
        perfdata.insert("total", usage.total, Unit::Bytes);
        perfdata.insert("used_percent", usage.used_percent, Unit::Percent);
        perfdata.insert("free_percent", usage.free_percent, Unit::Percent);
        let age = sample_age(latest, now, &mut perfdata);

        Ok(Measurement {
            value: usage.used_percent,
            perfdata,
            summary: format!(
                "<strong>{}</strong> {:.2}% used ({} of {}) ({} ago)",
                target.instance,
                usage.used_percent,
                format_size(usage.used),
                format_size(usage.total),
                format_timespan(age)
            ),
        })
    }
}
