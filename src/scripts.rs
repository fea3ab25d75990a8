//! Documentation about the checks contained herein
//!
//! - [check-telegraf-disk](#check-telegraf-disk)
//! - [check-telegraf-mailqueue](#check-telegraf-mailqueue)
//! - [Configuration](#configuration)
//!
//! # check-telegraf-disk
//!
//! Reads the `disk` and `win_disk` measurements.
//!
//! ```plain
//! $ check-telegraf-disk --help
//! check-telegraf-disk (part of influx-plugins) 0.1.0
//! Check disk usage reported to InfluxDB by telegraf
//!
//! The value compared against thresholds is the percent of the disk used, e.g. `-w 80 -c 90` warns above 80% and goes
//! critical above 90%.
//!
//! USAGE:
//!     check-telegraf-disk [FLAGS] [OPTIONS] --critical <critical> --host <host> --instance <instance> --warning <warning>
//!
//! FLAGS:
//!     -h, --help
//!             Prints help information
//!
//!     -V, --version
//!             Prints version information
//!
//!     -v, --verbose
//!             Print debug logs to stderr
//!
//!
//! OPTIONS:
//!         --config <config>
//!             INI file with an [influx2] section. Default: config.ini next to the check
//!
//!     -c, --critical <critical>
//!             Critical threshold, same syntax as --warning
//!
//!     -H, --host <host>
//!             The host to check, as tagged by telegraf
//!
//!     -I, --instance <instance>
//!             The disk to check: a mount path like / or a windows drive like C:
//!
//!     -w, --warning <warning>
//!             Warning threshold, e.g. 80, 10:90, @10:90 or :90
//! ```
//!
//! # check-telegraf-mailqueue
//!
//! Reads the `postfix_queue` and `msexchange.transport` measurements.
//!
//! ```plain
//! $ check-telegraf-mailqueue --help
//! check-telegraf-mailqueue (part of influx-plugins) 0.1.0
//! Check the length of a mail queue reported to InfluxDB by telegraf
//!
//! The value compared against thresholds is the number of mails in the queue.
//!
//! USAGE:
//!     check-telegraf-mailqueue [FLAGS] [OPTIONS] --critical <critical> --host <host> --instance <instance> --warning <warning>
//!
//! FLAGS:
//!     -h, --help
//!             Prints help information
//!
//!     -V, --version
//!             Prints version information
//!
//!     -v, --verbose
//!             Print debug logs to stderr
//!
//!
//! OPTIONS:
//!         --config <config>
//!             INI file with an [influx2] section. Default: config.ini next to the check
//!
//!     -c, --critical <critical>
//!             Critical threshold, same syntax as --warning
//!
//!     -H, --host <host>
//!             The host to check, as tagged by telegraf
//!
//!     -I, --instance <instance>
//!             The queue to check: a postfix queue like deferred, or an exchange counter like Messages_Queued_For_Delivery
//!
//!     -w, --warning <warning>
//!             Warning threshold, e.g. 80, 10:90, @10:90 or :90
//! ```
//!
//! # Configuration
//!
//! Every check reads its InfluxDB connection from an INI file, by default
//! `config.ini` next to the check executable. Use `--config` to point at
//! another file.
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
//! `verify_ssl` (default true) and `timeout` (seconds, default 10) are
//! optional, everything else is required.
//!
//! Thresholds use the Nagios range syntax: `10` alerts outside 0..10, `10:`
//! below 10, `~:10` above 10, `10:20` outside 10..20 and `@10:20` inside
//! 10..20.
