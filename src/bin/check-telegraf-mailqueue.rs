//! Check the length of a mail queue reported to InfluxDB by telegraf
//!
//! Understands the `postfix` input, where the instance is the queue name, and
//! the Exchange transport counters, where the instance is the counter name.

use structopt::clap::AppSettings;
use structopt::StructOpt;

use influx_plugins::checks::MailQueueCheck;
use influx_plugins::plugin::{parse_args, program_name, Plugin, PluginArgs};

/// Check the length of a mail queue reported to InfluxDB by telegraf
///
/// The value compared against thresholds is the number of mails in the queue.
#[derive(Debug, StructOpt)]
#[structopt(
    name = "check-telegraf-mailqueue (part of influx-plugins)",
    setting = AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(flatten)]
    plugin: PluginArgs,
    #[structopt(
        short = "I",
        long = "instance",
        help = "The queue to check: a postfix queue like deferred, or an exchange \
                counter like Messages_Queued_For_Delivery"
    )]
    instance: String,
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let prog = program_name("check-telegraf-mailqueue");
    let args: Args = parse_args(&prog);
    influx_plugins::init_logging(args.plugin.verbose);

    let target = args.plugin.target(args.instance);
    Plugin::new(prog, args.plugin, target, MailQueueCheck).run()
}

#[cfg(test)]
mod unit {
    use std::path::Path;

    use super::*;

    #[test]
    fn validate_argparse() {
        let args = Args::from_iter(&[
            "check-telegraf-mailqueue",
            "--host",
            "mx1",
            "--instance",
            "deferred",
            "--warning",
            "@0:10",
            "--critical",
            "100",
            "--config",
            "/etc/influx-plugins/config.ini",
            "-v",
        ]);
        assert_eq!(args.instance, "deferred");
        assert_eq!(args.plugin.host, "mx1");
        assert_eq!(args.plugin.warning, "@0:10");
        assert!(args.plugin.verbose);
        assert_eq!(
            args.plugin.config.as_ref().map(|p| p.as_path()),
            Some(Path::new("/etc/influx-plugins/config.ini"))
        );
    }
}
