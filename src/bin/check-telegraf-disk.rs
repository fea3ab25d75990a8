//! Check disk usage reported to InfluxDB by telegraf
//!
//! Works with both the `disk` input (Linux, BSD, macOS) and the `win_disk`
//! performance counters. The value compared against thresholds is the
//! percent of the disk that is used.

use structopt::clap::AppSettings;
use structopt::StructOpt;

use influx_plugins::checks::DiskCheck;
use influx_plugins::plugin::{parse_args, program_name, Plugin, PluginArgs};

/// Check disk usage reported to InfluxDB by telegraf
///
/// The value compared against thresholds is the percent of the disk used,
/// e.g. `-w 80 -c 90` warns above 80% and goes critical above 90%.
#[derive(Debug, StructOpt)]
#[structopt(
    name = "check-telegraf-disk (part of influx-plugins)",
    setting = AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(flatten)]
    plugin: PluginArgs,
    #[structopt(
        short = "I",
        long = "instance",
        help = "The disk to check: a mount path like / or a windows drive like C:"
    )]
    instance: String,
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let prog = program_name("check-telegraf-disk");
    let args: Args = parse_args(&prog);
    influx_plugins::init_logging(args.plugin.verbose);

    let target = args.plugin.target(args.instance);
    Plugin::new(prog, args.plugin, target, DiskCheck).run()
}
