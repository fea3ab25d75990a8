//! Regenerate `src/scripts.rs`
//!
//! The generated module is nothing but `//!` doc comments: a table of
//! contents, one section per check with its `--help` output as built by
//! cargo, and a closing section describing the `[influx2]` configuration
//! file and the threshold syntax shared by all checks.
//!
//! Run from the workspace root after `cargo build`:
//!
//! ```plain
//! cargo run -p make-docs > src/scripts.rs
//! ```

use std::process::Command;

/// A check binary and the one line shown above its help
struct Check {
    name: &'static str,
    about: &'static str,
}

const CHECKS: [Check; 2] = [
    Check {
        name: "check-telegraf-disk",
        about: "Reads the `disk` and `win_disk` measurements.",
    },
    Check {
        name: "check-telegraf-mailqueue",
        about: "Reads the `postfix_queue` and `msexchange.transport` measurements.",
    },
];

/// Body of the `# Configuration` section
const CONFIG: &str = "\
Every check reads its InfluxDB connection from an INI file, by default
`config.ini` next to the check executable. Use `--config` to point at
another file.

```ini
[influx2]
url = https://influx.example.com:8086
token = s3cr3t
org = example
bucket = telegraf
range = -1h
verify_ssl = true
timeout = 10
```

`verify_ssl` (default true) and `timeout` (seconds, default 10) are
optional, everything else is required.

Thresholds use the Nagios range syntax: `10` alerts outside 0..10, `10:`
below 10, `~:10` above 10, `10:20` outside 10..20 and `@10:20` inside
10..20.";

fn main() {
    let mut out = cp("Documentation about the checks contained herein\n".split('\n'));
    out.push('\n');
    out.push_str(&contents());
    out.push('\n');
    for check in &CHECKS {
        out.push_str(&help_section(check));
    }
    out.push_str("//!\n//! # Configuration\n//!\n");
    out.push_str(&cp(CONFIG.split('\n')));
    out.push('\n');
    print!("{}", out);
}

/// Links to every section
fn contents() -> String {
    cp(CHECKS
        .iter()
        .map(|c| format!("- [{0}](#{0})", c.name))
        .chain(Some("- [Configuration](#configuration)".to_owned())))
}

/// A heading, the check's about line and its `--help` in a plain block
fn help_section(check: &Check) -> String {
    let output = Command::new(format!("target/debug/{}", check.name))
        .arg("--help")
        .output()
        .unwrap_or_else(|e| panic!("Couldn't execute {}: {}", check.name, e));
    let help = String::from_utf8(output.stdout)
        .unwrap_or_else(|_| panic!("{} --help is not utf8", check.name));
    format!(
        "//!\n//! # {name}\n//!\n//! {about}\n//!\n//! ```plain\n//! $ {name} --help\n{help}\n//! ```\n",
        name = check.name,
        about = check.about,
        help = cp(help.split('\n')),
    )
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim().into())
        .collect::<Vec<String>>()
        .join("\n")
}
