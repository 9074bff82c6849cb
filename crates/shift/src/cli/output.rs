//! Console rendering.

use std::fmt::Display;

use console::style;
use shift_core::migration::{AppliedMigration, Migration};
use shift_runtime::StatusReport;

const SUCCESS: char = '✔';
const FAILURE: char = '✘';

pub fn success(text: impl Display) {
    println!("{} {}", style(SUCCESS).green().bold(), text);
}

pub fn failure(text: impl Display) {
    println!("{} {}", style(FAILURE).red().bold(), text);
}

pub fn applied(applied: &AppliedMigration) {
    success(format_args!(
        "Migration {} has been executed in {} seconds",
        applied.migration.name,
        applied.duration.as_secs_f64()
    ));
}

pub fn status(report: &StatusReport) {
    println!("{}", status_text(report));
}

pub(crate) fn status_text(report: &StatusReport) -> String {
    let mut out = String::new();

    if report.checkpoint.version.is_empty() {
        out.push_str("Current version: none\n");
    } else {
        out.push_str(&format!(
            "Current version: {} ({})\n",
            report.checkpoint.version, report.checkpoint.direction
        ));
    }

    out.push_str("Migrations to upgrade\n");
    push_lines(&mut out, report.upgrades.iter());
    out.push_str("Migrations to downgrade\n");
    push_lines(&mut out, report.downgrades.iter());

    out.trim_end().to_string()
}

fn push_lines<'a>(out: &mut String, migrations: impl Iterator<Item = &'a Migration>) {
    for m in migrations {
        out.push_str(&format!("{} - {}\n", m.version, m.name));
    }
}
