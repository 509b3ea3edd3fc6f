use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn status(label: &str, value: &str) {
    println!("{}: {}", label.style(theme().label), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK.style(theme().written), label);
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS.style(theme().error), label.style(theme().error));
}

pub fn muted(text: &str) -> String {
    text.style(theme().unchanged).to_string()
}

/// `wrote: <path>`, the line scripts look for after an emit
pub fn file_written(path: &str) {
    println!("{} {}", "wrote:".style(theme().written), path);
}

pub fn file_unchanged(path: &str) {
    println!("{} {}", "unchanged:".style(theme().unchanged), path);
}

pub fn no_drift() {
    println!("{}", "No drift.".style(theme().clean));
}

pub fn drift_detected() {
    println!("{}", "Drift detected.".style(theme().drift));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label), value);
}
