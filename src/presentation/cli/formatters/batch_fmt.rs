use std::fmt::Write;

use colored::Colorize;

use crate::application::services::pipeline::{RunOutcome, RunReport};
use crate::domain::entities::alert::{AlertBatch, AlertRecord};
use crate::domain::value_objects::severity::Severity;

/// Strips ESC so payload text cannot inject terminal sequences.
fn sanitize_terminal(input: &str) -> String {
    input.chars().filter(|c| *c != '\x1b').collect()
}

fn severity_badge(severity: Severity) -> String {
    let label = format!(" {severity} ");
    match severity {
        Severity::Critical => format!("{}", label.on_red().white().bold()),
        Severity::High => format!("{}", label.on_yellow().black().bold()),
        Severity::Medium => format!("{}", label.on_bright_yellow().black()),
        Severity::Low => format!("{}", label.on_blue().white()),
    }
}

fn render_record(out: &mut String, record: &AlertRecord) {
    let _ = writeln!(
        out,
        "{} {} {}",
        severity_badge(record.severity),
        sanitize_terminal(&record.key).bold(),
        format!("[{}]", record.category).dimmed()
    );
    for (name, value) in &record.payload {
        let text = value
            .as_str()
            .map_or_else(|| value.to_string(), str::to_string);
        let _ = writeln!(out, "  {} {}", format!("{name}:").dimmed(), sanitize_terminal(&text));
    }
}

/// Human-readable rendering of a batch.
#[must_use]
pub fn render_batch(batch: &AlertBatch) -> String {
    let mut out = String::new();
    if batch.is_empty() {
        let _ = writeln!(out, "{}", "No alerts: CI signal looks healthy".green().bold());
        return out;
    }
    let _ = writeln!(out, "{} alert(s):", batch.len());
    for record in batch {
        out.push('\n');
        render_record(&mut out, record);
    }
    out
}

/// One-line summary of how a run ended.
#[must_use]
pub fn render_report(report: &RunReport) -> String {
    match &report.outcome {
        RunOutcome::Delivered { alerts: 0, .. } => {
            format!("{} run {} (nothing to upload)", "✔".green(), report.run_id)
        }
        RunOutcome::Delivered { alerts, attempts } => format!(
            "{} run {} delivered {alerts} alert(s) in {attempts} attempt(s)",
            "✔".green(),
            report.run_id
        ),
        RunOutcome::Cancelled { during } => format!(
            "{} run {} cancelled while {during}",
            "↷".yellow(),
            report.run_id
        ),
        RunOutcome::Failed(e) => {
            format!("{} run {} failed: {e}", "✘".red().bold(), report.run_id)
        }
    }
}
