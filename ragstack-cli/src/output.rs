//! Summary rendering for the terminal

use anyhow::Result;
use clap::ValueEnum;
use ragstack_models::{ComponentStatus, RunSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:<17} {}\n",
        "COMPONENT", "STATUS", "MESSAGE"
    ));
    out.push_str(&format!("{}\n", "-".repeat(72)));
    for result in &summary.results {
        out.push_str(&format!(
            "{:<16} {:<17} {}\n",
            result.component, result.status, result.message
        ));
    }

    let failed = summary
        .results
        .iter()
        .filter(|r| r.status.is_failure())
        .count();
    out.push('\n');
    out.push_str(&format!(
        "{} {} component(s) in namespace '{}' in {}s, {} failed or skipped\n",
        summary.operation,
        summary.results.len(),
        summary.namespace,
        summary.elapsed_seconds(),
        failed
    ));
    out
}

pub fn render_statuses(statuses: &[ComponentStatus]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:<10} {:<6} {}\n",
        "COMPONENT", "INSTALLED", "READY", "MESSAGE"
    ));
    out.push_str(&format!("{}\n", "-".repeat(60)));
    for status in statuses {
        out.push_str(&format!(
            "{:<16} {:<10} {:<6} {}\n",
            status.component,
            yes_no(status.installed),
            yes_no(status.ready),
            status.message
        ));
    }

    let ready = statuses.iter().filter(|s| s.ready).count();
    out.push('\n');
    out.push_str(&format!("{}/{} component(s) ready\n", ready, statuses.len()));
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Table => print!("{}", render_summary(summary)),
    }
    Ok(())
}

pub fn print_statuses(statuses: &[ComponentStatus], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(statuses)?),
        OutputFormat::Table => print!("{}", render_statuses(statuses)),
    }
    Ok(())
}
