//! Formatting functions for UI output.
//!
//! `render_*` functions are pure and return the text to print; `display_*` functions
//! print styled status lines.

use std::fmt::Write as _;

use clap::ValueEnum;
use console::style;

use crate::boundary::BoundaryWarning;
use crate::error::Result;
use crate::report::{BumpResult, ReleaseReport, SubmoduleUpdate};

/// Number of recent tags shown per submodule in reports
pub const RECENT_TAGS_SHOWN: usize = 5;

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Nested human readable listing
    #[default]
    Cli,
    /// Pretty-printed JSON, readable by `relsync format`
    Json,
    /// Markdown table for pull request comments
    Comment,
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn recent_tags(update: &SubmoduleUpdate) -> String {
    update
        .recent_tags
        .iter()
        .take(RECENT_TAGS_SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn committed_line(committed: Option<bool>) -> Option<&'static str> {
    committed.map(|c| {
        if c {
            "Committed changes to this branch"
        } else {
            "No changes in this branch"
        }
    })
}

/// Render a report in the requested format
pub fn render_report(report: &ReleaseReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Comment => Ok(render_comment(report)),
        OutputFormat::Cli => Ok(render_cli(report)),
    }
}

fn parent_summary(report: &ReleaseReport) -> String {
    format!(
        "{} → {} (chart bump: {})",
        report.parent.current,
        report.parent.suggested,
        report
            .parent
            .chart_bump
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string())
    )
}

fn render_cli(report: &ReleaseReport) -> String {
    let mut out = String::from("Submodule updates (<git-tag> (<chart-version>)):\n");

    for (name, update) in &report.submodules {
        let _ = writeln!(out, "- {}:", name);
        let _ = writeln!(
            out,
            "    Current tag: {} ({})",
            update.current_tag,
            or_dash(update.current_tag_chart_version.as_deref())
        );
        let _ = writeln!(
            out,
            "    Suggested tag: {} ({})",
            or_dash(update.suggested_tag.as_deref()),
            or_dash(update.suggested_tag_chart_version.as_deref())
        );
        let _ = writeln!(
            out,
            "    Chart bump: {}",
            update.chart_bump.map(|b| b.as_str()).unwrap_or("-")
        );
        let _ = writeln!(out, "    Recent tags: {}", recent_tags(update));
    }

    let _ = write!(out, "Parent chart: {}", parent_summary(report));
    if let Some(line) = committed_line(report.committed_changes) {
        let _ = write!(out, "\n{}", line);
    }
    out
}

fn render_comment(report: &ReleaseReport) -> String {
    let mut lines = vec![
        "### Submodule updates".to_string(),
        "| Submodule | Current Tag | Suggested Tag | Current Chart | Suggested Chart | Chart Bump | Recent Tags |"
            .to_string(),
        "|-----------|-------------|---------------|---------------|-----------------|------------|-------------|"
            .to_string(),
    ];

    for (name, update) in &report.submodules {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} |",
            name,
            update.current_tag,
            or_dash(update.suggested_tag.as_deref()),
            or_dash(update.current_tag_chart_version.as_deref()),
            or_dash(update.suggested_tag_chart_version.as_deref()),
            update.chart_bump.map(|b| b.as_str()).unwrap_or("-"),
            recent_tags(update)
        ));
    }

    lines.push(String::new());
    lines.push(format!("**Parent chart:** {}", parent_summary(report)));
    if let Some(line) = committed_line(report.committed_changes) {
        lines.push(format!("**{}**", line));
    }
    lines.join("\n")
}

/// Render the outcome of `bump`; JSON is a single line for scripting
pub fn render_bump_result(result: &BumpResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Cli | OutputFormat::Comment => Ok(format!(
            "Repo version: {}\nChart version: {}\nNew tag: {}",
            result.app_version,
            or_dash(result.chart_version.as_deref()),
            or_dash(result.new_tag.as_deref())
        )),
    }
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Show the tags of a submodule before asking which one to check out.
///
/// Tags are numbered from 1, matching the manual index accepted by the prompt.
pub fn display_submodule_tags(name: &str, update: &SubmoduleUpdate) {
    println!("\n{}", style(format!("Processing submodule: {}", name)).bold());
    println!("  Current tag:   {}", update.current_tag);
    println!("  Latest tag:    {}", or_dash(update.latest_tag.as_deref()));
    println!("  Suggested tag: {}", or_dash(update.suggested_tag.as_deref()));
    println!("  Available tags:");
    for (i, tag) in update.recent_tags.iter().enumerate() {
        println!("   {:2}) {}", i + 1, tag);
    }
}
