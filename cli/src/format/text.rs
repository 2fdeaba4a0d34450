//! The default `text` formatter (§6): human-readable, grouped by
//! inspection header, with per-record severity, message, optional details
//! block, and remedy hint.

use super::visible;
use rpminspect_core::results::{Results, Severity};
use rpminspect_core::strutil::printwrap;
use rpminspect_core::Result;

use colored::Colorize;
use std::io::Write;

fn colorize(severity: Severity, text: &str) -> colored::ColoredString {
    match severity {
        Severity::Bad => text.red().bold(),
        Severity::Verify => text.yellow().bold(),
        Severity::Info => text.cyan(),
        Severity::Ok => text.green(),
        Severity::Skip | Severity::Diagnostic => text.normal(),
    }
}

pub fn render(results: &Results, suppress: Option<Severity>, writer: &mut dyn Write) -> Result<()> {
    let mut last_header: Option<&str> = None;

    for record in visible(results, suppress) {
        if last_header != Some(record.header.as_str()) {
            if last_header.is_some() {
                writeln!(writer)?;
            }
            writeln!(writer, "{}", record.header.to_uppercase())?;
            last_header = Some(record.header.as_str());
        }

        writeln!(
            writer,
            "  [{}] {}",
            colorize(record.severity, record.severity.as_str()),
            record.message
        )?;

        if let Some(details) = &record.details {
            writeln!(writer, "{}", printwrap(details, 78, 6))?;
        }
        if let Some(remedy) = &record.remedy {
            writeln!(writer, "      remedy: {remedy}")?;
        }
    }

    writeln!(writer, "\nworst severity: {}", results.worst_severity())?;
    Ok(())
}
