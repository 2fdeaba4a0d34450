//! Output formatters (§6 "Output formats"): render a `Results` stream to
//! one of `text` (default), `json`, `xunit`, or the deprecated `summary`.
//! Only the data the core hands over (§1 Non-goals: "the output formatters
//! ... only the data they hand the core is specified") is rendered here --
//! these are the CLI's own, not part of the core crate.

mod json;
mod summary;
mod text;
mod xunit;

use crate::opts::OutputFormat;
use rpminspect_core::results::{Results, Severity};
use rpminspect_core::Result;

use std::io::Write;

/// Renders `results` in `format` to `writer`, honoring `suppress` (hide
/// records strictly below this severity; `None` shows everything).
pub fn render(
    format: OutputFormat,
    results: &Results,
    suppress: Option<Severity>,
    writer: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Text => text::render(results, suppress, writer),
        OutputFormat::Json => json::render(results, suppress, writer),
        OutputFormat::Xunit => xunit::render(results, suppress, writer),
        OutputFormat::Summary => summary::render(results, suppress, writer),
    }
}

/// Lists the closed inspection vocabulary and the four output formats for
/// `-l` (§6).
pub fn list_inspections_and_formats(writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "Inspections:")?;
    for entry in rpminspect_core::inspect::registry() {
        writeln!(writer, "  {:<16} {}", entry.name, entry.description)?;
    }
    writeln!(writer)?;
    writeln!(writer, "Output formats:")?;
    for fmt in ["text", "json", "xunit", "summary (deprecated)"] {
        writeln!(writer, "  {fmt}")?;
    }
    Ok(())
}

fn visible<'a>(
    results: &'a Results,
    suppress: Option<Severity>,
) -> impl Iterator<Item = &'a rpminspect_core::results::ResultRecord> {
    results
        .iter()
        .filter(move |r| suppress.map(|s| r.severity >= s).unwrap_or(true))
}
