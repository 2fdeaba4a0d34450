//! The deprecated `summary` formatter (§6, §9 open question: kept for
//! existing consumers, new ones should use `text`/`json`): one line per
//! non-DIAGNOSTIC record, `<verb> <noun> (<inspection>)`.

use super::visible;
use rpminspect_core::results::{Results, Severity, Verb};
use rpminspect_core::Result;

use std::io::Write;

pub fn render(results: &Results, suppress: Option<Severity>, writer: &mut dyn Write) -> Result<()> {
    for record in visible(results, suppress) {
        if record.severity == Severity::Diagnostic {
            continue;
        }
        writeln!(
            writer,
            "{} {} ({})",
            verb_str(record.verb),
            record.rendered_noun(),
            record.header
        )?;
    }
    Ok(())
}

fn verb_str(verb: Verb) -> &'static str {
    verb.as_str()
}
