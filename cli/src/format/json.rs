//! The `json` formatter (§6): one array of result objects, keyed by the
//! `ResultRecord` field names.

use super::visible;
use rpminspect_core::results::{Results, Severity};
use rpminspect_core::Result;

use serde_json::{json, Value};
use std::io::Write;

pub fn render(results: &Results, suppress: Option<Severity>, writer: &mut dyn Write) -> Result<()> {
    let records: Vec<Value> = visible(results, suppress)
        .map(|r| {
            json!({
                "severity": r.severity.as_str(),
                "waiver_authority": waiver_str(r.waiver_authority),
                "header": r.header,
                "message": r.message,
                "details": r.details,
                "remedy": r.remedy,
                "verb": r.verb.as_str(),
                "noun": r.rendered_noun(),
                "arch": r.arch,
                "file": r.file,
            })
        })
        .collect();

    let doc = json!({
        "results": records,
        "worst_severity": results.worst_severity().as_str(),
    });

    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)?;
    Ok(())
}

fn waiver_str(authority: rpminspect_core::results::WaiverAuthority) -> &'static str {
    use rpminspect_core::results::WaiverAuthority::*;
    match authority {
        NotWaivable => "not-waivable",
        Anyone => "anyone",
        Security => "security",
    }
}
