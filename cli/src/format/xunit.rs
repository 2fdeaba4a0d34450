//! The `xunit` formatter (§6): a `<testsuite>` with one `<testcase
//! name="/<header>" classname="rpminspect">` per inspection; failing
//! records become nested `<failure>` elements; the full message is
//! embedded as a `<system-out>` CDATA block, XML-escaped per §4.1.

use super::visible;
use rpminspect_core::results::{Results, Severity};
use rpminspect_core::strutil::xmlescape;
use rpminspect_core::Result;

use std::collections::BTreeMap;
use std::io::Write;

pub fn render(results: &Results, suppress: Option<Severity>, writer: &mut dyn Write) -> Result<()> {
    let mut by_header: BTreeMap<&str, Vec<&rpminspect_core::results::ResultRecord>> = BTreeMap::new();
    for record in visible(results, suppress) {
        by_header.entry(record.header.as_str()).or_default().push(record);
    }

    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<testsuite name="rpminspect" tests="{}">"#,
        by_header.len()
    )?;

    for (header, records) in &by_header {
        writeln!(
            writer,
            r#"  <testcase name="/{}" classname="rpminspect">"#,
            xmlescape(header)
        )?;

        for record in records {
            if record.severity >= Severity::Verify {
                writeln!(
                    writer,
                    r#"    <failure message="{}" type="{}"/>"#,
                    xmlescape(&record.message),
                    record.severity.as_str()
                )?;
            }
        }

        let system_out: String = records
            .iter()
            .map(|r| format!("[{}] {}", r.severity.as_str(), r.message))
            .collect::<Vec<_>>()
            .join("\n");
        writeln!(writer, "    <system-out><![CDATA[{system_out}]]></system-out>")?;
        writeln!(writer, "  </testcase>")?;
    }

    writeln!(writer, "</testsuite>")?;
    Ok(())
}
