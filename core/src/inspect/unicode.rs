//! `unicode` (§4.10): scans text files in the after build for forbidden
//! code points (default: bidirectional-override characters used in
//! "Trojan Source" style attacks), skipping excluded MIME types and an
//! optional path-exclusion pattern.

use crate::results::{ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;

/// Used when `unicode.forbidden_codepoints` is left unconfigured.
const DEFAULT_FORBIDDEN: &[u32] = &[0x202A, 0x202B, 0x202C, 0x202D, 0x202E, 0x2066, 0x2067, 0x2068, 0x2069];

pub fn run(run: &mut Run) -> bool {
    let forbidden: Vec<u32> = if run.config.unicode.forbidden_codepoints.is_empty() {
        DEFAULT_FORBIDDEN.to_vec()
    } else {
        run.config.unicode.forbidden_codepoints.clone()
    };
    let excluded_mimes = run.config.unicode.excluded_mime_types.clone();
    let exclude_path = run.config.unicode.exclude.clone();
    let mut passed = true;

    for peer in &run.peers {
        // Only the source package's text is scanned (§4.10 `unicode`).
        if !peer.is_source() {
            continue;
        }
        for file in &peer.after_files {
            if !file.is_regular() {
                continue;
            }
            if let Some(pattern) = &exclude_path {
                if glob::Pattern::new(pattern)
                    .map(|p| p.matches(&file.localpath))
                    .unwrap_or(false)
                {
                    continue;
                }
            }
            let Ok(mime) = file.mime_type() else { continue };
            if !mime.starts_with("text/") || excluded_mimes.contains(&mime) {
                continue;
            }
            let Ok((bytes, _)) = crate::fsutil::read_file_bytes(&file.fullpath) else { continue };
            let text = String::from_utf8_lossy(&bytes);

            for (line_no, line) in text.lines().enumerate() {
                for (col_no, ch) in line.chars().enumerate() {
                    if !forbidden.contains(&(ch as u32)) {
                        continue;
                    }
                    passed = false;
                    run.results.add(
                        ResultRecord::new(
                            Severity::Bad,
                            "unicode",
                            format!(
                                "{} contains forbidden code point U+{:04X} at line {}, column {}",
                                file.localpath,
                                ch as u32,
                                line_no + 1,
                                col_no + 1,
                            ),
                            Verb::Failed,
                            "${FILE} has forbidden code points",
                        )
                        .with_file(file.localpath.clone())
                        .waivable(WaiverAuthority::Security),
                    );
                }
            }
        }
    }

    passed
}
