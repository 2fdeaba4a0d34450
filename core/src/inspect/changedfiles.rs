//! `changedfiles` (§4.10): matched file pairs whose content, not just their
//! metadata, differs between builds, with a unified diff attached for text
//! files (§3 `capability::diff`).

use crate::results::{escalate_for_security_path, ResultRecord, Severity, Verb};
use crate::run::Run;
use crate::strutil::{is_debug_path, matches_any_glob};

/// CPython's `.pyc`/`.pyo` magic is the first two bytes of the file,
/// followed by `\r\n` -- bytecode files are always skipped regardless of
/// content drift (§4.10 `changedfiles`).
fn is_python_bytecode(localpath: &str, bytes: &[u8]) -> bool {
    (localpath.ends_with(".pyc") || localpath.ends_with(".pyo"))
        && bytes.len() >= 4
        && bytes[2] == b'\r'
        && bytes[3] == b'\n'
}

pub fn run(run: &mut Run) -> bool {
    let ignore = run.config.ignore.clone();
    let security_prefixes = run.config.security_path_prefix.clone();
    let header_exts = run.config.changedfiles.header_file_extensions.clone();
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        for after_file in &peer.after_files {
            let Some(p) = after_file.peer else { continue };
            let Some(before_file) = peer.before_files.get(p.index) else { continue };
            if !after_file.is_regular() || !before_file.is_regular() {
                continue;
            }
            if matches_any_glob(&after_file.localpath, &ignore) || is_debug_path(&after_file.localpath) {
                continue;
            }
            if let Ok((after_bytes, _)) = crate::fsutil::read_file_bytes(&after_file.fullpath) {
                if is_python_bytecode(&after_file.localpath, &after_bytes) {
                    continue;
                }
            }

            let (before_sum, after_sum) = match (before_file.checksum(), after_file.checksum()) {
                (Ok(b), Ok(a)) => (b, a),
                _ => continue,
            };
            if before_sum == after_sum {
                continue;
            }

            let is_header = header_exts
                .iter()
                .any(|ext| after_file.localpath.ends_with(ext.as_str()));
            // A changed non-header data file is INFO at baseline, matching
            // §4.10's own wording ("Otherwise, compare message digests; if
            // different, emit INFO") and the original's
            // `lib/inspect_changedfiles.c` `RESULT_INFO` default. Scenario
            // S2's literal text calls for VERIFY with rebase disabled on
            // this same case, which is a documented self-contradiction in
            // the source material; this driver follows the explicit prose
            // rule rather than the scenario's expected-output table.
            let mut severity = if is_header { Severity::Verify } else { Severity::Info };
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let mut record = ResultRecord::new(
                severity,
                "changed files",
                format!("{} changed content between builds", after_file.localpath),
                Verb::Changed,
                "${FILE} changed",
            )
            .with_file(after_file.localpath.clone());

            let is_text = before_file
                .mime_type()
                .map(|m| m.starts_with("text/"))
                .unwrap_or(false);
            if is_text {
                if let (Ok((before_bytes, _)), Ok((after_bytes, _))) = (
                    crate::fsutil::read_file_bytes(&before_file.fullpath),
                    crate::fsutil::read_file_bytes(&after_file.fullpath),
                ) {
                    let before_text = String::from_utf8_lossy(&before_bytes);
                    let after_text = String::from_utf8_lossy(&after_bytes);
                    if let Some(diff) = crate::capability::diff::unified(
                        &before_text,
                        &after_text,
                        "before",
                        "after",
                    ) {
                        record = record.with_details(diff);
                    }
                }
            }

            let record = escalate_for_security_path(record, &after_file.localpath, &security_prefixes);
            run.results.add(record);
        }
    }

    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::header::Header;
    use crate::package::file::{FileEntry, FileFlags, FileStat, PeerRef};
    use crate::peers::SubpackagePeer;
    use std::path::PathBuf;

    fn header(name: &str) -> Header {
        Header {
            name: name.to_string(),
            version: "1.0".to_string(),
            release: "1.fc40".to_string(),
            epoch: None,
            arch: "x86_64".to_string(),
            license: "MIT".to_string(),
            summary: String::new(),
            description: String::new(),
            vendor: None,
            buildhost: None,
            sourcerpm: None,
            changelog: vec![],
            requires: Default::default(),
            provides: Default::default(),
            conflicts: Default::default(),
            obsoletes: Default::default(),
            enhances: Default::default(),
            recommends: Default::default(),
            suggests: Default::default(),
            supplements: Default::default(),
        }
    }

    fn file_at(dir: &std::path::Path, name: &str, contents: &str) -> FileEntry {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        let mut f = FileEntry::new(
            format!("/usr/share/{name}"),
            path,
            FileStat { mode: 0o100644, size: contents.len() as u64 },
            "root".to_string(),
            "root".to_string(),
            None,
            FileFlags::empty(),
            None,
        );
        f.peer = Some(PeerRef { index: 0 });
        f
    }

    #[test]
    fn changed_content_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let before = file_at(dir.path(), "before.txt", "hello\n");
        let after = file_at(dir.path(), "after.txt", "goodbye\n");

        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![before],
            after_files: vec![after],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        super::run(&mut run);
        assert_eq!(run.results.len(), 1);
    }

    #[test]
    fn python_bytecode_is_always_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut before = file_at(dir.path(), "before.pyc", "\x55\x0d\x0d\x0apayload-one");
        before.localpath = "/usr/lib/python3/foo.pyc".to_string();
        let mut after = file_at(dir.path(), "after.pyc", "\x55\x0d\x0d\x0apayload-two");
        after.localpath = "/usr/lib/python3/foo.pyc".to_string();
        after.peer = Some(PeerRef { index: 0 });

        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![before],
            after_files: vec![after],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        super::run(&mut run);
        assert_eq!(run.results.len(), 0);
    }
}
