//! `emptyrpm` / `lostpayload` (SPEC_FULL §11, grounded in
//! `lib/inspect_lostpayload.c`): a kept subpackage that lost all its files
//! (`emptyrpm`), or whose extracted payload came back empty despite the
//! header declaring files (`lostpayload`) -- distinct from `subpackages`,
//! which catches a subpackage disappearing entirely.

use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

/// Flags an after subpackage whose file count is zero where the before
/// counterpart had files.
pub fn run_emptyrpm(run: &mut Run) -> bool {
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        let had_before_files = !peer.before_files.is_empty();
        let has_after_header = peer.after_header.is_some();
        if had_before_files && has_after_header && peer.after_files.is_empty() {
            let mut severity = Severity::Bad;
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }
            run.results.add(ResultRecord::new(
                severity,
                "emptyrpm",
                format!("{} lost all of its files", peer.name()),
                Verb::Removed,
                format!("subpackage {}", peer.name()),
            ));
        }
    }

    passed
}

/// Flags an after subpackage whose header declares files but whose
/// extracted payload came back empty -- an acquisition-time anomaly rather
/// than a before/after regression, so it doesn't consult rebase.
pub fn run_lostpayload(run: &mut Run) -> bool {
    let mut passed = true;

    for peer in &run.peers {
        let header_expects_files = peer
            .after_header
            .as_ref()
            .map(|h| !h.is_source())
            .unwrap_or(false);
        if header_expects_files && peer.after_root.is_some() && peer.after_files.is_empty() {
            passed = false;
            run.results.add(ResultRecord::new(
                Severity::Bad,
                "lostpayload",
                format!("{} extracted with an empty payload", peer.name()),
                Verb::Failed,
                format!("subpackage {}", peer.name()),
            ));
        }
    }

    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::header::Header;
    use crate::package::file::{FileEntry, FileFlags, FileStat};
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

    fn file(localpath: &str) -> FileEntry {
        FileEntry::new(
            localpath.to_string(),
            PathBuf::from(format!("/tmp{localpath}")),
            FileStat { mode: 0o100644, size: 1 },
            "root".to_string(),
            "root".to_string(),
            None,
            FileFlags::empty(),
            None,
        )
    }

    #[test]
    fn subpackage_that_lost_all_files_fails_emptyrpm() {
        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![file("/usr/bin/foo")],
            after_files: vec![],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        assert!(!run_emptyrpm(&mut run));
        let record = run.results.iter().next().unwrap();
        assert_eq!(record.rendered_noun(), "subpackage foo");
    }

    #[test]
    fn payload_extracted_with_files_passes_lostpayload() {
        let peer = SubpackagePeer {
            before_header: None,
            after_header: Some(header("foo")),
            before_root: None,
            after_root: Some(PathBuf::from("/tmp/root")),
            before_files: vec![],
            after_files: vec![file("/usr/bin/foo")],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        assert!(run_lostpayload(&mut run));
    }

    #[test]
    fn empty_extraction_root_fails_lostpayload() {
        let peer = SubpackagePeer {
            before_header: None,
            after_header: Some(header("foo")),
            before_root: None,
            after_root: Some(PathBuf::from("/tmp/root")),
            before_files: vec![],
            after_files: vec![],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        assert!(!run_lostpayload(&mut run));
        let record = run.results.iter().next().unwrap();
        assert_eq!(record.rendered_noun(), "subpackage foo");
    }
}
