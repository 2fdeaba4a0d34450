//! `movedfiles` (§4.10): files the peer matcher linked via a rename/move
//! heuristic rather than an exact localpath match, reported once per move
//! from the after side so each relocation is noted exactly once.

use crate::results::{ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let rebase = run.is_rebase();
    let security_prefixes = run.config.security_path_prefix.clone();
    let mut passed = true;

    for peer in &run.peers {
        for file in &peer.after_files {
            if !file.moved_path && !file.moved_subpackage {
                continue;
            }

            let before_path = file
                .peer
                .and_then(|p| peer.before_files.get(p.index))
                .map(|b| b.localpath.clone());

            let message = match (&before_path, file.moved_subpackage) {
                (Some(before), false) => format!("{before} moved to {}", file.localpath),
                (Some(before), true) => format!("{before} moved to {} in a different subpackage", file.localpath),
                (None, _) => format!("{} moved here from another subpackage", file.localpath),
            };

            let under_security_path = security_prefixes
                .iter()
                .any(|prefix| file.localpath.starts_with(prefix.as_str()));

            let mut severity = if under_security_path {
                Severity::Bad
            } else if rebase {
                Severity::Info
            } else {
                Severity::Verify
            };
            if rebase && !under_security_path {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let mut record =
                ResultRecord::new(severity, "moved files", message, Verb::Changed, "${FILE} moved")
                    .with_file(file.localpath.clone());
            if under_security_path {
                record = record.waivable(WaiverAuthority::Security);
            }
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

    fn file(path: &str) -> FileEntry {
        FileEntry::new(
            path.to_string(),
            PathBuf::from(format!("/tmp{path}")),
            FileStat { mode: 0o100644, size: 10 },
            "root".to_string(),
            "root".to_string(),
            None,
            FileFlags::empty(),
            None,
        )
    }

    #[test]
    fn moved_within_peer_reports_both_paths() {
        let mut before = file("/usr/bin/old");
        let mut after = file("/usr/bin/new");
        before.peer = Some(PeerRef { index: 0 });
        after.peer = Some(PeerRef { index: 0 });
        after.moved_path = true;

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
}
