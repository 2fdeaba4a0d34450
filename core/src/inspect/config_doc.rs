//! `config` and `doc` (§4.10): flag-drift on matched file pairs -- a file
//! that gained or lost its `%config` or `%doc` packaging flag between
//! builds. Named `config_doc` to avoid colliding with [`crate::config`].

use crate::package::file::FileEntry;
use crate::peers::SubpackagePeer;
use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

pub fn run_config(run: &mut Run) -> bool {
    run_flag_drift(run, "config files", |f| f.is_config())
}

pub fn run_doc(run: &mut Run) -> bool {
    run_flag_drift(run, "doc files", |f| f.is_doc())
}

fn run_flag_drift(run: &mut Run, header: &'static str, flag: impl Fn(&FileEntry) -> bool) -> bool {
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        for after_file in &peer.after_files {
            let Some(p) = after_file.peer else { continue };
            let Some(before_file) = find_before(peer, p.index) else { continue };

            let before_flag = flag(before_file);
            let after_flag = flag(after_file);
            if before_flag == after_flag {
                continue;
            }

            let mut severity = Severity::Verify;
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let message = if after_flag {
                format!("{} gained the flag this build tracks", after_file.localpath)
            } else {
                format!("{} lost the flag this build tracks", after_file.localpath)
            };

            run.results.add(
                ResultRecord::new(severity, header, message, Verb::Changed, "${FILE} flag changed")
                    .with_file(after_file.localpath.clone()),
            );
        }
    }

    passed
}

fn find_before(peer: &SubpackagePeer, index: usize) -> Option<&FileEntry> {
    peer.before_files.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::header::Header;
    use crate::package::file::{FileFlags, FileStat, PeerRef};
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

    fn file(path: &str, flags: FileFlags) -> FileEntry {
        let mut f = FileEntry::new(
            path.to_string(),
            PathBuf::from(format!("/tmp{path}")),
            FileStat { mode: 0o100644, size: 10 },
            "root".to_string(),
            "root".to_string(),
            None,
            flags,
            None,
        );
        f.peer = Some(PeerRef { index: 0 });
        f
    }

    #[test]
    fn gaining_config_flag_is_reported() {
        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![file("/etc/foo.conf", FileFlags::empty())],
            after_files: vec![file("/etc/foo.conf", FileFlags::CONFIG)],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        let passed = run_config(&mut run);
        assert!(!passed);
        assert_eq!(run.results.len(), 1);
    }
}
