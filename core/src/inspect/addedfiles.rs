//! `addedfiles` (§4.10): files present in the after build with no before
//! counterpart, flagged harder when they land under a forbidden location.

use crate::results::{escalate_for_security_path, ResultRecord, Severity, Verb};
use crate::run::Run;
use crate::strutil::{is_debug_path, is_egg_info_path, matches_any_glob};

pub fn run(run: &mut Run) -> bool {
    let ignore = run.config.ignore.clone();
    let security_prefixes = run.config.security_path_prefix.clone();
    let forbidden_prefixes = run.config.addedfiles.forbidden_path_prefixes.clone();
    let forbidden_suffixes = run.config.addedfiles.forbidden_path_suffixes.clone();
    let forbidden_dirs = run.config.addedfiles.forbidden_directories.clone();
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        for file in &peer.after_files {
            if file.peer.is_some() || file.moved_subpackage {
                continue;
            }
            if matches_any_glob(&file.localpath, &ignore)
                || is_debug_path(&file.localpath)
                || is_egg_info_path(&file.localpath)
            {
                continue;
            }

            let forbidden = forbidden_prefixes.iter().any(|p| file.localpath.starts_with(p.as_str()))
                || forbidden_suffixes.iter().any(|s| file.localpath.ends_with(s.as_str()))
                || forbidden_dirs.iter().any(|d| file.localpath.starts_with(d.as_str()));

            let mut severity = if forbidden { Severity::Bad } else { Severity::Info };
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let record = ResultRecord::new(
                severity,
                "added files",
                format!("{} is a new file introduced by this build", file.localpath),
                Verb::Added,
                "${FILE} added",
            )
            .with_file(file.localpath.clone());
            let record = escalate_for_security_path(record, &file.localpath, &security_prefixes);
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

    fn dummy_run(peers: Vec<SubpackagePeer>) -> Run {
        Run::test_instance(RunConfig::default(), peers)
    }

    #[test]
    fn new_file_is_reported_as_added() {
        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![file("/usr/bin/new")],
        };
        let mut run = dummy_run(vec![peer]);
        let passed = super::run(&mut run);
        assert!(passed);
        assert_eq!(run.results.len(), 1);
    }

    #[test]
    fn debuginfo_and_egg_info_paths_are_never_reported() {
        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![
                file("/usr/lib/debug/usr/bin/foo.debug"),
                file("/usr/lib/.build-id/ab/cdef1234"),
                file("/usr/lib/python3/site-packages/foo-1.0.egg-info/PKG-INFO"),
            ],
        };
        let mut run = dummy_run(vec![peer]);
        super::run(&mut run);
        assert_eq!(run.results.len(), 0);
    }
}
