//! `dsodeps` (§4.10): DT_NEEDED drift on matched ELF shared-object pairs --
//! a dependency an after-build `.so` no longer declares, or newly declares,
//! relative to its before counterpart.

use crate::capability::elf;
use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        for after_file in &peer.after_files {
            let Some(p) = after_file.peer else { continue };
            let Some(before_file) = peer.before_files.get(p.index) else { continue };
            if !after_file.is_regular() || !before_file.is_regular() {
                continue;
            }

            let Ok(Some(elf::ElfKind::SharedLibrary)) = after_file.elf_kind() else { continue };
            let Ok(Some(after_info)) = elf::read(&after_file.fullpath) else { continue };
            let Ok(Some(before_info)) = elf::read(&before_file.fullpath) else { continue };

            let gained = set_difference(&after_info.needed, &before_info.needed);
            let lost = set_difference(&before_info.needed, &after_info.needed);
            if gained.is_empty() && lost.is_empty() {
                continue;
            }

            let mut severity = Severity::Verify;
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let mut message = format!("{} changed its shared library dependencies", after_file.localpath);
            if !gained.is_empty() {
                message.push_str(&format!(" (gained: {})", gained.join(", ")));
            }
            if !lost.is_empty() {
                message.push_str(&format!(" (lost: {})", lost.join(", ")));
            }

            run.results.add(
                ResultRecord::new(severity, "dsodeps", message, Verb::Changed, "${FILE} dependency drift")
                    .with_file(after_file.localpath.clone()),
            );
        }
    }

    passed
}

fn set_difference(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|x| !b.contains(x)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::header::Header;
    use crate::peers::SubpackagePeer;

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

    #[test]
    fn no_elf_files_is_a_no_op() {
        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        assert!(super::run(&mut run));
        assert!(run.results.is_empty());
    }
}
