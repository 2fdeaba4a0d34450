//! `debuginfo` (§4.10): an after-build ELF executable/shared-object that
//! carried debug sections before but lost them, or vice versa.

use crate::capability::elf::{self, has_any_section};
use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

const DEFAULT_DEBUG_SECTIONS: &[&str] = &[".debug_info", ".debug_line", ".debug_abbrev"];

pub fn run(run: &mut Run) -> bool {
    let configured = run.config.debuginfo.debuginfo_sections.clone();
    let sections: Vec<&str> = if configured.is_empty() {
        DEFAULT_DEBUG_SECTIONS.to_vec()
    } else {
        configured.iter().map(|s| s.as_str()).collect()
    };
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        for after_file in &peer.after_files {
            let Some(p) = after_file.peer else { continue };
            let Some(before_file) = peer.before_files.get(p.index) else { continue };
            if !after_file.is_regular() || !before_file.is_regular() {
                continue;
            }

            let Ok(Some(after_info)) = elf::read(&after_file.fullpath) else { continue };
            let Ok(Some(before_info)) = elf::read(&before_file.fullpath) else { continue };

            let had_debug = has_any_section(&before_info, &sections);
            let has_debug = has_any_section(&after_info, &sections);
            if had_debug == has_debug {
                continue;
            }

            let mut severity = Severity::Verify;
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let message = if has_debug {
                format!("{} gained debugging information", after_file.localpath)
            } else {
                format!("{} lost its debugging information", after_file.localpath)
            };

            run.results.add(
                ResultRecord::new(severity, "debuginfo", message, Verb::Changed, "${FILE} debuginfo changed")
                    .with_file(after_file.localpath.clone()),
            );
        }
    }

    passed
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
    fn no_elf_pairs_is_a_no_op() {
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
    }
}
