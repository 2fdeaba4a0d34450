//! `capabilities` (§4.10): file capability drift between matched files plus
//! vendor policy enforcement (§4.5 `caps` table and `securitypath`-style
//! `caps` security rule).

use crate::capability::caps;
use crate::policy::{lookup_security_rule, SecRuleType};
use crate::results::{ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let vendor_dir = run.config.vendor.vendor_data_dir.clone();
    let product_release = run.product_release.clone();
    let mut passed = true;

    for peer in &run.peers {
        let (name, version, release) = match &peer.after_header {
            Some(h) => (h.name.clone(), h.version.clone(), h.release.clone()),
            None => continue,
        };

        for after_file in &peer.after_files {
            let before_text = after_file
                .peer
                .and_then(|p| peer.before_files.get(p.index))
                .and_then(|b| b.capabilities.clone());
            let after_text = after_file.capabilities.clone();

            let is_equivalent = match (&before_text, &after_text) {
                (None, None) => true,
                (Some(b), Some(a)) => caps::equivalent(b, a),
                _ => false,
            };
            if is_equivalent {
                continue;
            }

            let caps_entries = vendor_dir
                .as_deref()
                .map(|dir| run.policy().caps(Some(dir), &product_release))
                .unwrap_or(&[]);
            let expected = caps_entries.iter().find(|e| {
                glob_match(&e.package_glob, &name) && glob_match(&e.file_glob, &after_file.localpath)
            });

            let policy_allows = expected
                .map(|e| {
                    after_text
                        .as_deref()
                        .map(|a| caps::equivalent(a, &e.expected_capability))
                        .unwrap_or(false)
                })
                .unwrap_or(false);

            let rule = vendor_dir.as_deref().and_then(|dir| {
                lookup_security_rule(
                    run.policy().security(Some(dir), &product_release),
                    SecRuleType::Caps,
                    &name,
                    &version,
                    &release,
                )
            });
            let severity = if policy_allows {
                Severity::Info
            } else {
                rule.map(|r| r.action.severity())
                    .unwrap_or(crate::policy::default_action(true).severity())
            };
            if severity >= Severity::Verify {
                passed = false;
            }

            run.results.add(
                ResultRecord::new(
                    severity,
                    "capabilities",
                    format!(
                        "{} capability set changed from '{}' to '{}'",
                        after_file.localpath,
                        before_text.as_deref().unwrap_or("(none)"),
                        after_text.as_deref().unwrap_or("(none)")
                    ),
                    Verb::Changed,
                    "${FILE} capabilities changed",
                )
                .with_file(after_file.localpath.clone())
                .waivable(WaiverAuthority::Security),
            );
        }
    }

    passed
}

fn glob_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    glob::Pattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(pattern == value)
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

    fn file(path: &str, caps: Option<&str>) -> FileEntry {
        let mut f = FileEntry::new(
            path.to_string(),
            PathBuf::from(format!("/tmp{path}")),
            FileStat { mode: 0o100755, size: 10 },
            "root".to_string(),
            "root".to_string(),
            None,
            FileFlags::empty(),
            caps.map(str::to_string),
        );
        f.peer = Some(PeerRef { index: 0 });
        f
    }

    #[test]
    fn newly_granted_capability_without_policy_is_bad() {
        let peer = SubpackagePeer {
            before_header: Some(header("foo")),
            after_header: Some(header("foo")),
            before_root: None,
            after_root: None,
            before_files: vec![file("/usr/bin/foo", None)],
            after_files: vec![file("/usr/bin/foo", Some("cap_net_raw+ep"))],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        let passed = super::run(&mut run);
        assert!(!passed);
        assert_eq!(run.results.worst_severity(), Severity::Verify);
    }
}
