//! `runpath` (§4.10): validates `DT_RPATH`/`DT_RUNPATH` entries on every
//! ELF file in the after build against the configured allow-list, treating
//! `$ORIGIN`-relative entries specially (§4.5 security rule `securitypath`).

use crate::capability::elf;
use crate::policy::{lookup_security_rule, SecAction, SecRuleType};
use crate::results::{ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let allowed_paths = run.config.runpath.allowed_paths.clone();
    let allowed_origin_paths = run.config.runpath.allowed_origin_paths.clone();
    let origin_trim = run.config.runpath.origin_prefix_trim.clone();
    let vendor_dir = run.config.vendor.vendor_data_dir.clone();
    let product_release = run.product_release.clone();
    let mut passed = true;

    for peer in &run.peers {
        let (name, version, release) = match &peer.after_header {
            Some(h) => (h.name.clone(), h.version.clone(), h.release.clone()),
            None => continue,
        };

        for file in &peer.after_files {
            if !file.is_regular() {
                continue;
            }
            let Ok(Some(info)) = elf::read(&file.fullpath) else { continue };

            // Having both tags at all is a hard, not-waivable BAD regardless
            // of what either one contains (§4.10 `runpath`, scenario S4).
            if info.rpath.is_some() && info.runpath.is_some() {
                passed = false;
                run.results.add(
                    ResultRecord::new(
                        Severity::Bad,
                        "runpath",
                        format!("both DT_RPATH and DT_RUNPATH in {}", file.localpath),
                        Verb::Failed,
                        "both DT_RPATH and DT_RUNPATH in ${FILE}",
                    )
                    .with_file(file.localpath.clone())
                    .waivable(WaiverAuthority::NotWaivable),
                );
            }

            let entries: Vec<&str> = [info.rpath.as_deref(), info.runpath.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if entries.is_empty() {
                continue;
            }

            for entry in entries {
                for path in entry.split(':') {
                    if path.is_empty() {
                        continue;
                    }
                    let is_origin = path.starts_with("$ORIGIN");
                    let ok = if is_origin {
                        let remainder = path
                            .strip_prefix("$ORIGIN")
                            .unwrap_or(path)
                            .trim_start_matches('/');
                        if remainder.is_empty() {
                            // "$ORIGIN" alone is always allowed.
                            true
                        } else {
                            let trimmed = origin_trim
                                .iter()
                                .find_map(|pattern| {
                                    regex::Regex::new(pattern)
                                        .ok()
                                        .and_then(|re| re.find(remainder))
                                        .map(|m| &remainder[m.end()..])
                                })
                                .unwrap_or(remainder);
                            allowed_origin_paths.contains(trimmed) || allowed_origin_paths.contains(remainder)
                        }
                    } else {
                        allowed_paths.contains(path)
                    };
                    if ok {
                        continue;
                    }

                    let rule = vendor_dir.as_deref().and_then(|dir| {
                        lookup_security_rule(
                            run.policy().security(Some(dir), &product_release),
                            SecRuleType::Securitypath,
                            &name,
                            &version,
                            &release,
                        )
                    });
                    let action = rule.map(|r| r.action).unwrap_or(crate::policy::default_action(true));
                    let severity = action.severity();
                    if severity >= Severity::Verify {
                        passed = false;
                    }

                    run.results.add(
                        ResultRecord::new(
                            severity,
                            "runpath",
                            format!("{} has an unapproved runpath entry '{path}'", file.localpath),
                            Verb::Failed,
                            "${FILE} runpath",
                        )
                        .with_file(file.localpath.clone())
                        .waivable(if matches!(action, SecAction::Fail) {
                            WaiverAuthority::Security
                        } else {
                            WaiverAuthority::Anyone
                        }),
                    );
                }
            }
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
    fn no_files_is_a_no_op() {
        let peer = SubpackagePeer {
            before_header: None,
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
