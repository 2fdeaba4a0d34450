//! `arch` (SPEC_FULL §11, grounded in `lib/inspect_arch.c`): the set
//! difference of architectures between before and after, parallel to
//! `subpackages` but at the architecture level rather than the package
//! level (`REMEDY_ARCH_LOST` / `REMEDY_ARCH_GAIN`).

use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;
use crate::strutil::StringList;

pub fn run(run: &mut Run) -> bool {
    let rebase = run.is_rebase();
    let mut passed = true;

    let mut before_arches = StringList::new();
    let mut after_arches = StringList::new();
    for peer in &run.peers {
        if let Some(h) = &peer.before_header {
            if !h.is_source() {
                before_arches.add_if_absent(h.arch.clone());
            }
        }
        if let Some(h) = &peer.after_header {
            if !h.is_source() {
                after_arches.add_if_absent(h.arch.clone());
            }
        }
    }

    for lost in before_arches.difference(&after_arches).iter() {
        let mut severity = Severity::Verify;
        if rebase {
            severity = severity.downgrade_for_rebase();
        }
        if severity >= Severity::Verify {
            passed = false;
        }
        run.results.add(
            ResultRecord::new(
                severity,
                "arch",
                format!("architecture {lost} present in before is missing from after"),
                Verb::Removed,
                "${ARCH}",
            )
            .with_arch(lost.clone())
            .with_remedy("REMEDY_ARCH_LOST"),
        );
    }

    for gained in after_arches.difference(&before_arches).iter() {
        let mut severity = Severity::Info;
        if rebase {
            severity = severity.downgrade_for_rebase();
        }
        run.results.add(
            ResultRecord::new(
                severity,
                "arch",
                format!("architecture {gained} is new in after"),
                Verb::Added,
                "${ARCH}",
            )
            .with_arch(gained.clone())
            .with_remedy("REMEDY_ARCH_GAIN"),
        );
    }

    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::header::Header;
    use crate::peers::SubpackagePeer;

    fn header(arch: &str) -> Header {
        Header {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            release: "1.fc40".to_string(),
            epoch: None,
            arch: arch.to_string(),
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

    fn peer(before_arch: Option<&str>, after_arch: Option<&str>) -> SubpackagePeer {
        SubpackagePeer {
            before_header: before_arch.map(header),
            after_header: after_arch.map(header),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        }
    }

    #[test]
    fn lost_architecture_without_rebase_fails() {
        let mut cfg = RunConfig::default();
        cfg.rebase_detection = false;
        let mut run = Run::test_instance(cfg, vec![peer(Some("s390x"), Some("x86_64"))]);
        assert!(!super::run(&mut run));
        assert_eq!(run.results.worst_severity(), Severity::Verify);
    }

    #[test]
    fn gained_architecture_is_informational() {
        let mut cfg = RunConfig::default();
        cfg.rebase_detection = false;
        let mut run = Run::test_instance(
            cfg,
            vec![SubpackagePeer {
                before_header: Some(header("x86_64")),
                after_header: Some(header("x86_64")),
                before_root: None,
                after_root: None,
                before_files: vec![],
                after_files: vec![],
            }],
        );
        // same peer contributes "x86_64" to both sides; add a second peer
        // that only exists after, on a new arch.
        run.peers.push(peer(None, Some("aarch64")));
        assert!(super::run(&mut run));
        assert_eq!(run.results.worst_severity(), Severity::Info);
    }
}
