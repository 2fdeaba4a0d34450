//! `specname` (SPEC_FULL §11): compares the source package's implied spec
//! file name against `specname.match`/`specname.primary`. Full spec-file
//! introspection (parsing the actual `.spec` out of the source RPM) is out
//! of scope; this driver works from the header fields already in hand,
//! which is enough to reproduce the convention check.

use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let match_mode = run.config.specname.match_mode.clone();
    let primary = run.config.specname.primary.clone();
    let mut passed = true;

    for peer in &run.peers {
        let after = match &peer.after_header {
            Some(h) if h.is_source() => h,
            _ => continue,
        };

        let primary_value = match primary.as_str() {
            "filename" => after.sourcerpm.clone().unwrap_or_else(|| format!("{}.src.rpm", after.name)),
            _ => after.name.clone(),
        };
        let expected_spec = format!("{}.spec", after.name);

        if !matches_convention(&primary_value, &expected_spec, &match_mode) {
            passed = false;
            run.results.add(ResultRecord::new(
                Severity::Verify,
                "specname",
                format!(
                    "expected spec file name '{expected_spec}' does not {match_mode}-match '{primary_value}'"
                ),
                Verb::Failed,
                format!("spec file name for {}", after.name),
            ));
        }
    }

    passed
}

fn matches_convention(primary_value: &str, expected_spec: &str, match_mode: &str) -> bool {
    let stem = expected_spec.trim_end_matches(".spec");
    match match_mode {
        "prefix" => primary_value.starts_with(stem),
        "suffix" => primary_value.ends_with(stem),
        _ => primary_value == stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::header::Header;
    use crate::peers::SubpackagePeer;

    fn header(name: &str, arch: &str) -> Header {
        Header {
            name: name.to_string(),
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

    #[test]
    fn matching_name_passes_full_match() {
        let peer = SubpackagePeer {
            before_header: None,
            after_header: Some(header("foo", "src")),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        assert!(super::run(&mut run));
    }

    #[test]
    fn binary_packages_are_skipped() {
        let peer = SubpackagePeer {
            before_header: None,
            after_header: Some(header("foo", "x86_64")),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        };
        let mut run = Run::test_instance(RunConfig::default(), vec![peer]);
        assert!(super::run(&mut run));
        assert!(run.results.is_empty());
    }

    #[test]
    fn mismatched_name_fails_with_a_descriptive_noun() {
        let mut cfg = RunConfig::default();
        cfg.specname.match_mode = "suffix".to_string();
        cfg.specname.primary = "filename".to_string();
        let mut after = header("foo", "src");
        after.sourcerpm = Some("other.src.rpm".to_string());
        let peer = SubpackagePeer {
            before_header: None,
            after_header: Some(after),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        };
        let mut run = Run::test_instance(cfg, vec![peer]);
        assert!(!super::run(&mut run));
        let record = run.results.iter().next().unwrap();
        assert_eq!(record.rendered_noun(), "spec file name for foo");
    }
}
