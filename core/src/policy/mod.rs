//! Vendor policy data loader (§4.5): per-product-release data consulted by
//! specific inspections. Lazily loaded on first demand in a run; a missing
//! policy file is not an error -- the list is simply empty.

use crate::results::Severity;
use crate::strutil::StringList;
use crate::Result;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileinfoEntry {
    pub localpath: String,
    pub expected_mode: u32,
    pub expected_owner: String,
    pub expected_group: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapsEntry {
    pub package_glob: String,
    pub file_glob: String,
    pub expected_capability: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoliticsVerdict {
    Allow,
    Deny,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoliticsEntry {
    pub pattern_glob: String,
    /// `*` matches any content; otherwise an md5/sha1/sha224/sha256/
    /// sha384/sha512 hex digest, auto-detected by length.
    pub digest: String,
    pub verdict: PoliticsVerdict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecRuleType {
    Caps,
    Execstack,
    Relro,
    Fortifysource,
    Pic,
    Textrel,
    Setuid,
    Worldwritable,
    Securitypath,
    Modes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecAction {
    Inform,
    Verify,
    Fail,
}

impl SecAction {
    pub fn severity(&self) -> Severity {
        match self {
            SecAction::Inform => Severity::Info,
            SecAction::Verify => Severity::Verify,
            SecAction::Fail => Severity::Bad,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SecRule {
    pub package_name: String,
    pub version_glob: String,
    pub release_glob: String,
    pub rule_type: SecRuleType,
    pub action: SecAction,
}

/// Glob-matches `pattern` against `value`, with `*` meaning "any" the way
/// §4.5's security entry matching documents.
fn glob_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    glob::Pattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(pattern == value)
}

/// §4.5 security rule lookup: scans entries in order, matching on
/// `(package-name, version, release)` with glob support. Falls back to the
/// documented default action when nothing matches.
pub fn lookup_security_rule<'a>(
    rules: &'a [SecRule],
    rule_type: SecRuleType,
    package_name: &str,
    version: &str,
    release: &str,
) -> Option<&'a SecRule> {
    rules.iter().find(|r| {
        r.rule_type == rule_type
            && glob_matches(&r.package_name, package_name)
            && glob_matches(&r.version_glob, version)
            && glob_matches(&r.release_glob, release)
    })
}

/// The effective action when no explicit rule matches: `inform` for
/// informational checks, `verify` for hard security checks (§4.5).
pub fn default_action(is_hard_check: bool) -> SecAction {
    if is_hard_check {
        SecAction::Verify
    } else {
        SecAction::Inform
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LicenseEntry {
    pub fedora_abbrev: Option<String>,
    pub fedora_name: Option<String>,
    pub spdx_abbrev: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

/// Lines beginning with `#` or empty are skipped; each remaining line is
/// split on whitespace into `n` fields. A missing file yields an empty
/// vector rather than an error (§4.5).
fn read_line_oriented(path: &Path, fields: usize) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let lines = crate::fsutil::read_file_lines(path)?;
    let mut out = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        if parts.len() < fields {
            // A single DIAGNOSTIC-worthy malformed line (§7 policy-data
            // error); the entry is skipped rather than aborting the load.
            continue;
        }
        out.push(parts);
    }
    Ok(out)
}

pub fn load_fileinfo(vendor_data_dir: &Path, product_release: &str) -> Result<Vec<FileinfoEntry>> {
    let path = vendor_data_dir.join("fileinfo").join(product_release);
    Ok(read_line_oriented(&path, 4)?
        .into_iter()
        .filter_map(|f| {
            let mode = u32::from_str_radix(&f[0], 8).ok()?;
            Some(FileinfoEntry {
                expected_mode: mode,
                expected_owner: f[1].clone(),
                expected_group: f[2].clone(),
                localpath: f[3].clone(),
            })
        })
        .collect())
}

pub fn load_caps(vendor_data_dir: &Path, product_release: &str) -> Result<Vec<CapsEntry>> {
    let path = vendor_data_dir.join("capabilities").join(product_release);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let lines = crate::fsutil::read_file_lines(&path)?;
    let mut out = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        // `<package-glob> <file-glob> = <cap-text>`
        let Some((lhs, cap_text)) = trimmed.split_once('=') else {
            continue;
        };
        let lhs_parts: Vec<&str> = lhs.split_whitespace().collect();
        if lhs_parts.len() < 2 {
            continue;
        }
        out.push(CapsEntry {
            package_glob: lhs_parts[0].to_string(),
            file_glob: lhs_parts[1].to_string(),
            expected_capability: cap_text.trim().to_string(),
        });
    }
    Ok(out)
}

pub fn load_rebaseable(vendor_data_dir: &Path, product_release: &str) -> Result<StringList> {
    let path = vendor_data_dir.join("rebaseable").join(product_release);
    Ok(read_line_oriented(&path, 1)?
        .into_iter()
        .map(|f| f[0].clone())
        .collect())
}

pub fn load_politics(vendor_data_dir: &Path, product_release: &str) -> Result<Vec<PoliticsEntry>> {
    let path = vendor_data_dir.join("politics").join(product_release);
    Ok(read_line_oriented(&path, 3)?
        .into_iter()
        .filter_map(|f| {
            let verdict = match f[2].as_str() {
                "allow" => PoliticsVerdict::Allow,
                "deny" => PoliticsVerdict::Deny,
                _ => return None,
            };
            Some(PoliticsEntry {
                pattern_glob: f[0].clone(),
                digest: f[1].clone(),
                verdict,
            })
        })
        .collect())
}

/// Digest strings are accepted in md5/sha1/sha224/sha256/sha384/sha512
/// lengths and auto-detected (§4.10 `politics`).
pub fn detect_digest_algorithm(digest: &str) -> Option<&'static str> {
    match digest.len() {
        32 => Some("md5"),
        40 => Some("sha1"),
        56 => Some("sha224"),
        64 => Some("sha256"),
        96 => Some("sha384"),
        128 => Some("sha512"),
        _ => None,
    }
}

/// The **last** matching pattern wins (§4.10 `politics`).
pub fn politics_verdict(entries: &[PoliticsEntry], filepath: &str, digest: &str) -> Option<PoliticsVerdict> {
    entries
        .iter()
        .filter(|e| glob_matches(&e.pattern_glob, filepath) && (e.digest == "*" || e.digest == digest))
        .last()
        .map(|e| e.verdict)
}

pub fn load_security(vendor_data_dir: &Path, product_release: &str) -> Result<Vec<SecRule>> {
    let path = vendor_data_dir.join("security").join(product_release);
    Ok(read_line_oriented(&path, 5)?
        .into_iter()
        .filter_map(|f| {
            let rule_type = match f[3].as_str() {
                "caps" => SecRuleType::Caps,
                "execstack" => SecRuleType::Execstack,
                "relro" => SecRuleType::Relro,
                "fortifysource" => SecRuleType::Fortifysource,
                "pic" => SecRuleType::Pic,
                "textrel" => SecRuleType::Textrel,
                "setuid" => SecRuleType::Setuid,
                "worldwritable" => SecRuleType::Worldwritable,
                "securitypath" => SecRuleType::Securitypath,
                "modes" => SecRuleType::Modes,
                _ => return None,
            };
            let action = match f[4].as_str() {
                "inform" => SecAction::Inform,
                "verify" => SecAction::Verify,
                "fail" => SecAction::Fail,
                _ => return None,
            };
            Some(SecRule {
                package_name: f[0].clone(),
                version_glob: f[1].clone(),
                release_glob: f[2].clone(),
                rule_type,
                action,
            })
        })
        .collect())
}

/// `licenses/<name>` -- one JSON database per `licensedb` entry, mapping
/// license-name -> `{fedora_abbrev, fedora_name, spdx_abbrev, approved}`.
pub fn load_licensedb(vendor_data_dir: &Path, name: &str) -> Result<HashMap<String, LicenseEntry>> {
    let path = vendor_data_dir.join("licenses").join(name);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let text = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&text).unwrap_or_default())
}

pub fn load_icons(vendor_data_dir: &Path, product_release: &str) -> Result<StringList> {
    let path = vendor_data_dir.join("icons").join(product_release);
    Ok(read_line_oriented(&path, 1)?
        .into_iter()
        .map(|f| f[0].clone())
        .collect())
}

/// Holds the lazily-loaded policy tables for one `Run` (§3: "lazily-loaded
/// policy references"). Each table loads at most once; a missing vendor
/// data directory simply yields empty tables throughout.
#[derive(Default)]
pub struct PolicyTables {
    fileinfo: std::cell::OnceCell<Vec<FileinfoEntry>>,
    caps: std::cell::OnceCell<Vec<CapsEntry>>,
    rebaseable: std::cell::OnceCell<StringList>,
    politics: std::cell::OnceCell<Vec<PoliticsEntry>>,
    security: std::cell::OnceCell<Vec<SecRule>>,
    icons: std::cell::OnceCell<StringList>,
}

impl PolicyTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fileinfo(&self, vendor_data_dir: Option<&Path>, product_release: &str) -> &[FileinfoEntry] {
        self.fileinfo.get_or_init(|| {
            vendor_data_dir
                .and_then(|d| load_fileinfo(d, product_release).ok())
                .unwrap_or_default()
        })
    }

    pub fn caps(&self, vendor_data_dir: Option<&Path>, product_release: &str) -> &[CapsEntry] {
        self.caps.get_or_init(|| {
            vendor_data_dir
                .and_then(|d| load_caps(d, product_release).ok())
                .unwrap_or_default()
        })
    }

    pub fn rebaseable(&self, vendor_data_dir: Option<&Path>, product_release: &str) -> &StringList {
        self.rebaseable.get_or_init(|| {
            vendor_data_dir
                .and_then(|d| load_rebaseable(d, product_release).ok())
                .unwrap_or_default()
        })
    }

    pub fn politics(&self, vendor_data_dir: Option<&Path>, product_release: &str) -> &[PoliticsEntry] {
        self.politics.get_or_init(|| {
            vendor_data_dir
                .and_then(|d| load_politics(d, product_release).ok())
                .unwrap_or_default()
        })
    }

    pub fn security(&self, vendor_data_dir: Option<&Path>, product_release: &str) -> &[SecRule] {
        self.security.get_or_init(|| {
            vendor_data_dir
                .and_then(|d| load_security(d, product_release).ok())
                .unwrap_or_default()
        })
    }

    pub fn icons(&self, vendor_data_dir: Option<&Path>, product_release: &str) -> &StringList {
        self.icons.get_or_init(|| {
            vendor_data_dir
                .and_then(|d| load_icons(d, product_release).ok())
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_policy_file_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_fileinfo(dir.path(), "fc40").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn fileinfo_parses_mode_owner_group_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fileinfo")).unwrap();
        std::fs::write(
            dir.path().join("fileinfo/fc40"),
            "# comment\n0644 root root /usr/bin/foo\n\n0755 bin bin /usr/bin/bar\n",
        )
        .unwrap();
        let entries = load_fileinfo(dir.path(), "fc40").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].expected_mode, 0o644);
        assert_eq!(entries[0].localpath, "/usr/bin/foo");
    }

    #[test]
    fn politics_last_match_wins() {
        let entries = vec![
            PoliticsEntry {
                pattern_glob: "foo/*".to_string(),
                digest: "*".to_string(),
                verdict: PoliticsVerdict::Deny,
            },
            PoliticsEntry {
                pattern_glob: "foo/logo.png".to_string(),
                digest: "*".to_string(),
                verdict: PoliticsVerdict::Allow,
            },
        ];
        assert_eq!(
            politics_verdict(&entries, "foo/logo.png", "anything"),
            Some(PoliticsVerdict::Allow)
        );
        assert_eq!(
            politics_verdict(&entries, "foo/other.bin", "anything"),
            Some(PoliticsVerdict::Deny)
        );
    }

    #[test]
    fn security_rule_lookup_respects_globs() {
        let rules = vec![SecRule {
            package_name: "foo*".to_string(),
            version_glob: "*".to_string(),
            release_glob: "*".to_string(),
            rule_type: SecRuleType::Caps,
            action: SecAction::Fail,
        }];
        let found = lookup_security_rule(&rules, SecRuleType::Caps, "foo-extras", "1.0", "1.fc40");
        assert!(found.is_some());
        assert_eq!(found.unwrap().action.severity(), Severity::Bad);
    }

    #[test]
    fn policy_tables_load_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rebaseable")).unwrap();
        std::fs::write(dir.path().join("rebaseable/fc40"), "foo\nbar\n").unwrap();

        let tables = PolicyTables::new();
        let first = tables.rebaseable(Some(dir.path()), "fc40").clone();
        std::fs::write(dir.path().join("rebaseable/fc40"), "changed\n").unwrap();
        let second = tables.rebaseable(Some(dir.path()), "fc40").clone();
        assert_eq!(first.len(), second.len());
        assert!(second.contains("foo"));
    }

    #[test]
    fn digest_length_detection() {
        assert_eq!(detect_digest_algorithm(&"a".repeat(32)), Some("md5"));
        assert_eq!(detect_digest_algorithm(&"a".repeat(64)), Some("sha256"));
        assert_eq!(detect_digest_algorithm("short"), None);
    }
}
