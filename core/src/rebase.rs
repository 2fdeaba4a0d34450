//! The rebase detector (§4.8): a cached predicate answering whether the
//! after build is a "rebase" of the before build for severity-downgrade
//! purposes.

use crate::peers::SubpackagePeer;
use crate::strutil::StringList;

/// `true` iff `rebase_detection` is enabled and either (a) a peer exists
/// with both sides present, the same name, and differing version strings,
/// or (b) the after side's primary package is on the rebaseable policy
/// list, or (c) there is no before package at all for the primary package
/// (SPEC_FULL §11: fetch-only/single-build mode is always a rebase for
/// severity-downgrade purposes).
pub fn is_rebase(
    rebase_detection_enabled: bool,
    peers: &[SubpackagePeer],
    rebaseable: &StringList,
    primary_name: Option<&str>,
) -> bool {
    if !rebase_detection_enabled {
        return false;
    }

    let primary_has_before = match primary_name {
        Some(name) => peers
            .iter()
            .any(|p| p.name() == name && p.before_header.is_some()),
        None => peers.iter().any(|p| p.before_header.is_some()),
    };
    if !primary_has_before {
        return true;
    }

    let version_changed = peers.iter().any(|p| match (&p.before_header, &p.after_header) {
        (Some(b), Some(a)) => b.name == a.name && b.version != a.version,
        _ => false,
    });
    if version_changed {
        return true;
    }

    if let Some(name) = primary_name {
        if rebaseable.contains(name) {
            return true;
        }
    }

    false
}

/// Caches the result of a single `is_rebase` evaluation for the lifetime of
/// a `Run` (§3 `rebase_cache`, tri-state unknown/yes/no).
#[derive(Default)]
pub struct RebaseCache(std::cell::Cell<Option<bool>>);

impl RebaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&self, compute: impl FnOnce() -> bool) -> bool {
        if let Some(cached) = self.0.get() {
            return cached;
        }
        let value = compute();
        self.0.set(Some(value));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;

    fn header(name: &str, version: &str) -> Header {
        Header {
            name: name.to_string(),
            version: version.to_string(),
            release: "1".to_string(),
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

    fn peer(before_version: &str, after_version: &str) -> SubpackagePeer {
        SubpackagePeer {
            before_header: Some(header("foo", before_version)),
            after_header: Some(header("foo", after_version)),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        }
    }

    #[test]
    fn version_change_is_a_rebase() {
        let peers = vec![peer("1.0", "2.0")];
        assert!(is_rebase(true, &peers, &StringList::new(), Some("foo")));
    }

    #[test]
    fn identical_version_is_not_a_rebase() {
        let peers = vec![peer("1.0", "1.0")];
        assert!(!is_rebase(true, &peers, &StringList::new(), Some("foo")));
    }

    #[test]
    fn disabled_detection_is_never_a_rebase() {
        let peers = vec![peer("1.0", "2.0")];
        assert!(!is_rebase(false, &peers, &StringList::new(), Some("foo")));
    }

    #[test]
    fn rebaseable_list_forces_rebase_even_with_same_version() {
        let peers = vec![peer("1.0", "1.0")];
        let rebaseable: StringList = vec!["foo".to_string()].into();
        assert!(is_rebase(true, &peers, &rebaseable, Some("foo")));
    }

    #[test]
    fn missing_before_package_is_always_a_rebase() {
        let peer = SubpackagePeer {
            before_header: None,
            after_header: Some(header("foo", "1.0")),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        };
        assert!(is_rebase(true, &[peer], &StringList::new(), Some("foo")));
    }
}
