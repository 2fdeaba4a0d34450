//! The read-only view of one package's metadata (§3 `Header`). This is our
//! own shape, not `rpm::Header` directly -- `package::reader` adapts an
//! `rpm::Package`'s tags into this struct once per package, so the rest of
//! the engine never touches the `rpm` crate's types.

use std::fmt;

/// One `(requirement-string, operator, version, flags)` tuple from a
/// dependency tag family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub operator: Option<String>,
    pub version: Option<String>,
    pub flags: u32,
}

impl fmt::Display for DependencyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operator, &self.version) {
            (Some(op), Some(ver)) => write!(f, "{} {} {}", self.name, op, ver),
            _ => write!(f, "{}", self.name),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dependencies(pub Vec<DependencyEntry>);

impl Dependencies {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|d| d.name.as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|d| d.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub name: String,
    /// Seconds since epoch, as stored in the RPM changelog tag.
    pub timestamp: i64,
    pub text: String,
}

/// The special value of `arch` marking a source package.
pub const SRC_ARCH: &str = "src";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub version: String,
    pub release: String,
    pub epoch: Option<u32>,
    pub arch: String,
    pub license: String,
    pub summary: String,
    pub description: String,
    pub vendor: Option<String>,
    pub buildhost: Option<String>,
    pub sourcerpm: Option<String>,
    pub changelog: Vec<ChangelogEntry>,

    pub requires: Dependencies,
    pub provides: Dependencies,
    pub conflicts: Dependencies,
    pub obsoletes: Dependencies,
    pub enhances: Dependencies,
    pub recommends: Dependencies,
    pub suggests: Dependencies,
    pub supplements: Dependencies,
}

impl Header {
    pub fn is_source(&self) -> bool {
        self.arch == SRC_ARCH
    }

    /// The `(name, arch)` identity binary packages are paired by; source
    /// packages are paired by name alone (§4.7).
    pub fn identity(&self) -> (String, Option<String>) {
        if self.is_source() {
            (self.name.clone(), None)
        } else {
            (self.name.clone(), Some(self.arch.clone()))
        }
    }

    /// The trailing `.<token>` of `release`, i.e. the dist tag, if present.
    pub fn dist_tag(&self) -> Option<&str> {
        self.release.rsplit_once('.').map(|(_, tag)| tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(name: &str, arch: &str, release: &str) -> Header {
        Header {
            name: name.to_string(),
            version: "1.0".to_string(),
            release: release.to_string(),
            epoch: None,
            arch: arch.to_string(),
            license: "MIT".to_string(),
            summary: String::new(),
            description: String::new(),
            vendor: None,
            buildhost: None,
            sourcerpm: None,
            changelog: vec![],
            requires: Dependencies::default(),
            provides: Dependencies::default(),
            conflicts: Dependencies::default(),
            obsoletes: Dependencies::default(),
            enhances: Dependencies::default(),
            recommends: Dependencies::default(),
            suggests: Dependencies::default(),
            supplements: Dependencies::default(),
        }
    }

    #[test]
    fn source_package_identity_ignores_arch() {
        let h = header("foo", SRC_ARCH, "1.fc40");
        assert_eq!(h.identity(), ("foo".to_string(), None));
    }

    #[test]
    fn binary_package_identity_includes_arch() {
        let h = header("foo", "x86_64", "1.fc40");
        assert_eq!(h.identity(), ("foo".to_string(), Some("x86_64".to_string())));
    }

    #[test]
    fn dist_tag_is_trailing_dot_token() {
        let h = header("foo", "x86_64", "3.fc40");
        assert_eq!(h.dist_tag(), Some("fc40"));
    }

    #[test]
    fn dist_tag_absent_without_dot() {
        let h = header("foo", "x86_64", "3");
        assert_eq!(h.dist_tag(), None);
    }
}
