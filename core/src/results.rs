//! The results accumulator (§3 `ResultRecord`, §4.9): an append-only ordered
//! sequence of findings, plus the worst-severity tracking every inspection
//! and the top-level runner consult to compute an exit code.

use std::fmt;

/// Ordered such that each variant is worse than the previous one; `DIAGNOSTIC`
/// never contributes to `worst_severity` (§3 invariants, §8.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Diagnostic,
    Skip,
    Ok,
    Info,
    Verify,
    Bad,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Diagnostic => "DIAGNOSTIC",
            Severity::Skip => "SKIP",
            Severity::Ok => "OK",
            Severity::Info => "INFO",
            Severity::Verify => "VERIFY",
            Severity::Bad => "BAD",
        }
    }

    /// One tier down, used by the rebase downgrade (§4.8): VERIFY -> INFO,
    /// BAD -> INFO for advisory findings. Severities at or below INFO are
    /// unaffected.
    pub fn downgrade_for_rebase(self) -> Severity {
        match self {
            Severity::Verify | Severity::Bad => Severity::Info,
            other => other,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DIAGNOSTIC" => Ok(Severity::Diagnostic),
            "SKIP" => Ok(Severity::Skip),
            "OK" => Ok(Severity::Ok),
            "INFO" => Ok(Severity::Info),
            "VERIFY" => Ok(Severity::Verify),
            "BAD" => Ok(Severity::Bad),
            other => Err(crate::anyhow!("unknown severity '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaiverAuthority {
    NotWaivable,
    Anyone,
    Security,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Added,
    Removed,
    Changed,
    Failed,
    Ok,
    Skip,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Added => "added",
            Verb::Removed => "removed",
            Verb::Changed => "changed",
            Verb::Failed => "failed",
            Verb::Ok => "ok",
            Verb::Skip => "skip",
        }
    }
}

/// One finding. Once appended to a [`Results`] accumulator it is never
/// mutated (§3 invariants).
#[derive(Clone, Debug)]
pub struct ResultRecord {
    pub severity: Severity,
    pub waiver_authority: WaiverAuthority,
    /// The inspection's display header, e.g. `"removed files"`.
    pub header: String,
    pub message: String,
    pub details: Option<String>,
    pub remedy: Option<String>,
    pub verb: Verb,
    /// Short template with `${FILE}`/`${ARCH}` placeholders a formatter may
    /// substitute; callers that have already substituted pass the final
    /// text and leave `file`/`arch` set for the formatter's own use.
    pub noun: String,
    pub arch: Option<String>,
    pub file: Option<String>,
}

impl ResultRecord {
    pub fn new(
        severity: Severity,
        header: impl Into<String>,
        message: impl Into<String>,
        verb: Verb,
        noun: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            waiver_authority: WaiverAuthority::Anyone,
            header: header.into(),
            message: message.into(),
            details: None,
            remedy: None,
            verb,
            noun: noun.into(),
            arch: None,
            file: None,
        }
    }

    pub fn waivable(mut self, authority: WaiverAuthority) -> Self {
        self.waiver_authority = authority;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remedy = Some(remedy.into());
        self
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Renders `noun`'s `${FILE}`/`${ARCH}` placeholders against this
    /// record's `file`/`arch`, matching the formatters' substitution rule
    /// (§6 Output formats).
    pub fn rendered_noun(&self) -> String {
        let mut out = self.noun.clone();
        if let Some(file) = &self.file {
            out = out.replace("${FILE}", file);
        }
        if let Some(arch) = &self.arch {
            out = out.replace("${ARCH}", arch);
        }
        out
    }
}

/// The "any finding under a configured security-path prefix escalates to
/// Security waiver authority" rule (SPEC_FULL §11), centralized here rather
/// than re-implemented in every file-level inspection.
pub fn escalate_for_security_path(
    record: ResultRecord,
    localpath: &str,
    security_path_prefixes: &crate::strutil::StringList,
) -> ResultRecord {
    let under_security_path = security_path_prefixes
        .iter()
        .any(|prefix| localpath.starts_with(prefix.as_str()));
    if under_security_path {
        record.waivable(WaiverAuthority::Security)
    } else {
        record
    }
}

/// The append-only ordered sequence of findings (§4.9) plus worst-severity
/// tracking.
#[derive(Debug, Default)]
pub struct Results {
    records: Vec<ResultRecord>,
    worst: Option<Severity>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: ResultRecord) {
        if record.severity != Severity::Diagnostic {
            self.worst = Some(match self.worst {
                Some(current) if current >= record.severity => current,
                _ => record.severity,
            });
        }
        self.records.push(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-decreasing worst severity seen so far; `DIAGNOSTIC` never counts
    /// (§3 invariants, §8.2).
    pub fn worst_severity(&self) -> Severity {
        self.worst.unwrap_or(Severity::Ok)
    }

    pub fn for_header(&self, header: &str) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(move |r| r.header == header)
    }

    /// `true` iff every record carrying `header` is strictly below
    /// `suppress_threshold` -- used by the summary formatter to decide
    /// whether to print the inspection's header line at all.
    pub fn count_suppressed(&self, header: &str, suppress_threshold: Severity) -> bool {
        self.for_header(header)
            .all(|r| r.severity < suppress_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn worst_severity_ignores_diagnostic() {
        let mut results = Results::new();
        results.add(ResultRecord::new(
            Severity::Diagnostic,
            "h",
            "m",
            Verb::Skip,
            "n",
        ));
        assert_eq!(results.worst_severity(), Severity::Ok);
    }

    #[test]
    fn worst_severity_is_monotonic() {
        let mut results = Results::new();
        results.add(ResultRecord::new(Severity::Info, "h", "m", Verb::Ok, "n"));
        assert_eq!(results.worst_severity(), Severity::Info);
        results.add(ResultRecord::new(Severity::Verify, "h", "m", Verb::Failed, "n"));
        assert_eq!(results.worst_severity(), Severity::Verify);
        results.add(ResultRecord::new(Severity::Info, "h", "m", Verb::Ok, "n"));
        assert_eq!(results.worst_severity(), Severity::Verify);
    }

    #[test]
    fn severity_ordering_matches_spec() {
        assert!(Severity::Bad > Severity::Verify);
        assert!(Severity::Verify > Severity::Info);
        assert!(Severity::Info > Severity::Ok);
        assert!(Severity::Ok > Severity::Skip);
        assert!(Severity::Skip > Severity::Diagnostic);
    }

    #[test]
    fn rebase_downgrade_maps_verify_and_bad_to_info() {
        assert_eq!(Severity::Verify.downgrade_for_rebase(), Severity::Info);
        assert_eq!(Severity::Bad.downgrade_for_rebase(), Severity::Info);
        assert_eq!(Severity::Info.downgrade_for_rebase(), Severity::Info);
        assert_eq!(Severity::Ok.downgrade_for_rebase(), Severity::Ok);
    }

    #[test]
    fn security_path_escalates_waiver_authority() {
        let record = ResultRecord::new(Severity::Verify, "h", "m", Verb::Changed, "n");
        let prefixes: crate::strutil::StringList =
            vec!["/etc/security/".to_string()].into();
        let escalated =
            escalate_for_security_path(record.clone(), "/etc/security/limits.conf", &prefixes);
        assert_eq!(escalated.waiver_authority, WaiverAuthority::Security);

        let unescalated = escalate_for_security_path(record, "/usr/bin/foo", &prefixes);
        assert_eq!(unescalated.waiver_authority, WaiverAuthority::Anyone);
    }

    #[test]
    fn noun_template_substitutes_file_and_arch() {
        let record = ResultRecord::new(Severity::Info, "h", "m", Verb::Changed, "${FILE} on ${ARCH}")
            .with_file("/usr/bin/foo")
            .with_arch("x86_64");
        assert_eq!(record.rendered_noun(), "/usr/bin/foo on x86_64");
    }
}
