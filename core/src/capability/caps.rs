//! `CapabilityParser` capability: parse and compare the libcap textual form
//! (e.g. `cap_net_admin,cap_net_raw=ep`). No published crate parses the
//! *file* capability text form (the `caps` crate models a process's live
//! capability sets, a different domain), so this is hand-rolled -- it is
//! inherent inspection logic, not ambient stack the corpus would otherwise
//! supply a crate for.

use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapSet {
    pub names: BTreeSet<String>,
    pub flags: String,
}

/// Parses `cap_name[,cap_name...]=flags` into a normalized, order-independent
/// form so two textual renderings of the same capability set compare equal.
pub fn parse(text: &str) -> Option<CapSet> {
    let (names, flags) = text.split_once('=')?;
    let names = names
        .split(',')
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    Some(CapSet {
        names,
        flags: flags.trim().to_lowercase(),
    })
}

/// Renders a `CapSet` back to libcap textual form, with names sorted for a
/// deterministic rendering.
pub fn render(set: &CapSet) -> String {
    format!("{}={}", set.names.iter().cloned().collect::<Vec<_>>().join(","), set.flags)
}

/// `true` iff both textual forms parse to the same capability set,
/// regardless of name ordering or case.
pub fn equivalent(a: &str, b: &str) -> bool {
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.trim() == b.trim(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_cap_text() {
        let set = parse("cap_net_admin,cap_net_raw=ep").unwrap();
        assert_eq!(set.flags, "ep");
        assert!(set.names.contains("cap_net_admin"));
        assert!(set.names.contains("cap_net_raw"));
    }

    #[test]
    fn equivalence_ignores_name_order_and_case() {
        assert!(equivalent(
            "cap_net_raw,CAP_NET_ADMIN=ep",
            "cap_net_admin,cap_net_raw=EP"
        ));
    }

    #[test]
    fn equivalence_detects_real_difference() {
        assert!(!equivalent("cap_net_admin=ep", "cap_net_admin=e"));
    }

    #[test]
    fn malformed_text_without_equals_fails_to_parse() {
        assert!(parse("cap_net_admin").is_none());
    }
}
