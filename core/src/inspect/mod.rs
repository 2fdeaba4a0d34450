//! The inspection registry & dispatcher (§4.10): a static table mapping
//! inspection name <-> bit-flag <-> driver function <-> metadata, plus the
//! per-file iteration helper every file-level inspection builds on.

pub mod addedfiles;
pub mod arch;
pub mod capabilities;
pub mod changedfiles;
pub mod changelog;
pub mod config_doc;
pub mod debuginfo;
pub mod dsodeps;
pub mod emptyrpm;
pub mod movedfiles;
pub mod pathmigration;
pub mod politics;
pub mod removedfiles;
pub mod runpath;
pub mod specname;
pub mod stubs;
pub mod subpackages;
pub mod symlinks;
pub mod unicode;

use crate::package::FileEntry;
use crate::peers::SubpackagePeer;
use crate::run::Run;

use tracing::{info_span, warn};

/// `fn(run) -> bool`; the return value is advisory only (verbose pass/FAIL
/// trace) -- the authoritative outcome lives in `run.results` (§4.10).
pub type Driver = fn(&mut Run) -> bool;

pub struct InspectionEntry {
    pub flag_bit: u64,
    pub name: &'static str,
    pub requires_both_builds: bool,
    pub performs_security_checks: bool,
    pub description: &'static str,
    pub driver: Driver,
}

macro_rules! entry {
    ($bit:expr, $name:literal, $both:expr, $sec:expr, $desc:literal, $driver:expr) => {
        InspectionEntry {
            flag_bit: 1u64 << $bit,
            name: $name,
            requires_both_builds: $both,
            performs_security_checks: $sec,
            description: $desc,
            driver: $driver,
        }
    };
}

/// The closed vocabulary, in fixed dispatch order (§4.10). Representative
/// inspections (§4.10's "Representative inspection semantics" plus the
/// SPEC_FULL §11 supplements) have full drivers; the remainder register
/// with [`stubs::driver`] so the table's vocabulary stays complete without
/// inventing undocumented business logic (SPEC_FULL §11).
pub fn registry() -> Vec<InspectionEntry> {
    vec![
        entry!(0, "addedfiles", true, false, "new files introduced by the after build", addedfiles::run),
        entry!(1, "removedfiles", true, false, "files present in before but missing from after", removedfiles::run),
        entry!(2, "movedfiles", true, false, "files that moved path or subpackage", movedfiles::run),
        entry!(3, "changedfiles", true, false, "files whose content changed between builds", changedfiles::run),
        entry!(4, "config", true, false, "config-file flag and content drift", config_doc::run_config),
        entry!(5, "doc", true, false, "doc-file flag drift", config_doc::run_doc),
        entry!(6, "symlinks", false, false, "symbolic link resolution and integrity", symlinks::run),
        entry!(7, "dsodeps", true, false, "shared-object DT_NEEDED drift", dsodeps::run),
        entry!(8, "runpath", false, true, "DT_RPATH/DT_RUNPATH validation", runpath::run),
        entry!(9, "capabilities", true, true, "file capability drift and policy", capabilities::run),
        entry!(10, "pathmigration", false, false, "files under a migrated path prefix", pathmigration::run),
        entry!(11, "subpackages", true, false, "subpackage gain/loss", subpackages::run),
        entry!(12, "debuginfo", true, false, "ELF debug section presence and drift", debuginfo::run),
        entry!(13, "unicode", false, true, "forbidden Unicode code points in source text", unicode::run),
        entry!(14, "politics", false, false, "politically sensitive content policy", politics::run),
        entry!(15, "specname", false, false, "spec file name convention", specname::run),
        entry!(16, "changelog", true, false, "changelog progression", changelog::run),
        entry!(17, "emptyrpm", true, false, "subpackage lost all its files", emptyrpm::run_emptyrpm),
        entry!(18, "lostpayload", false, false, "subpackage payload extracted empty", emptyrpm::run_lostpayload),
        entry!(19, "arch", true, false, "architecture gain/loss", arch::run),
        entry!(20, "metadata", false, false, "package metadata sanity", stubs::driver),
        entry!(21, "license", false, false, "license tag validity", stubs::driver),
        entry!(22, "elf", false, true, "ELF hardening properties", stubs::driver),
        entry!(23, "manpage", false, false, "man page syntax", stubs::driver),
        entry!(24, "xml", false, false, "XML syntax validity", stubs::driver),
        entry!(25, "desktop", false, false, "desktop entry file validity", stubs::driver),
        entry!(26, "disttag", false, false, "dist tag consistency", stubs::driver),
        entry!(27, "annocheck", false, true, "annobin hardening tests", stubs::driver),
        entry!(28, "javabytecode", false, false, "JVM bytecode major version floor", stubs::driver),
        entry!(29, "abidiff", true, false, "ABI compatibility (libabigail)", stubs::driver),
        entry!(30, "kmidiff", true, false, "kernel module interface compatibility", stubs::driver),
        entry!(31, "patches", true, false, "source patch count/size drift", stubs::driver),
        entry!(32, "upstream", true, false, "upstream source drift", stubs::driver),
        entry!(33, "lto", false, false, "link-time-optimization symbol hygiene", stubs::driver),
        entry!(34, "ownership", false, false, "file owner/group policy", stubs::driver),
        entry!(35, "shellsyntax", false, false, "shell script syntax", stubs::driver),
        entry!(36, "filesize", true, false, "file size drift threshold", stubs::driver),
        entry!(37, "badfuncs", false, true, "forbidden ELF symbol usage", stubs::driver),
        entry!(38, "udevrules", false, false, "udev rules file validity", stubs::driver),
        entry!(39, "modularity", false, false, "modularity static-context policy", stubs::driver),
        entry!(40, "virus", false, true, "malware scan", stubs::driver),
        entry!(41, "types", false, false, "MIME type drift", stubs::driver),
        entry!(42, "badwords", false, false, "forbidden metadata tokens", stubs::driver),
    ]
}

/// All flag bits OR'd together -- the `ALL` sentinel for `-T`/`-E`.
pub fn all_mask() -> u64 {
    registry().iter().fold(0, |acc, e| acc | e.flag_bit)
}

/// Parses a comma-separated inspection-name list into a bitmask; the
/// literal `ALL` selects every inspection (§6 `-T`/`-E`).
pub fn mask_from_names(names: &crate::strutil::StringList) -> u64 {
    let table = registry();
    let mut mask = 0u64;
    for name in names.iter() {
        if name == "ALL" {
            return all_mask();
        }
        if let Some(entry) = table.iter().find(|e| e.name == name) {
            mask |= entry.flag_bit;
        }
    }
    mask
}

/// Dispatch policy (§4.10): for each entry in table order, skip if its flag
/// isn't enabled, skip if it requires both builds and before is absent,
/// otherwise invoke the driver. After the loop, any inspection that left no
/// records gets a synthesized DIAGNOSTIC note.
pub fn dispatch(run: &mut Run, enabled_mask: u64) {
    for entry in registry() {
        if entry.flag_bit & enabled_mask == 0 {
            continue;
        }
        if entry.requires_both_builds && run.peers.iter().all(|p| p.before_header.is_none()) {
            continue;
        }

        let before_len = run.results.len();
        let _span = info_span!("inspect", name = entry.name).entered();
        let passed = (entry.driver)(run);
        let after_len = run.results.len();

        if after_len == before_len {
            run.results.add(crate::results::ResultRecord::new(
                crate::results::Severity::Diagnostic,
                entry.name,
                format!("{} ran and reported no findings", entry.name),
                crate::results::Verb::Skip,
                "no findings",
            ));
        }
        if !passed {
            warn!(name = entry.name, "inspection driver returned a non-passing advisory result");
        }
    }
}

/// The per-file iteration helper (§4.10 "Per-file iteration helper"): walks
/// every matched after-file of every peer, invoking `callback`. Does not
/// short-circuit on the first failure -- the inspection accumulates
/// findings across all files rather than stopping early.
pub fn for_each_after_file<F>(peers: &[SubpackagePeer], mut callback: F) -> bool
where
    F: FnMut(&SubpackagePeer, &FileEntry) -> bool,
{
    let mut all_passed = true;
    for peer in peers {
        for file in &peer.after_files {
            if !callback(peer, file) {
                all_passed = false;
            }
        }
    }
    all_passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_has_no_duplicate_names_or_bits() {
        let table = registry();
        let mut names = std::collections::HashSet::new();
        let mut bits = std::collections::HashSet::new();
        for entry in &table {
            assert!(names.insert(entry.name), "duplicate name {}", entry.name);
            assert!(bits.insert(entry.flag_bit), "duplicate bit for {}", entry.name);
        }
    }

    #[test]
    fn mask_from_names_all_selects_every_bit() {
        let names: crate::strutil::StringList = vec!["ALL".to_string()].into();
        assert_eq!(mask_from_names(&names), all_mask());
    }

    #[test]
    fn mask_from_names_selects_only_named_bits() {
        let table = registry();
        let addedfiles_bit = table.iter().find(|e| e.name == "addedfiles").unwrap().flag_bit;
        let names: crate::strutil::StringList = vec!["addedfiles".to_string()].into();
        assert_eq!(mask_from_names(&names), addedfiles_bit);
    }
}
