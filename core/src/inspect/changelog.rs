//! `changelog` (SPEC_FULL §11, explicitly named in spec.md §1's inspection
//! list): checks the after build's changelog is non-empty and, when a
//! before build exists, that it's a superset extending the before
//! changelog -- new entries prepended, nothing existing dropped or
//! reordered. Grounded in `lib/inspect_*.c`'s general "compare then report"
//! shape used by every diff inspection.

use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        let after = match &peer.after_header {
            Some(h) => h,
            None => continue,
        };
        let label = peer.name();

        if after.changelog.is_empty() {
            passed = false;
            run.results.add(ResultRecord::new(
                Severity::Bad,
                "changelog",
                format!("{label} has no changelog entries"),
                Verb::Failed,
                format!("subpackage {label}"),
            ));
            continue;
        }

        let before = match &peer.before_header {
            Some(h) => h,
            None => continue,
        };
        if before.changelog.is_empty() {
            continue;
        }

        if after.changelog.len() < before.changelog.len()
            || after.changelog[after.changelog.len() - before.changelog.len()..] != before.changelog[..]
        {
            let mut severity = Severity::Verify;
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }
            run.results.add(ResultRecord::new(
                severity,
                "changelog",
                format!(
                    "{label}'s changelog does not extend the before build's changelog \
                     without dropping or reordering existing entries"
                ),
                Verb::Changed,
                format!("subpackage {label}"),
            ));
        }
    }

    passed
}
