//! `subpackages` (§4.10): reports subpackages gained or lost between builds
//! at the peer-identity level (distinct from `emptyrpm`, which catches a
//! kept subpackage that lost all its files).

use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        let (name, arch) = peer.identity();
        let label = match &arch {
            Some(a) => format!("{name}.{a}"),
            None => name.clone(),
        };

        match (&peer.before_header, &peer.after_header) {
            (None, Some(_)) => {
                let mut severity = Severity::Info;
                if rebase {
                    severity = severity.downgrade_for_rebase();
                }
                let mut record = ResultRecord::new(
                    severity,
                    "subpackages",
                    format!("{label} is a new subpackage"),
                    Verb::Added,
                    format!("subpackage {name}"),
                );
                if let Some(a) = &arch {
                    record = record.with_arch(a.clone());
                }
                run.results.add(record);
            }
            (Some(_), None) => {
                let mut severity = Severity::Verify;
                if rebase {
                    severity = severity.downgrade_for_rebase();
                }
                if severity >= Severity::Verify {
                    passed = false;
                }
                let mut record = ResultRecord::new(
                    severity,
                    "subpackages",
                    format!("{label} was removed"),
                    Verb::Removed,
                    format!("subpackage {name}"),
                );
                if let Some(a) = &arch {
                    record = record.with_arch(a.clone());
                }
                run.results.add(record);
            }
            _ => {}
        }
    }

    passed
}
