//! `politics` (§4.10, §4.5): checks after-build files against the vendor
//! politics table (logos, flags, and other content with legal/political
//! sensitivity), using content digest plus glob to find the ruling verdict.

use crate::policy::{self, PoliticsEntry, PoliticsVerdict};
use crate::results::{ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;

pub fn run(run: &mut Run) -> bool {
    let Some(vendor_dir) = run.config.vendor.vendor_data_dir.clone() else {
        return true;
    };
    let product_release = run.product_release.clone();
    let mut passed = true;

    for peer in &run.peers {
        for file in &peer.after_files {
            if !file.is_regular() {
                continue;
            }
            let Ok(digest) = file.checksum() else { continue };
            let entries = run.policy().politics(Some(&vendor_dir), &product_release);
            let verdict = policy::politics_verdict(entries, &file.localpath, &digest);

            let (severity, message, waiver) = match verdict {
                Some(PoliticsVerdict::Deny) => (
                    Severity::Bad,
                    format!("{} matches a denied politics policy entry", file.localpath),
                    WaiverAuthority::NotWaivable,
                ),
                Some(PoliticsVerdict::Allow) => (
                    Severity::Info,
                    format!("{} matches an allowed politics policy entry", file.localpath),
                    WaiverAuthority::Anyone,
                ),
                None => continue,
            };
            if severity >= Severity::Verify {
                passed = false;
            }

            run.results.add(
                ResultRecord::new(
                    severity,
                    "politics",
                    message,
                    Verb::Failed,
                    "${FILE} matched by politics policy",
                )
                .with_file(file.localpath.clone())
                .waivable(waiver),
            );
        }
    }

    passed
}
