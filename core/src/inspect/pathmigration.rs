//! `pathmigration` (§4.10): flags after-build files that still live under an
//! old path a `pathmigration.migrated_paths` entry says should have moved.

use crate::results::{ResultRecord, Severity, Verb};
use crate::run::Run;
use crate::strutil::matches_any_glob;

pub fn run(run: &mut Run) -> bool {
    let migrated = run.config.pathmigration.migrated_paths.clone();
    let excluded = run.config.pathmigration.excluded_paths.clone();
    let mut passed = true;

    for peer in &run.peers {
        for file in &peer.after_files {
            if matches_any_glob(&file.localpath, &excluded) {
                continue;
            }

            let hit = migrated
                .iter()
                .find(|(old, _)| file.localpath.starts_with(old.as_str()));
            let Some((old, new)) = hit else { continue };

            passed = false;
            run.results.add(
                ResultRecord::new(
                    Severity::Verify,
                    "pathmigration",
                    format!("{} is under '{old}', migrated to '{new}'", file.localpath),
                    Verb::Failed,
                    "${FILE} under a migrated path",
                )
                .with_file(file.localpath.clone())
                .with_remedy(format!("move this file under '{new}'")),
            );
        }
    }

    passed
}
