//! `removedfiles` (§4.10): files present before the build but missing after
//! it, with no matching peer and no cross-subpackage move recorded.

use crate::capability::elf::{self, ElfKind};
use crate::results::{escalate_for_security_path, ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;
use crate::strutil::{is_debug_path, is_egg_info_path, matches_any_glob};

pub fn run(run: &mut Run) -> bool {
    let ignore = run.config.ignore.clone();
    let security_prefixes = run.config.security_path_prefix.clone();
    let rebase = run.is_rebase();
    let mut passed = true;

    for peer in &run.peers {
        for file in &peer.before_files {
            if file.peer.is_some() || file.moved_subpackage {
                continue;
            }
            if matches_any_glob(&file.localpath, &ignore)
                || is_debug_path(&file.localpath)
                || is_egg_info_path(&file.localpath)
            {
                continue;
            }

            // A removed shared library is a hard BAD naming its SONAME,
            // regardless of rebase (§4.10 `removedfiles`).
            let soname = file
                .is_regular()
                .then(|| elf::read(&file.fullpath).ok().flatten())
                .flatten()
                .filter(|info| info.kind == ElfKind::SharedLibrary)
                .and_then(|info| info.soname);

            if let Some(soname) = soname {
                passed = false;
                run.results.add(
                    ResultRecord::new(
                        Severity::Bad,
                        "removed files",
                        format!("{} (SONAME {soname}) was removed by this build", file.localpath),
                        Verb::Removed,
                        "${FILE} removed shared library",
                    )
                    .with_file(file.localpath.clone())
                    .waivable(WaiverAuthority::NotWaivable),
                );
                continue;
            }

            let mut severity = Severity::Bad;
            if rebase {
                severity = severity.downgrade_for_rebase();
            }
            if severity >= Severity::Verify {
                passed = false;
            }

            let record = ResultRecord::new(
                severity,
                "removed files",
                format!("{} was removed by this build", file.localpath),
                Verb::Removed,
                "${FILE} removed",
            )
            .with_file(file.localpath.clone());
            let record = escalate_for_security_path(record, &file.localpath, &security_prefixes);
            run.results.add(record);
        }
    }

    passed
}
