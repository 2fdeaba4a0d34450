//! `symlinks` (§4.10): resolves every after-side symbolic link against the
//! virtual tree formed by all after-side files across every subpackage
//! peer -- never the host filesystem -- and reports unresolvable or
//! dangerous links.

use crate::package::file::FileType;
use crate::results::{ResultRecord, Severity, Verb, WaiverAuthority};
use crate::run::Run;

use std::collections::HashMap;

/// Linux's classic symlink-resolution depth limit; exceeding it while
/// chasing a chain of symlinks is reported as `ELOOP`.
const MAX_SYMLINK_HOPS: usize = 40;
/// `PATH_MAX`-equivalent; a resolved path longer than this is `ENAMETOOLONG`.
const MAX_PATH_LEN: usize = 4096;

enum Resolution {
    Found,
    Eloop,
    Enametoolong,
    NotFound,
}

/// One entry of the virtual after-side tree: its file type, and its
/// symlink target when it is itself a symlink.
struct TreeEntry {
    file_type: FileType,
    symlink_target: Option<String>,
}

fn join_localpath(dir: &str, target: &str) -> String {
    if target.starts_with('/') {
        normalize(target)
    } else {
        let base = if dir == "/" { String::new() } else { dir.to_string() };
        normalize(&format!("{base}/{target}"))
    }
}

/// Collapses `.` and `..` components without touching any real filesystem.
fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    format!("/{}", stack.join("/"))
}

fn dirname(localpath: &str) -> String {
    match localpath.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => localpath[..idx].to_string(),
        None => "/".to_string(),
    }
}

fn resolve(tree: &HashMap<String, TreeEntry>, start: &str) -> Resolution {
    let mut current = start.to_string();
    let mut hops = 0usize;

    loop {
        if current.len() > MAX_PATH_LEN {
            return Resolution::Enametoolong;
        }
        let Some(entry) = tree.get(&current) else {
            return Resolution::NotFound;
        };
        match (&entry.file_type, &entry.symlink_target) {
            (FileType::Symlink, Some(target)) => {
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return Resolution::Eloop;
                }
                current = join_localpath(&dirname(&current), target);
            }
            _ => return Resolution::Found,
        }
    }
}

pub fn run(run: &mut Run) -> bool {
    let mut tree: HashMap<String, TreeEntry> = HashMap::new();
    for peer in &run.peers {
        for file in &peer.after_files {
            tree.insert(
                file.localpath.clone(),
                TreeEntry {
                    file_type: file.stat.file_type(),
                    symlink_target: file.symlink_target.clone(),
                },
            );
        }
    }

    let mut passed = true;

    for peer in &run.peers {
        for after_file in &peer.after_files {
            if !after_file.is_symlink() {
                continue;
            }
            let Some(target) = &after_file.symlink_target else { continue };

            // A before-side non-symlink becoming an after-side symlink over
            // a directory target is a hard BAD regardless of resolvability.
            if let Some(p) = after_file.peer {
                if let Some(before_file) = peer.before_files.get(p.index) {
                    if !matches!(before_file.stat.file_type(), FileType::Symlink) {
                        let resolved = join_localpath(&dirname(&after_file.localpath), target);
                        let points_at_dir = tree
                            .get(&resolved)
                            .map(|e| matches!(e.file_type, FileType::Directory))
                            .unwrap_or(false);
                        if points_at_dir {
                            passed = false;
                            run.results.add(
                                ResultRecord::new(
                                    Severity::Bad,
                                    "symlinks",
                                    format!(
                                        "{} was a regular file in the before build and is now a symlink over directory {resolved}",
                                        after_file.localpath
                                    ),
                                    Verb::Changed,
                                    "${FILE} became a symlink over a directory",
                                )
                                .with_file(after_file.localpath.clone())
                                .waivable(WaiverAuthority::NotWaivable),
                            );
                            continue;
                        }
                    }
                }
            }

            let start = join_localpath(&dirname(&after_file.localpath), target);
            match resolve(&tree, &start) {
                Resolution::Found => continue,
                Resolution::Eloop => {
                    passed = false;
                    run.results.add(
                        ResultRecord::new(
                            Severity::Bad,
                            "symlinks",
                            format!("{} could not be resolved: too many levels of symbolic links", after_file.localpath),
                            Verb::Failed,
                            "${FILE} unresolvable (ELOOP)",
                        )
                        .with_file(after_file.localpath.clone())
                        .waivable(WaiverAuthority::Anyone),
                    );
                }
                Resolution::Enametoolong => {
                    passed = false;
                    run.results.add(
                        ResultRecord::new(
                            Severity::Bad,
                            "symlinks",
                            format!("{} could not be resolved: resulting path too long", after_file.localpath),
                            Verb::Failed,
                            "${FILE} unresolvable (ENAMETOOLONG)",
                        )
                        .with_file(after_file.localpath.clone())
                        .waivable(WaiverAuthority::Anyone),
                    );
                }
                Resolution::NotFound => {
                    run.results.add(
                        ResultRecord::new(
                            Severity::Info,
                            "symlinks",
                            format!("{} points to {target}, which does not exist in this build", after_file.localpath),
                            Verb::Failed,
                            "${FILE} dangling symlink",
                        )
                        .with_file(after_file.localpath.clone()),
                    );
                }
            }
        }
    }

    passed
}
