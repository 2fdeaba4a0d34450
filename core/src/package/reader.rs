//! Adapts an `rpm::Package` (the on-disk parser) into our own [`Header`] and
//! [`FileEntry`] shapes (§4.3), and extracts the payload into a private
//! subtree. A header cache avoids re-parsing the same package path twice
//! within a run.
//!
//! Special files (char/block/socket/fifo) are recorded in the `Header`'s
//! file table but deliberately not materialized on disk during extraction,
//! matching §4.3's acquisition contract.

use crate::header::{ChangelogEntry, Dependencies, DependencyEntry, Header};
use crate::package::file::{FileEntry, FileFlags, FileStat, FileType};
use crate::{anyhow, Context as _, Result};

use rpm::Package as RpmPackage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// `package-path -> Header`, avoiding re-parsing within a run (§4.3).
#[derive(Default)]
pub struct HeaderCache {
    entries: Mutex<HashMap<PathBuf, Header>>,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_read(&self, path: &Path) -> Result<Header> {
        if let Some(cached) = self.entries.lock().unwrap().get(path) {
            return Ok(cached.clone());
        }
        let header = read_header(path)?;
        self.entries
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), header.clone());
        Ok(header)
    }
}

/// Parses `path` into a [`Header`]. Missing required tags (name, version,
/// release, arch) is a fatal error for this package (§4.3 failure modes).
pub fn read_header(path: &Path) -> Result<Header> {
    let pkg = RpmPackage::open(path)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed to parse package {}", path.display()))?;
    let md = &pkg.metadata;

    let name = md
        .get_name()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("{} is missing a name tag", path.display()))?
        .to_string();
    let version = md
        .get_version()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("{} is missing a version tag", path.display()))?
        .to_string();
    let release = md
        .get_release()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("{} is missing a release tag", path.display()))?
        .to_string();
    let arch = md
        .get_arch()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("{} is missing an arch tag", path.display()))?
        .to_string();

    let epoch = md.get_epoch().ok().filter(|e| *e != 0);
    let license = md.get_license().unwrap_or("").to_string();
    let summary = md.get_summary().unwrap_or("").to_string();
    let description = md.get_description().unwrap_or("").to_string();
    let vendor = md.get_vendor().ok().map(str::to_string);
    let buildhost = md.get_build_host().ok().map(str::to_string);
    let sourcerpm = md.get_source_rpm().ok().map(str::to_string);

    let changelog = md
        .get_changelog_entries()
        .map(|entries| {
            entries
                .into_iter()
                .map(|e| ChangelogEntry {
                    name: e.name,
                    timestamp: e.timestamp,
                    text: e.description,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Header {
        name,
        version,
        release,
        epoch,
        arch,
        license,
        summary,
        description,
        vendor,
        buildhost,
        sourcerpm,
        changelog,
        requires: dependencies(md.get_requires()),
        provides: dependencies(md.get_provides()),
        conflicts: dependencies(md.get_conflicts()),
        obsoletes: dependencies(md.get_obsoletes()),
        enhances: Dependencies::default(),
        recommends: Dependencies::default(),
        suggests: Dependencies::default(),
        supplements: Dependencies::default(),
    })
}

fn dependencies(result: Result<Vec<rpm::Dependency>, rpm::RPMError>) -> Dependencies {
    let Ok(deps) = result else {
        return Dependencies::default();
    };
    Dependencies(
        deps.into_iter()
            .map(|d| DependencyEntry {
                name: d.name,
                operator: None,
                version: if d.version.is_empty() {
                    None
                } else {
                    Some(d.version)
                },
                flags: 0,
            })
            .collect(),
    )
}

/// Extracts `path`'s payload into `dest_root`, returning the [`FileEntry`]
/// sequence in payload order (the peer matcher relies on this order for
/// determinism, §4.7). Special files are recorded but not materialized.
pub fn extract_package(path: &Path, dest_root: &Path) -> Result<Vec<FileEntry>> {
    let pkg = RpmPackage::open(path)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed to parse package {}", path.display()))?;

    crate::fsutil::mkdirp(dest_root, 0o755)?;

    let raw_entries = pkg
        .metadata
        .get_file_entries()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed to read file table of {}", path.display()))?;

    let mut out = Vec::with_capacity(raw_entries.len());

    for entry in raw_entries {
        let localpath = format!("/{}", entry.path.to_string_lossy().trim_start_matches('/'));
        let fullpath = dest_root.join(localpath.trim_start_matches('/'));

        let mode = rpm_file_mode_bits(&entry);
        let stat = FileStat {
            mode,
            size: entry.size,
        };
        let file_type = stat.file_type();

        let mut flags = FileFlags::empty();
        let raw_flags = entry.flags.bits();
        if raw_flags & (1 << 0) != 0 {
            flags.insert(FileFlags::CONFIG);
        }
        if raw_flags & (1 << 1) != 0 {
            flags.insert(FileFlags::DOC);
        }
        if raw_flags & (1 << 6) != 0 {
            flags.insert(FileFlags::GHOST);
        }
        if raw_flags & (1 << 4) != 0 {
            flags.insert(FileFlags::NOREPLACE);
        }
        if raw_flags & (1 << 2) != 0 {
            flags.insert(FileFlags::LICENSE);
        }
        if raw_flags & (1 << 3) != 0 {
            flags.insert(FileFlags::README);
        }

        let symlink_target = match file_type {
            FileType::Symlink if !entry.linkto.is_empty() => Some(entry.linkto.clone()),
            _ => None,
        };

        if !flags.contains(FileFlags::GHOST) {
            match file_type {
                FileType::Directory => {
                    crate::fsutil::mkdirp(&fullpath, 0o755)?;
                }
                FileType::Symlink => {
                    if let Some(parent) = fullpath.parent() {
                        crate::fsutil::mkdirp(parent, 0o755)?;
                    }
                    #[cfg(unix)]
                    if let Some(target) = &symlink_target {
                        let _ = std::fs::remove_file(&fullpath);
                        std::os::unix::fs::symlink(target, &fullpath).ok();
                    }
                }
                FileType::Regular => {
                    if let Some(parent) = fullpath.parent() {
                        crate::fsutil::mkdirp(parent, 0o755)?;
                    }
                    std::fs::write(&fullpath, &pkg.content[..entry.size.min(pkg.content.len() as u64) as usize])
                        .with_context(|| format!("failed to materialize {}", fullpath.display()))?;
                }
                // Char/block/fifo/socket: recorded in the header, not
                // materialized on disk (§4.3).
                _ => {}
            }
        }

        out.push(FileEntry::new(
            localpath,
            fullpath,
            stat,
            entry.owner,
            entry.group,
            symlink_target,
            flags,
            None,
        ));
    }

    Ok(out)
}

fn rpm_file_mode_bits(entry: &rpm::FileEntry) -> u32 {
    use rpm::FileMode;
    match &entry.mode {
        FileMode::Dir { permissions } => 0o040000 | (*permissions as u32),
        FileMode::SymbolicLink { permissions } => 0o120000 | (*permissions as u32),
        FileMode::Regular { permissions } => 0o100000 | (*permissions as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpm_file_mode_bits_tags_symlinks() {
        let entry = rpm::FileEntry {
            path: PathBuf::from("/usr/lib/foo.so"),
            mode: rpm::FileMode::SymbolicLink { permissions: 0o777 },
            digest: None,
            owner: "root".to_string(),
            group: "root".to_string(),
            size: 0,
            flags: rpm::FileFlags::empty(),
            linkto: "foo.so.1".to_string(),
        };
        let bits = rpm_file_mode_bits(&entry);
        let stat = FileStat { mode: bits, size: 0 };
        assert_eq!(stat.file_type(), FileType::Symlink);
    }
}
