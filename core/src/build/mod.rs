//! Build acquisition (§4.6): for each of before/after, materializes a build
//! into `<workdir>/<run>/<before|after>/<arch>/*.<pkg-ext>`, then parses and
//! extracts every present subpackage into a [`SubpackageInput`] for the peer
//! matcher.

use crate::header::SRC_ARCH;
use crate::package::reader;
use crate::peers::SubpackageInput;
use crate::strutil::StringList;
use crate::{Context as _, Result};

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

impl Side {
    pub fn dirname(&self) -> &'static str {
        match self {
            Side::Before => "before",
            Side::After => "after",
        }
    }
}

/// The build specifier for one side (§4.6, cases 1-4).
#[derive(Clone, Debug)]
pub enum BuildSpec {
    /// A local directory containing arch subdirectories and packages.
    LocalDirectory(PathBuf),
    /// A single local package file.
    LocalPackage(PathBuf),
    /// A single package reachable over HTTP(S); resolved by a transport
    /// collaborator not modeled here (Non-goal, §1).
    RemotePackageUrl(String),
    /// A named build or task id in a remote catalog (Koji or equivalent).
    Named(String),
}

/// One `(arch, package-url, subpackage-identity)` tuple a [`BuildCatalog`]
/// yields for a named build or task (§4.6 case 4).
#[derive(Clone, Debug)]
pub struct BuildDescriptorEntry {
    pub arch: String,
    pub package_url: String,
    pub subpackage_identity: String,
}

#[derive(Clone, Debug, Default)]
pub struct BuildDescriptor {
    pub entries: Vec<BuildDescriptorEntry>,
    /// Present for modular builds; the `filter.rpms` list therein suppresses
    /// downloads of filtered names (§4.6).
    pub module_filter_rpms: Option<StringList>,
}

/// The black-box remote catalog client (§1 Non-goals: "Koji XMLRPC client
/// ... treated as a black box yielding a normalized build descriptor").
/// Only a local/single-file implementation ships with this crate; a remote
/// implementation is a seam for the CLI frontend to provide.
pub trait BuildCatalog {
    fn resolve(&self, spec: &str) -> Result<BuildDescriptor>;
    /// Fetches `url` to `dest`, returning the local path. Transport and
    /// progress display are Non-goals (§1); a real implementation lives in
    /// the CLI frontend.
    fn download(&self, url: &str, dest: &Path) -> Result<PathBuf>;
}

/// Acquires one side of the run into `worksubdir/<before|after>/`, returning
/// the parsed+extracted subpackages in the order they were found. Per-
/// package failures that don't empty the side produce a caller-visible
/// [`AcquisitionOutcome::partial`] rather than aborting (§4.6, §7).
pub struct AcquisitionOutcome {
    pub inputs: Vec<SubpackageInput>,
    /// One message per per-package failure that didn't empty the side; the
    /// caller turns each into a DIAGNOSTIC result (§7).
    pub diagnostics: Vec<String>,
}

pub fn acquire(
    spec: &BuildSpec,
    side: Side,
    worksubdir: &Path,
    arches: Option<&StringList>,
    catalog: Option<&dyn BuildCatalog>,
) -> Result<AcquisitionOutcome> {
    let side_root = worksubdir.join(side.dirname());
    crate::fsutil::mkdirp(&side_root, 0o755)?;

    match spec {
        BuildSpec::LocalDirectory(dir) => acquire_local_directory(dir, &side_root, arches),
        BuildSpec::LocalPackage(path) => acquire_local_package(path, &side_root),
        BuildSpec::RemotePackageUrl(url) => {
            let catalog = catalog.ok_or_else(|| {
                crate::anyhow!("a remote package URL requires a catalog/transport collaborator")
            })?;
            let dest = side_root.join("download.rpm");
            let local = catalog.download(url, &dest)?;
            acquire_local_package(&local, &side_root)
        }
        BuildSpec::Named(name) => {
            let catalog = catalog
                .ok_or_else(|| crate::anyhow!("a named build requires a catalog collaborator"))?;
            acquire_from_catalog(catalog, name, &side_root, arches)
        }
    }
}

fn acquire_local_directory(
    dir: &Path,
    side_root: &Path,
    arches: Option<&StringList>,
) -> Result<AcquisitionOutcome> {
    let mut inputs = Vec::new();
    let mut diagnostics = Vec::new();

    let mut arch_dirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read build directory {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    arch_dirs.sort();

    for arch_dir in arch_dirs {
        let arch_name = arch_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(allowed) = arches {
            if !allowed.contains(&arch_name) && arch_name != SRC_ARCH {
                continue;
            }
        }

        let dest_arch_dir = side_root.join(&arch_name);
        crate::fsutil::mkdirp(&dest_arch_dir, 0o755)?;

        let mut pkg_files: Vec<PathBuf> = std::fs::read_dir(&arch_dir)
            .with_context(|| format!("failed to read arch directory {}", arch_dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "rpm").unwrap_or(false))
            .collect();
        pkg_files.sort();

        for pkg_path in pkg_files {
            match load_one(&pkg_path, &dest_arch_dir) {
                Ok(input) => inputs.push(input),
                Err(e) => {
                    warn!(package = %pkg_path.display(), error = %e, "failed to acquire package");
                    diagnostics.push(format!("{}: {e}", pkg_path.display()));
                }
            }
        }
    }

    Ok(AcquisitionOutcome { inputs, diagnostics })
}

fn acquire_local_package(path: &Path, side_root: &Path) -> Result<AcquisitionOutcome> {
    let header = reader::read_header(path)?;
    let arch_dir = side_root.join(&header.arch);
    crate::fsutil::mkdirp(&arch_dir, 0o755)?;
    let input = load_one(path, &arch_dir)?;
    Ok(AcquisitionOutcome {
        inputs: vec![input],
        diagnostics: Vec::new(),
    })
}

fn acquire_from_catalog(
    catalog: &dyn BuildCatalog,
    name: &str,
    side_root: &Path,
    arches: Option<&StringList>,
) -> Result<AcquisitionOutcome> {
    let descriptor = catalog.resolve(name)?;
    let mut inputs = Vec::new();
    let mut diagnostics = Vec::new();

    for entry in &descriptor.entries {
        if let Some(allowed) = arches {
            if !allowed.contains(&entry.arch) && entry.arch != SRC_ARCH {
                debug!(arch = %entry.arch, "skipping architecture not in scope");
                continue;
            }
        }
        if let Some(filtered) = &descriptor.module_filter_rpms {
            if filtered.contains(&entry.subpackage_identity) {
                info!(name = %entry.subpackage_identity, "suppressed by module filter.rpms");
                continue;
            }
        }

        let arch_dir = side_root.join(&entry.arch);
        crate::fsutil::mkdirp(&arch_dir, 0o755)?;
        let dest = arch_dir.join(format!("{}.rpm", entry.subpackage_identity));

        match catalog
            .download(&entry.package_url, &dest)
            .and_then(|local| load_one(&local, &arch_dir))
        {
            Ok(input) => inputs.push(input),
            Err(e) => {
                warn!(package = %entry.subpackage_identity, error = %e, "download failed");
                diagnostics.push(format!("{}: {e}", entry.subpackage_identity));
            }
        }
    }

    Ok(AcquisitionOutcome { inputs, diagnostics })
}

/// Copies `pkg_path` into `dest_arch_dir`, parses its header, and extracts
/// its payload into a sibling `<pkgfile-stem>/` subtree (§4.3, §4.6).
fn load_one(pkg_path: &Path, dest_arch_dir: &Path) -> Result<SubpackageInput> {
    let header = reader::read_header(pkg_path)?;

    let filename = pkg_path
        .file_name()
        .ok_or_else(|| crate::anyhow!("package path has no file name"))?;
    let dest_pkg_path = dest_arch_dir.join(filename);
    if pkg_path != dest_pkg_path {
        crate::fsutil::copyfile(pkg_path, &dest_pkg_path, true, true)?;
    }

    let stem = pkg_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| header.name.clone());
    let root = dest_arch_dir.join(stem);

    let files = reader::extract_package(&dest_pkg_path, &root)?;

    Ok(SubpackageInput {
        header,
        root,
        files,
    })
}
