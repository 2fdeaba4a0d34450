//! The one real [`BuildCatalog`] implementation SPEC_FULL §12 promises: a
//! local/single-file catalog that treats a "named build" as a directory on
//! disk laid out the same way `BuildSpec::LocalDirectory` expects
//! (`<arch>/*.rpm`), and a "download" as a plain filesystem copy. A remote
//! Koji-style catalog is a documented seam (`rpminspect_core::build::BuildCatalog`)
//! for a frontend that needs one, not something this crate implements.

use rpminspect_core::build::{BuildCatalog, BuildDescriptor, BuildDescriptorEntry};
use rpminspect_core::header::SRC_ARCH;
use rpminspect_core::{Context as _, Result};

use std::path::{Path, PathBuf};

pub struct LocalOnlyCatalog;

impl BuildCatalog for LocalOnlyCatalog {
    fn resolve(&self, spec: &str) -> Result<BuildDescriptor> {
        let root = Path::new(spec);
        if !root.is_dir() {
            return Err(rpminspect_core::anyhow!(
                "'{spec}' is not a local build directory; no remote catalog is configured"
            ));
        }

        let mut entries = Vec::new();
        let mut arch_dirs: Vec<PathBuf> = std::fs::read_dir(root)
            .with_context(|| format!("failed to read build directory {}", root.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        arch_dirs.sort();

        for arch_dir in arch_dirs {
            let arch = arch_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if arch.is_empty() {
                continue;
            }

            let mut pkgs: Vec<PathBuf> = std::fs::read_dir(&arch_dir)
                .with_context(|| format!("failed to read arch directory {}", arch_dir.display()))?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map(|e| e == "rpm").unwrap_or(false))
                .collect();
            pkgs.sort();

            for pkg in pkgs {
                let identity = pkg
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                entries.push(BuildDescriptorEntry {
                    arch: if arch == SRC_ARCH { SRC_ARCH.to_string() } else { arch.clone() },
                    package_url: pkg.display().to_string(),
                    subpackage_identity: identity,
                });
            }
        }

        Ok(BuildDescriptor {
            entries,
            module_filter_rpms: None,
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        let source = url.strip_prefix("file://").unwrap_or(url);
        let source = Path::new(source);
        if !source.is_file() {
            return Err(rpminspect_core::anyhow!(
                "'{url}' is not a local file and no remote transport is configured"
            ));
        }
        std::fs::copy(source, dest)
            .with_context(|| format!("failed to copy {} to {}", source.display(), dest.display()))?;
        Ok(dest.to_path_buf())
    }
}
