//! Recursive mkdir/rmtree, byte-exact file comparison, archive extraction and
//! MIME classification. Grounded in `pkger-core`'s `archive.rs`, generalized
//! from "unpack a build context tarball" to the handful of extraction and
//! comparison primitives the acquisition and diff inspections need.

use crate::{ErrContext, Result};

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, trace};

/// Creates `path` and all missing parents with `mode`. Idempotent; fails if
/// any path component exists and is not a directory.
pub fn mkdirp(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(anyhow::anyhow!(
            "{} exists and is not a directory",
            path.display()
        ));
    }

    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("failed to chmod {}", path.display()))?;
    }
    #[cfg(not(unix))]
    {
        let _ = mode;
    }

    Ok(())
}

/// Post-order removal of `path`. With `ignore_errors`, an absent `path`
/// yields success. With `contents_only`, the top-level directory itself is
/// preserved.
pub fn rmtree(path: impl AsRef<Path>, ignore_errors: bool, contents_only: bool) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return if ignore_errors {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{} does not exist", path.display()))
        };
    }

    let result = if contents_only {
        (|| -> io::Result<()> {
            for entry in fs::read_dir(path)? {
                let entry = entry?;
                let entry_path = entry.path();
                if entry_path.is_dir() && !entry_path.is_symlink() {
                    fs::remove_dir_all(&entry_path)?;
                } else {
                    fs::remove_file(&entry_path)?;
                }
            }
            Ok(())
        })()
    } else {
        fs::remove_dir_all(path)
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if ignore_errors => {
            trace!(path = %path.display(), error = %e, "ignoring rmtree error");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// Standard byte copy with optional mode carry-over and symlink handling.
pub fn copyfile(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    preserve_mode: bool,
    follow_symlinks: bool,
) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !follow_symlinks && src.is_symlink() {
        let target = fs::read_link(src)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, dst)
            .with_context(|| format!("failed to symlink {}", dst.display()))?;
        #[cfg(not(unix))]
        fs::copy(src, dst).with_context(|| format!("failed to copy {}", dst.display()))?;
        return Ok(());
    }

    fs::copy(src, dst).with_context(|| format!("failed to copy to {}", dst.display()))?;

    if preserve_mode {
        let perms = fs::metadata(src)?.permissions();
        fs::set_permissions(dst, perms)
            .with_context(|| format!("failed to set permissions on {}", dst.display()))?;
    }

    Ok(())
}

/// Recursively copies `src` into `dst`, creating directories as needed.
pub fn copytree(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    mkdirp(dst, 0o755)?;

    for entry in walkdir::WalkDir::new(src).min_depth(1) {
        let entry = entry.context("failed to walk source tree")?;
        let rel = entry.path().strip_prefix(src).unwrap();
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            mkdirp(&target, 0o755)?;
        } else if entry.file_type().is_symlink() {
            copyfile(entry.path(), &target, false, false)?;
        } else {
            if let Some(parent) = target.parent() {
                mkdirp(parent, 0o755)?;
            }
            copyfile(entry.path(), &target, true, true)?;
        }
    }

    Ok(())
}

/// Returns `Ok(true)` iff both files exist, have equal size, and equal
/// bytes. Size mismatch short-circuits without reading content.
pub fn filecmp(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<bool> {
    let a = a.as_ref();
    let b = b.as_ref();

    let (meta_a, meta_b) = match (fs::metadata(a), fs::metadata(b)) {
        (Ok(x), Ok(y)) => (x, y),
        _ => return Ok(false),
    };

    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }

    let (bytes_a, _) = read_file_bytes(a)?;
    let (bytes_b, _) = read_file_bytes(b)?;
    Ok(bytes_a == bytes_b)
}

/// Reads a whole file into a byte buffer, returning the buffer and its
/// length.
pub fn read_file_bytes(path: impl AsRef<Path>) -> Result<(Vec<u8>, usize)> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let len = bytes.len();
    Ok((bytes, len))
}

/// Reads a file into a sequence of lines with line endings stripped.
pub fn read_file_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let (bytes, _) = read_file_bytes(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().map(str::to_string).collect())
}

/// Extracts a POSIX archive (tar, optionally gzip-compressed) into `dst`,
/// preserving mode and mtimes. With `force`, removes destination collisions
/// first.
pub fn unpack_archive(src: impl AsRef<Path>, dst: impl AsRef<Path>, force: bool) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    debug!(src = %src.display(), dst = %dst.display(), "unpacking archive");

    if force && dst.exists() {
        rmtree(dst, true, false)?;
    }
    mkdirp(dst, 0o755)?;

    let file = File::open(src).with_context(|| format!("failed to open {}", src.display()))?;

    let is_gzip = src
        .extension()
        .map(|e| e == "gz" || e == "tgz")
        .unwrap_or(false);

    if is_gzip {
        let mut archive = Archive::new(GzDecoder::new(file));
        archive
            .unpack(dst)
            .with_context(|| format!("failed to extract {}", src.display()))?;
    } else {
        let mut archive = Archive::new(file);
        archive
            .unpack(dst)
            .with_context(|| format!("failed to extract {}", src.display()))?;
    }

    Ok(())
}

/// Classifies `path`'s MIME type the way a libmagic-equivalent classifier
/// would: extension-assisted with a content sniff for ambiguous cases, so
/// extensionless payload files (common once an RPM is extracted) still
/// classify correctly. `text/*` implies treat-as-text for diffing.
pub fn mime_type(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    if let Some(guess) = mime_guess::from_path(path).first() {
        return Ok(guess.essence_str().to_string());
    }

    let mut buf = [0u8; 8192];
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let n = file.read(&mut buf).unwrap_or(0);
    let content_type = content_inspector::inspect(&buf[..n]);

    Ok(match content_type {
        content_inspector::ContentType::BINARY => "application/octet-stream".to_string(),
        _ => "text/plain".to_string(),
    })
}

/// Decompresses a gzip/bzip2/xz member fully into memory; used by the
/// changedfiles inspection's compression-aware comparison.
pub fn decompress_to_bytes(path: impl AsRef<Path>, mime: &str) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut out = Vec::new();

    if mime.contains("gzip") {
        GzDecoder::new(file)
            .read_to_end(&mut out)
            .context("failed to gunzip")?;
    } else {
        // bzip2/xz decompression is out of this crate's dependency surface;
        // callers fall back to raw bytes, which still lets digest-based
        // comparison work even if the decompressed-diff path is skipped.
        return read_file_bytes(path).map(|(b, _)| b);
    }

    Ok(out)
}

pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Joins `prefix` (normalized to end with `/`) against `path`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

#[allow(dead_code)]
pub(crate) fn unique_workdir_name(run_id: &str) -> PathBuf {
    PathBuf::from(run_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mkdirp_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        mkdirp(&nested, 0o755).unwrap();
        mkdirp(&nested, 0o755).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn mkdirp_rejects_file_component() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("blocker");
        fs::write(&file_path, b"x").unwrap();
        let nested = file_path.join("child");
        assert!(mkdirp(&nested, 0o755).is_err());
    }

    #[test]
    fn rmtree_contents_only_preserves_top() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f"), b"x").unwrap();
        rmtree(dir.path(), false, true).unwrap();
        assert!(dir.path().exists());
        assert!(!dir.path().join("f").exists());
    }

    #[test]
    fn rmtree_missing_path_ignore_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(rmtree(&missing, true, false).is_ok());
        assert!(rmtree(&missing, false, false).is_err());
    }

    #[test]
    fn filecmp_detects_size_mismatch_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"short").unwrap();
        fs::write(&b, b"much longer content").unwrap();
        assert!(!filecmp(&a, &b).unwrap());
    }

    #[test]
    fn filecmp_true_for_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"same").unwrap();
        fs::write(&b, b"same").unwrap();
        assert!(filecmp(&a, &b).unwrap());
    }

    #[test]
    fn read_file_lines_strips_endings() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f");
        fs::write(&p, b"one\ntwo\r\nthree").unwrap();
        assert_eq!(read_file_lines(&p).unwrap(), vec!["one", "two", "three"]);
    }

    #[test]
    fn normalize_prefix_ensures_trailing_slash() {
        assert_eq!(normalize_prefix("/usr/share"), "/usr/share/");
        assert_eq!(normalize_prefix("/usr/share/"), "/usr/share/");
    }
}
