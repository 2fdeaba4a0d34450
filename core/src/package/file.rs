//! `FileEntry` (§3): one file from one package, plus the lazily-computed
//! classifications the inspections consult (MIME type, checksum, ELF
//! classification) and the peer-matching state written in by `peers.rs`.

use crate::capability::elf::ElfKind;
use crate::fsutil;
use crate::Result;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

bitflags_like::bitflags_like! {
    /// Bitmask of package flags a file can carry (RPM's `RPMFILE_*`).
    pub struct FileFlags: u32 {
        const CONFIG = 1 << 0;
        const DOC = 1 << 1;
        const GHOST = 1 << 2;
        const NOREPLACE = 1 << 3;
        const LICENSE = 1 << 4;
        const README = 1 << 5;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileStat {
    pub mode: u32,
    pub size: u64,
}

impl FileStat {
    pub fn file_type(&self) -> FileType {
        match self.mode & 0o170000 {
            0o040000 => FileType::Directory,
            0o120000 => FileType::Symlink,
            0o020000 => FileType::CharDevice,
            0o060000 => FileType::BlockDevice,
            0o010000 => FileType::Fifo,
            0o140000 => FileType::Socket,
            _ => FileType::Regular,
        }
    }

    pub fn is_suid(&self) -> bool {
        self.mode & 0o4000 != 0
    }

    pub fn is_sgid(&self) -> bool {
        self.mode & 0o2000 != 0
    }

    pub fn is_sticky(&self) -> bool {
        self.mode & 0o1000 != 0
    }

    pub fn perm_bits(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// A back-reference to the matched `FileEntry` in the other build, expressed
/// as an index into the owning `SubpackagePeer`'s opposite-side file vector
/// rather than a pointer -- this is what keeps the peer-symmetry invariant
/// (§8.3) a consistency check instead of a lifetime hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerRef {
    pub index: usize,
}

#[derive(Debug, Default)]
struct LazyCaches {
    mime_type: Option<String>,
    checksum: Option<String>,
    elf_kind: Option<ElfKind>,
}

#[derive(Debug)]
pub struct FileEntry {
    pub localpath: String,
    pub fullpath: PathBuf,
    pub stat: FileStat,
    pub owner: String,
    pub group: String,
    pub symlink_target: Option<String>,
    pub flags: FileFlags,
    pub capabilities: Option<String>,

    pub peer: Option<PeerRef>,
    pub moved_path: bool,
    pub moved_subpackage: bool,

    caches: RefCell<LazyCaches>,
}

impl FileEntry {
    pub fn new(
        localpath: String,
        fullpath: PathBuf,
        stat: FileStat,
        owner: String,
        group: String,
        symlink_target: Option<String>,
        flags: FileFlags,
        capabilities: Option<String>,
    ) -> Self {
        Self {
            localpath,
            fullpath,
            stat,
            owner,
            group,
            symlink_target,
            flags,
            capabilities,
            peer: None,
            moved_path: false,
            moved_subpackage: false,
            caches: RefCell::new(LazyCaches::default()),
        }
    }

    pub fn basename(&self) -> &str {
        fsutil::basename(&self.localpath)
    }

    pub fn is_regular(&self) -> bool {
        self.stat.file_type() == FileType::Regular
    }

    pub fn is_symlink(&self) -> bool {
        self.stat.file_type() == FileType::Symlink
    }

    pub fn is_config(&self) -> bool {
        self.flags.contains(FileFlags::CONFIG)
    }

    pub fn is_doc(&self) -> bool {
        self.flags.contains(FileFlags::DOC)
    }

    pub fn is_ghost(&self) -> bool {
        self.flags.contains(FileFlags::GHOST)
    }

    /// Lazily computed and cached MIME type, matching `text/*` semantics
    /// used across the diff inspections.
    pub fn mime_type(&self) -> Result<String> {
        if let Some(cached) = &self.caches.borrow().mime_type {
            return Ok(cached.clone());
        }
        let mime = fsutil::mime_type(&self.fullpath)?;
        self.caches.borrow_mut().mime_type = Some(mime.clone());
        Ok(mime)
    }

    /// Lazily computed and cached sha256 hex digest of file content.
    pub fn checksum(&self) -> Result<String> {
        if let Some(cached) = &self.caches.borrow().checksum {
            return Ok(cached.clone());
        }
        use sha2::{Digest, Sha256};
        let (bytes, _) = fsutil::read_file_bytes(&self.fullpath)?;
        let digest = Sha256::digest(&bytes);
        let hex = hex::encode(digest);
        self.caches.borrow_mut().checksum = Some(hex.clone());
        Ok(hex)
    }

    /// Lazily computed ELF classification, cached as a tri-state: `Ok(None)`
    /// means "not an ELF file," distinct from an I/O error reading it.
    pub fn elf_kind(&self) -> Result<Option<ElfKind>> {
        if let Some(cached) = self.caches.borrow().elf_kind {
            return Ok(Some(cached));
        }
        if !self.is_regular() {
            return Ok(None);
        }
        match crate::capability::elf::classify(&self.fullpath)? {
            Some(kind) => {
                self.caches.borrow_mut().elf_kind = Some(kind);
                Ok(Some(kind))
            }
            None => Ok(None),
        }
    }

    pub fn resolve_symlink_in(&self, root: &Path) -> Option<PathBuf> {
        let target = self.symlink_target.as_ref()?;
        let base = Path::new(&self.localpath).parent().unwrap_or(Path::new("/"));
        let joined = if target.starts_with('/') {
            PathBuf::from(target)
        } else {
            base.join(target)
        };
        Some(root.join(joined.strip_prefix("/").unwrap_or(&joined)))
    }
}

/// A tiny internal bitflags-alike so we don't need the `bitflags` crate for
/// a six-variant mask; kept private to this module.
mod bitflags_like {
    macro_rules! bitflags_like {
        (
            $(#[$meta:meta])*
            pub struct $name:ident: $ty:ty {
                $(const $variant:ident = $value:expr;)*
            }
        ) => {
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $name($ty);

            impl $name {
                $(pub const $variant: Self = Self($value);)*

                pub const fn empty() -> Self {
                    Self(0)
                }

                pub fn contains(&self, other: Self) -> bool {
                    self.0 & other.0 == other.0
                }

                pub fn insert(&mut self, other: Self) {
                    self.0 |= other.0;
                }

                pub fn from_bits_truncate(bits: $ty) -> Self {
                    Self(bits)
                }

                pub fn bits(&self) -> $ty {
                    self.0
                }
            }

            impl std::ops::BitOr for $name {
                type Output = Self;
                fn bitor(self, rhs: Self) -> Self {
                    Self(self.0 | rhs.0)
                }
            }
        };
    }
    pub(crate) use bitflags_like;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_type_decodes_symlink_bits() {
        let stat = FileStat {
            mode: 0o120777,
            size: 0,
        };
        assert_eq!(stat.file_type(), FileType::Symlink);
    }

    #[test]
    fn file_type_decodes_regular_bits() {
        let stat = FileStat {
            mode: 0o100644,
            size: 10,
        };
        assert_eq!(stat.file_type(), FileType::Regular);
        assert!(!stat.is_suid());
    }

    #[test]
    fn suid_bit_detected() {
        let stat = FileStat {
            mode: 0o104755,
            size: 0,
        };
        assert!(stat.is_suid());
        assert_eq!(stat.perm_bits(), 0o4755);
    }

    #[test]
    fn flags_roundtrip() {
        let flags = FileFlags::CONFIG | FileFlags::NOREPLACE;
        assert!(flags.contains(FileFlags::CONFIG));
        assert!(!flags.contains(FileFlags::DOC));
    }
}
