//! The package reader (§4.3): parses one on-disk package into a [`Header`]
//! and extracts its payload into a private subtree.

pub mod file;
pub mod reader;

pub use file::{FileEntry, FileFlags, FileStat, FileType, PeerRef};
pub use reader::{extract_package, read_header, HeaderCache};
