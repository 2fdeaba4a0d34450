//! `ElfReader` capability (DESIGN NOTES §9): open a file, classify it,
//! enumerate sections, `DT_*` dynamic tags, and SONAME. Backed by `goblin`,
//! the ELF parser several pack repos (e.g. `axodotdev-cargo-dist`) already
//! depend on for the same purpose.

use crate::{ErrContext, Result};

use goblin::elf::Elf;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElfKind {
    /// `ET_REL` -- a `.o`/`.a` member, not loadable on its own.
    Archive,
    /// `ET_EXEC`/`ET_DYN` with no dynamic section -- a plain static
    /// executable.
    File,
    /// `ET_EXEC` with a dynamic section -- a dynamically linked executable.
    Executable,
    /// `ET_DYN` with a dynamic section -- a shared library.
    SharedLibrary,
}

#[derive(Clone, Debug, Default)]
pub struct ElfInfo {
    pub kind: ElfKind,
    pub soname: Option<String>,
    pub needed: Vec<String>,
    pub rpath: Option<String>,
    pub runpath: Option<String>,
    pub sections: Vec<String>,
    pub symbols: Vec<String>,
}

impl Default for ElfKind {
    fn default() -> Self {
        ElfKind::File
    }
}

/// Returns `Ok(None)` for anything that isn't a parseable ELF file (the
/// common case -- most files in a package aren't ELF), `Ok(Some(..))` for
/// one that is, and `Err` only for an I/O failure reading the file.
pub fn classify(path: &Path) -> Result<Option<ElfKind>> {
    Ok(read(path)?.map(|info| info.kind))
}

/// Parses the full set of information the representative inspections need:
/// classification, `SONAME`, `DT_NEEDED`, `DT_RPATH`/`DT_RUNPATH`, section
/// names and the dynamic symbol table. Returns `Ok(None)` when the file is
/// not an ELF object (bad magic), rather than an error -- every file in a
/// package tree is probed this way and most aren't ELF.
pub fn read(path: &Path) -> Result<Option<ElfInfo>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    if bytes.len() < 4 || &bytes[0..4] != b"\x7fELF" {
        return Ok(None);
    }

    let elf = match Elf::parse(&bytes) {
        Ok(elf) => elf,
        Err(_) => return Ok(None),
    };

    let has_dynamic = elf.dynamic.is_some();
    let kind = match elf.header.e_type {
        goblin::elf::header::ET_REL => ElfKind::Archive,
        goblin::elf::header::ET_EXEC if has_dynamic => ElfKind::Executable,
        goblin::elf::header::ET_EXEC => ElfKind::File,
        goblin::elf::header::ET_DYN if has_dynamic => ElfKind::SharedLibrary,
        goblin::elf::header::ET_DYN => ElfKind::File,
        _ => ElfKind::File,
    };

    let soname = elf.soname.map(str::to_string);
    let needed = elf.libraries.iter().map(|s| s.to_string()).collect();
    let rpath = elf.rpaths.first().map(|s| s.to_string());
    let runpath = elf.runpaths.first().map(|s| s.to_string());

    let sections = elf
        .section_headers
        .iter()
        .filter_map(|sh| elf.shdr_strtab.get_at(sh.sh_name))
        .map(str::to_string)
        .collect();

    let symbols = elf
        .dynsyms
        .iter()
        .filter_map(|sym| elf.dynstrtab.get_at(sym.st_name))
        .map(str::to_string)
        .collect();

    Ok(Some(ElfInfo {
        kind,
        soname,
        needed,
        rpath,
        runpath,
        sections,
        symbols,
    }))
}

/// `true` if `info` carries any of the named debug sections.
pub fn has_any_section(info: &ElfInfo, names: &[&str]) -> bool {
    names
        .iter()
        .any(|name| info.sections.iter().any(|s| s == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_elf_file_classifies_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-elf");
        std::fs::write(&path, b"just text, not an object file").unwrap();
        assert!(classify(&path).unwrap().is_none());
    }

    #[test]
    fn truncated_elf_magic_classifies_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short");
        std::fs::write(&path, b"\x7fEL").unwrap();
        assert!(classify(&path).unwrap().is_none());
    }

    #[test]
    fn has_any_section_checks_membership() {
        let info = ElfInfo {
            sections: vec![".text".into(), ".debug_info".into()],
            ..Default::default()
        };
        assert!(has_any_section(&info, &[".debug_info", ".symtab"]));
        assert!(!has_any_section(&info, &[".symtab", ".gdb_index"]));
    }
}
