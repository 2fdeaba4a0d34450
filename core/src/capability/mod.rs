//! The capabilities DESIGN NOTES §9 asks for in place of direct
//! `libelf`/`libcap`/`libclamav`/`libabigail` bindings: small traits (here,
//! free-function modules, since each has exactly one implementation in this
//! crate) that the representative inspections consume instead of reaching
//! for a C ABI directly.

pub mod caps;
pub mod diff;
pub mod elf;
