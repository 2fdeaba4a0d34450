//! Shared driver for the closed-vocabulary inspections SPEC_FULL §11 leaves
//! as registry entries without a real body (`metadata`, `license`, `elf`, …).
//! The driver itself adds no records; dispatch's "synthesize a DIAGNOSTIC
//! note when an inspection left no records" step (§4.10) fires for it using
//! the registry entry's own name, so the note carries the right header
//! without this module needing to know which entry invoked it.

use crate::run::Run;

pub fn driver(_run: &mut Run) -> bool {
    true
}
