#[macro_use]
extern crate lazy_static;

pub mod build;
pub mod capability;
pub mod config;
pub mod fsutil;
pub mod header;
pub mod inspect;
pub mod package;
pub mod peers;
pub mod policy;
pub mod rebase;
pub mod results;
pub mod run;
pub mod strutil;

pub use anyhow::{anyhow, Context, Error, Result};
pub use anyhow::Context as ErrContext;

/// Constructs an `Err(Error)` from a formatted string, mirroring the shorthand
/// used throughout the inspection drivers.
#[macro_export]
macro_rules! err {
    ($it:ident) => {
        Err($crate::Error::msg($it))
    };
    ($lit:literal) => {
        Err($crate::Error::msg($lit))
    };
    ($($tt:tt)*) => {
        Err($crate::Error::msg(format!($($tt)*)))
    };
}

pub use run::Run;
