//! The CLI surface (spec.md §6), captured as a `clap` derive struct so the
//! core can be driven identically regardless of frontend -- mirrors
//! `pkger-cli::opts`'s shape (a flat struct of global flags plus positional
//! arguments) adapted from that crate's subcommand style, since rpminspect
//! has no subcommands, just one comparison per invocation.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Xunit,
    Summary,
}

#[derive(Debug, Parser)]
#[command(
    name = "rpminspect",
    version,
    about = "Compares two RPM builds and reports packaging regressions"
)]
pub struct Opts {
    /// Override configuration file.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Apply a named profile overlay.
    #[arg(short = 'p', long = "profile", value_name = "NAME")]
    pub profile: Option<String>,

    /// Comma-separated inspection names to enable. `ALL` selects every
    /// inspection. Mutually exclusive with `-E`.
    #[arg(short = 'T', long = "tests", value_delimiter = ',', conflicts_with = "exclude")]
    pub tests: Vec<String>,

    /// Comma-separated inspection names to disable. Mutually exclusive with
    /// `-T`.
    #[arg(short = 'E', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Restrict to these architectures (comma-separated).
    #[arg(short = 'a', long = "arches", value_delimiter = ',')]
    pub arches: Vec<String>,

    /// Override the derived product release string.
    #[arg(short = 'r', long = "release", value_name = "STR")]
    pub release: Option<String>,

    /// Disable rebase detection.
    #[arg(short = 'n', long = "no-rebase")]
    pub no_rebase: bool,

    /// Write formatted output to FILE (default stdout).
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(short = 'F', long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Severity threshold that fails the run.
    #[arg(short = 't', long = "threshold", value_name = "SEV", default_value = "VERIFY")]
    pub threshold: String,

    /// Suppress displaying results below SEV.
    #[arg(short = 's', long = "suppress", value_name = "SEV")]
    pub suppress: Option<String>,

    /// List inspections and formats, then exit.
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Workdir (default `/var/tmp/rpminspect`).
    #[arg(short = 'w', long = "workdir", value_name = "PATH")]
    pub workdir: Option<PathBuf>,

    /// Fetch-only; implies `-k`.
    #[arg(short = 'f', long = "fetch-only")]
    pub fetch_only: bool,

    /// Keep workdir on exit.
    #[arg(short = 'k', long = "keep")]
    pub keep: bool,

    /// Debug trace on stderr.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Dump effective configuration and exit.
    #[arg(short = 'D', long = "dump-config")]
    pub dump_config: bool,

    /// Verbose progress.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// The build(s) to compare: one positional argument runs single-build
    /// inspection on `after` only; two run `before after`.
    #[arg(value_name = "BUILD", num_args = 0..=2)]
    pub builds: Vec<String>,
}

impl Opts {
    pub fn parse_args() -> Self {
        Opts::parse()
    }

    /// Splits `builds` into `(before, after)` per spec.md §4.6: the last
    /// positional argument is always `after`; an optional first argument is
    /// `before`.
    pub fn before_after(&self) -> (Option<&str>, Option<&str>) {
        match self.builds.as_slice() {
            [] => (None, None),
            [after] => (None, Some(after.as_str())),
            [before, after] => (Some(before.as_str()), Some(after.as_str())),
            _ => (None, None),
        }
    }
}
