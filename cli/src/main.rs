//! `rpminspect` (spec.md §6): the thin frontend -- parses the CLI surface,
//! wires a `RunConfig` from flags and an optional config file, drives
//! `rpminspect_core::Run` through acquisition, peer matching and inspection
//! dispatch, and renders the results with one of the four formatters.
//! Mirrors `pkger-cli::main`'s shape: parse opts, set up logging, build the
//! thing the core crate owns, run it, map errors to a process exit code.

mod catalog;
mod config_load;
mod format;
mod logging;
mod opts;

use opts::Opts;
use rpminspect_core::build::BuildSpec;
use rpminspect_core::inspect;
use rpminspect_core::{Error, Result};

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let opts = Opts::parse_args();
    logging::init(opts.debug, opts.verbose);

    match run(&opts) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(reason = %format!("{error:?}"), "rpminspect aborted");
            eprintln!("rpminspect: {error:?}");
            ExitCode::from(2)
        }
    }
}

fn run(opts: &Opts) -> Result<ExitCode> {
    if opts.list {
        let stdout = io::stdout();
        format::list_inspections_and_formats(&mut stdout.lock())?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = config_load::load(opts)?;

    if opts.dump_config {
        print!("{}", config.dump_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let (before_str, after_str) = opts.before_after();
    let after_str = after_str.ok_or_else(|| Error::msg("no build specified; provide at least AFTER"))?;

    let before_spec = before_str.map(build_spec_from_str);
    let after_spec = Some(build_spec_from_str(after_str));

    let enabled_mask = enabled_mask(&config, opts);
    let catalog = catalog::LocalOnlyCatalog;

    let mut run = rpminspect_core::Run::new(
        config,
        before_spec,
        after_spec,
        Some(&catalog),
        opts.release.as_deref(),
    )?;

    if !opts.fetch_only {
        inspect::dispatch(&mut run, enabled_mask);
    }

    let exit_code = if run.results.worst_severity() >= run.config.threshold {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    };

    write_output(opts, &run)?;
    run.cleanup()?;

    Ok(exit_code)
}

fn enabled_mask(config: &rpminspect_core::config::RunConfig, opts: &Opts) -> u64 {
    let mut mask = inspect::all_mask();

    for entry in inspect::registry() {
        if !config.inspection_enabled(entry.name) {
            mask &= !entry.flag_bit;
        }
    }

    if !opts.tests.is_empty() {
        let names: rpminspect_core::strutil::StringList = opts.tests.iter().cloned().collect();
        mask = inspect::mask_from_names(&names);
    } else if !opts.exclude.is_empty() {
        let names: rpminspect_core::strutil::StringList = opts.exclude.iter().cloned().collect();
        mask &= !inspect::mask_from_names(&names);
    }

    mask
}

fn build_spec_from_str(spec: &str) -> BuildSpec {
    if spec.starts_with("http://") || spec.starts_with("https://") {
        return BuildSpec::RemotePackageUrl(spec.to_string());
    }

    let path = Path::new(spec);
    if path.is_dir() {
        BuildSpec::LocalDirectory(path.to_path_buf())
    } else if path.is_file() {
        BuildSpec::LocalPackage(path.to_path_buf())
    } else {
        BuildSpec::Named(spec.to_string())
    }
}

fn write_output(opts: &Opts, run: &rpminspect_core::Run) -> Result<()> {
    let suppress = run.config.suppress;
    match &opts.output {
        Some(path) => {
            let mut file = File::create(path)?;
            format::render(opts.format, &run.results, suppress, &mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let result = format::render(opts.format, &run.results, suppress, &mut lock);
            let _ = lock.flush();
            result
        }
    }
}
