//! Wires the CLI flags onto `rpminspect_core::config` (§4.4, SPEC_FULL
//! §10.3): locates the config file(s) + profile overlay, loads them through
//! the `yaml`/`json` `ConfigSource` implementations, then folds in the CLI
//! overrides that take precedence over anything in a config file.

use crate::opts::Opts;

use rpminspect_core::config::{self, ConfigSource, RunConfig};
use rpminspect_core::strutil::StringList;
use rpminspect_core::{Context as _, Result};

use std::path::Path;

/// Parses `path` with the format implied by its extension (`.json` is JSON,
/// everything else is treated as YAML -- YAML is a superset of JSON syntax
/// so this also accepts a JSON file with a non-`.json` extension).
fn read_source(path: &Path) -> Result<Box<dyn ConfigSource>> {
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        Ok(Box::new(config::json::JsonConfigSource::from_file(path)?))
    } else {
        Ok(Box::new(config::yaml::YamlConfigSource::from_file(path)?))
    }
}

/// Loads the base `RunConfig`: the `-c` file if given (fatal if missing or
/// malformed, §4.4), then the `-p` profile overlay if given, then applies
/// every CLI override onto the result.
///
/// The profile overlay's directory comes from the main config's
/// `common.profiledir`, which we only know after a first parse -- so the
/// main config file is read once to discover `profiledir`, then both
/// sources are applied together in one pass to get the final layered
/// result (§4.4's "later documents overlay earlier ones").
pub fn load(opts: &Opts) -> Result<RunConfig> {
    let mut sources: Vec<Box<dyn ConfigSource>> = Vec::new();
    if let Some(path) = &opts.config {
        sources.push(
            read_source(path)
                .with_context(|| format!("failed to load configuration file {}", path.display()))?,
        );
    }

    let preliminary = config::load(&sources)?;

    if let Some(profile_source) =
        config::load_profile_overlay(preliminary.profiledir.as_deref(), opts.profile.as_deref())?
    {
        sources.push(profile_source);
    }

    let mut run_config = if sources.is_empty() {
        preliminary
    } else {
        config::load(&sources)?
    };

    apply_cli_overrides(&mut run_config, opts)?;
    Ok(run_config)
}

fn apply_cli_overrides(cfg: &mut RunConfig, opts: &Opts) -> Result<()> {
    if let Some(workdir) = &opts.workdir {
        cfg.workdir = workdir.clone();
    }
    if opts.no_rebase {
        cfg.rebase_detection = false;
    }
    cfg.threshold = opts.threshold.parse()?;
    if let Some(suppress) = &opts.suppress {
        cfg.suppress = Some(suppress.parse()?);
    }
    if !opts.arches.is_empty() {
        cfg.arches = Some(opts.arches.iter().cloned().collect::<StringList>());
    }
    if let Some(release) = &opts.release {
        cfg.product_release_override = Some(release.clone());
    }
    cfg.keep_workdir = opts.keep || opts.fetch_only;
    Ok(())
}
