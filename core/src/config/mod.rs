//! Configuration store (§4.4) and the immutable `RunConfig` every inspection
//! consults (§3). Mirrors `pkger-core::recipe::metadata`'s "deserialize a
//! loosely typed `Rep`, then `TryFrom` into a strongly typed value" shape,
//! generalized to layered documents instead of one recipe file.

pub mod json;
pub mod yaml;

use crate::strutil::{StringList, StringListMap, StringMap};
use crate::{Context as _, Result};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// DESIGN NOTES §9's `ConfigSource`: the single trait both the YAML and
/// JSON readers implement, so the loader never depends on which document
/// format it came from. `path` is an ordered list of keys, e.g.
/// `["runpath", "allowed_paths"]`.
pub trait ConfigSource {
    fn get_string(&self, path: &[&str]) -> Option<String>;
    fn get_bool(&self, path: &[&str]) -> Option<bool>;
    fn get_u64(&self, path: &[&str]) -> Option<u64>;
    fn for_each_in_array(&self, path: &[&str], f: &mut dyn FnMut(&str));
    fn for_each_in_mapping(&self, path: &[&str], f: &mut dyn FnMut(&str, &str));
    /// Invokes `f` with each key under `path` whose value is itself a
    /// mapping or array (used for `inspections:` on/off and `products:`).
    fn for_each_key(&self, path: &[&str], f: &mut dyn FnMut(&str));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FavorRelease {
    None,
    Oldest,
    Newest,
}

impl Default for FavorRelease {
    fn default() -> Self {
        FavorRelease::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModularityStaticContext {
    Null,
    Required,
    Forbidden,
    Recommend,
}

impl Default for ModularityStaticContext {
    fn default() -> Self {
        ModularityStaticContext::Null
    }
}

#[derive(Clone, Debug, Default)]
pub struct VendorConfig {
    pub vendor_data_dir: Option<PathBuf>,
    pub licensedb: Vec<String>,
    pub favor_release: FavorRelease,
}

#[derive(Clone, Debug, Default)]
pub struct MetadataConfig {
    pub vendor: Option<String>,
    pub buildhost_subdomain: StringList,
    pub badwords: StringList,
}

#[derive(Clone, Debug, Default)]
pub struct PathPatternConfig {
    pub include_path: Option<String>,
    pub exclude_path: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ChangedFilesConfig {
    pub header_file_extensions: StringList,
}

#[derive(Clone, Debug, Default)]
pub struct AddedFilesConfig {
    pub forbidden_path_prefixes: StringList,
    pub forbidden_path_suffixes: StringList,
    pub forbidden_directories: StringList,
}

#[derive(Clone, Debug, Default)]
pub struct OwnershipConfig {
    pub bin_paths: StringList,
    pub bin_owner: Option<String>,
    pub bin_group: Option<String>,
    pub forbidden_owners: StringList,
    pub forbidden_groups: StringList,
}

#[derive(Clone, Debug, Default)]
pub struct FilesizeConfig {
    /// `None` means the "info" sentinel: always report but never fail.
    pub size_threshold: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct SpecnameConfig {
    /// `full | prefix | suffix`.
    pub match_mode: String,
    /// `name | filename`.
    pub primary: String,
}

#[derive(Clone, Debug, Default)]
pub struct AnnocheckConfig {
    pub tests: StringMap,
    pub failure_severity: Option<String>,
    pub profile: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PathMigrationConfig {
    pub migrated_paths: StringMap,
    pub excluded_paths: StringList,
}

#[derive(Clone, Debug, Default)]
pub struct AbiDiffLikeConfig {
    pub suppression_file: Option<String>,
    pub debuginfo_path: Option<String>,
    pub include_path: Option<String>,
    pub extra_args: Option<String>,
    /// `abidiff`-only.
    pub security_level_threshold: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct PatchesConfig {
    pub ignore_list: StringList,
    pub file_count_threshold: Option<u64>,
    pub line_count_threshold: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct RunpathConfig {
    pub allowed_paths: StringList,
    pub allowed_origin_paths: StringList,
    pub origin_prefix_trim: StringList,
}

#[derive(Clone, Debug, Default)]
pub struct UnicodeConfig {
    pub exclude: Option<String>,
    pub excluded_mime_types: StringList,
    /// Parsed from hex strings, e.g. `"202e"` -> `0x202e`.
    pub forbidden_codepoints: Vec<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct DebuginfoConfig {
    pub debuginfo_sections: StringList,
    pub debuginfo_path: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ModularityConfig {
    pub static_context: ModularityStaticContext,
    pub release: StringMap,
}

#[derive(Clone, Debug, Default)]
pub struct CommandsConfig {
    pub diff: Option<String>,
    pub diffstat: Option<String>,
    pub msgunfmt: Option<String>,
    pub desktop_file_validate: Option<String>,
    pub annocheck: Option<String>,
    pub abidiff: Option<String>,
    pub kmidiff: Option<String>,
    pub udevadm: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct KojiConfig {
    pub hub: Option<String>,
    pub download_ursine: Option<String>,
    pub download_mbs: Option<String>,
}

/// The immutable value every inspection consults (§3 `RunConfig`). Built
/// once by [`load`] and threaded through the `Run` for the rest of the
/// process's life.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub workdir: PathBuf,
    pub profiledir: Option<PathBuf>,

    pub koji: KojiConfig,
    pub commands: CommandsConfig,
    pub vendor: VendorConfig,

    /// `inspection-name -> enabled`; absent entries default to enabled.
    pub inspections: HashMap<String, bool>,
    pub products: StringMap,
    pub ignore: StringList,
    pub security_path_prefix: StringList,
    pub metadata: MetadataConfig,

    pub elf: PathPatternConfig,
    pub manpage: PathPatternConfig,
    pub xml: PathPatternConfig,
    pub desktop_entry_files_dir: Option<String>,

    pub changedfiles: ChangedFilesConfig,
    pub addedfiles: AddedFilesConfig,
    pub ownership: OwnershipConfig,
    pub shellsyntax_shells: StringList,
    pub filesize: FilesizeConfig,
    pub lto_symbol_name_prefixes: StringList,
    pub specname: SpecnameConfig,
    pub annocheck: AnnocheckConfig,
    /// `product-release -> minimum JVM major version`.
    pub javabytecode: StringMap,
    pub pathmigration: PathMigrationConfig,
    pub forbidden_paths: StringList,
    pub abidiff: AbiDiffLikeConfig,
    pub kmidiff: AbiDiffLikeConfig,
    pub patches: PatchesConfig,
    pub badfuncs: StringList,
    pub runpath: RunpathConfig,
    pub unicode: UnicodeConfig,
    /// `dependency-type -> ignore regex`.
    pub rpmdeps_ignore: StringMap,
    pub debuginfo: DebuginfoConfig,
    pub udevrules_dirs: StringList,
    pub modularity: ModularityConfig,

    pub rebase_detection: bool,
    pub threshold: crate::results::Severity,
    pub suppress: Option<crate::results::Severity>,
    pub arches: Option<StringList>,
    pub product_release_override: Option<String>,
    pub keep_workdir: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            profiledir: None,
            koji: KojiConfig::default(),
            commands: CommandsConfig::default(),
            vendor: VendorConfig::default(),
            inspections: HashMap::new(),
            products: StringMap::new(),
            ignore: StringList::new(),
            security_path_prefix: StringList::new(),
            metadata: MetadataConfig::default(),
            elf: PathPatternConfig::default(),
            manpage: PathPatternConfig::default(),
            xml: PathPatternConfig::default(),
            desktop_entry_files_dir: None,
            changedfiles: ChangedFilesConfig::default(),
            addedfiles: AddedFilesConfig::default(),
            ownership: OwnershipConfig::default(),
            shellsyntax_shells: StringList::new(),
            filesize: FilesizeConfig::default(),
            lto_symbol_name_prefixes: StringList::new(),
            specname: SpecnameConfig {
                match_mode: "full".to_string(),
                primary: "name".to_string(),
            },
            annocheck: AnnocheckConfig::default(),
            javabytecode: StringMap::new(),
            pathmigration: PathMigrationConfig::default(),
            forbidden_paths: StringList::new(),
            abidiff: AbiDiffLikeConfig::default(),
            kmidiff: AbiDiffLikeConfig::default(),
            patches: PatchesConfig::default(),
            badfuncs: StringList::new(),
            runpath: RunpathConfig::default(),
            unicode: UnicodeConfig::default(),
            rpmdeps_ignore: StringMap::new(),
            debuginfo: DebuginfoConfig::default(),
            udevrules_dirs: StringList::new(),
            modularity: ModularityConfig::default(),
            rebase_detection: true,
            threshold: crate::results::Severity::Verify,
            suppress: None,
            arches: None,
            product_release_override: None,
            keep_workdir: false,
        }
    }
}

fn default_workdir() -> PathBuf {
    PathBuf::from("/var/tmp/rpminspect")
}

impl RunConfig {
    /// `true` unless explicitly disabled in `inspections:`.
    pub fn inspection_enabled(&self, name: &str) -> bool {
        self.inspections.get(name).copied().unwrap_or(true)
    }

    /// Renders the merged configuration back out as YAML for `-D` (SPEC_FULL
    /// §10.3). `RunConfig` doesn't derive `Serialize` directly -- several
    /// fields (`Severity`, `PathBuf`) don't carry the shape a config file
    /// would use -- so this builds the document by hand from the same
    /// sections `apply` reads.
    pub fn dump_yaml(&self) -> Result<String> {
        use serde_yaml::Value;

        let mut common = serde_yaml::Mapping::new();
        common.insert("workdir".into(), self.workdir.display().to_string().into());
        if let Some(p) = &self.profiledir {
            common.insert("profiledir".into(), p.display().to_string().into());
        }

        let mut inspections = serde_yaml::Mapping::new();
        for entry in crate::inspect::registry() {
            inspections.insert(
                entry.name.into(),
                if self.inspection_enabled(entry.name) { "on" } else { "off" }.into(),
            );
        }

        let mut root = serde_yaml::Mapping::new();
        root.insert("common".into(), Value::Mapping(common));
        root.insert("inspections".into(), Value::Mapping(inspections));
        root.insert(
            "ignore".into(),
            Value::Sequence(self.ignore.iter().map(|s| Value::from(s.clone())).collect()),
        );
        root.insert(
            "security_path_prefix".into(),
            Value::Sequence(
                self.security_path_prefix
                    .iter()
                    .map(|s| Value::from(s.clone()))
                    .collect(),
            ),
        );
        root.insert("rebase_detection".into(), self.rebase_detection.into());
        root.insert("threshold".into(), self.threshold.as_str().into());
        if let Some(s) = self.suppress {
            root.insert("suppress".into(), s.as_str().into());
        }
        if let Some(arches) = &self.arches {
            root.insert(
                "arches".into(),
                Value::Sequence(arches.iter().map(|s| Value::from(s.clone())).collect()),
            );
        }
        if let Some(r) = &self.product_release_override {
            root.insert("release".into(), r.clone().into());
        }
        root.insert("keep_workdir".into(), self.keep_workdir.into());

        serde_yaml::to_string(&Value::Mapping(root)).context("failed to render effective configuration")
    }
}

/// Loads zero or more config documents (later documents overlay earlier
/// ones, §4.4) plus an optional profile overlay, and folds them into a
/// `RunConfig`. Unknown top-level sections are ignored with a `warn!`.
pub fn load(sources: &[Box<dyn ConfigSource>]) -> Result<RunConfig> {
    let mut config = RunConfig::default();

    for source in sources {
        apply(source.as_ref(), &mut config)?;
    }

    Ok(config)
}

/// Locates and parses the profile overlay file for `profile` under
/// `profiledir`, returning `None` when no profile was requested.
pub fn load_profile_overlay(
    profiledir: Option<&Path>,
    profile: Option<&str>,
) -> Result<Option<Box<dyn ConfigSource>>> {
    let (dir, name) = match (profiledir, profile) {
        (Some(d), Some(n)) => (d, n),
        _ => return Ok(None),
    };
    let yaml_path = dir.join(format!("{name}.yaml"));
    let json_path = dir.join(format!("{name}.json"));

    if yaml_path.exists() {
        Ok(Some(Box::new(yaml::YamlConfigSource::from_file(&yaml_path)?)))
    } else if json_path.exists() {
        Ok(Some(Box::new(json::JsonConfigSource::from_file(&json_path)?)))
    } else {
        Err(crate::anyhow!(
            "profile '{name}' not found under {}",
            dir.display()
        ))
    }
    .with_context(|| format!("failed to load profile overlay '{name}'"))
}

fn apply(source: &dyn ConfigSource, cfg: &mut RunConfig) -> Result<()> {
    if let Some(v) = source.get_string(&["common", "workdir"]) {
        cfg.workdir = PathBuf::from(v);
    }
    if let Some(v) = source.get_string(&["common", "profiledir"]) {
        cfg.profiledir = Some(PathBuf::from(v));
    }

    if let Some(v) = source.get_string(&["koji", "hub"]) {
        cfg.koji.hub = Some(v);
    }
    if let Some(v) = source.get_string(&["koji", "download_ursine"]) {
        cfg.koji.download_ursine = Some(v);
    }
    if let Some(v) = source.get_string(&["koji", "download_mbs"]) {
        cfg.koji.download_mbs = Some(v);
    }

    macro_rules! cmd {
        ($key:literal, $field:ident) => {
            if let Some(v) = source.get_string(&["commands", $key]) {
                cfg.commands.$field = Some(v);
            }
        };
    }
    cmd!("diff", diff);
    cmd!("diffstat", diffstat);
    cmd!("msgunfmt", msgunfmt);
    cmd!("desktop-file-validate", desktop_file_validate);
    cmd!("annocheck", annocheck);
    cmd!("abidiff", abidiff);
    cmd!("kmidiff", kmidiff);
    cmd!("udevadm", udevadm);

    if let Some(v) = source.get_string(&["vendor", "vendor_data_dir"]) {
        cfg.vendor.vendor_data_dir = Some(PathBuf::from(v));
    }
    source.for_each_in_array(&["vendor", "licensedb"], &mut |item| {
        cfg.vendor.licensedb.push(item.to_string());
    });
    if let Some(v) = source.get_string(&["vendor", "favor_release"]) {
        cfg.vendor.favor_release = match v.as_str() {
            "oldest" => FavorRelease::Oldest,
            "newest" => FavorRelease::Newest,
            _ => FavorRelease::None,
        };
    }

    source.for_each_in_mapping(&["inspections"], &mut |name, value| {
        cfg.inspections.insert(name.to_string(), value == "on");
    });

    source.for_each_in_mapping(&["products"], &mut |token, regex| {
        cfg.products.insert(token.to_string(), regex.to_string());
    });

    source.for_each_in_array(&["ignore"], &mut |pat| cfg.ignore.push(pat));
    source.for_each_in_array(&["security_path_prefix"], &mut |pat| {
        cfg.security_path_prefix.push(pat)
    });
    source.for_each_in_array(&["badwords"], &mut |w| cfg.metadata.badwords.push(w));

    if let Some(v) = source.get_string(&["metadata", "vendor"]) {
        cfg.metadata.vendor = Some(v);
    }
    source.for_each_in_array(&["metadata", "buildhost_subdomain"], &mut |v| {
        cfg.metadata.buildhost_subdomain.push(v)
    });

    for (section, dst) in [
        ("elf", &mut cfg.elf),
        ("manpage", &mut cfg.manpage),
        ("xml", &mut cfg.xml),
    ] {
        if let Some(v) = source.get_string(&[section, "include_path"]) {
            dst.include_path = Some(v);
        }
        if let Some(v) = source.get_string(&[section, "exclude_path"]) {
            dst.exclude_path = Some(v);
        }
    }

    if let Some(v) = source.get_string(&["desktop", "desktop_entry_files_dir"]) {
        cfg.desktop_entry_files_dir = Some(v);
    }

    source.for_each_in_array(&["changedfiles", "header_file_extensions"], &mut |v| {
        cfg.changedfiles.header_file_extensions.push(v)
    });

    source.for_each_in_array(&["addedfiles", "forbidden_path_prefixes"], &mut |v| {
        cfg.addedfiles.forbidden_path_prefixes.push(v)
    });
    source.for_each_in_array(&["addedfiles", "forbidden_path_suffixes"], &mut |v| {
        cfg.addedfiles.forbidden_path_suffixes.push(v)
    });
    source.for_each_in_array(&["addedfiles", "forbidden_directories"], &mut |v| {
        cfg.addedfiles.forbidden_directories.push(v)
    });

    source.for_each_in_array(&["ownership", "bin_paths"], &mut |v| {
        cfg.ownership.bin_paths.push(v)
    });
    if let Some(v) = source.get_string(&["ownership", "bin_owner"]) {
        cfg.ownership.bin_owner = Some(v);
    }
    if let Some(v) = source.get_string(&["ownership", "bin_group"]) {
        cfg.ownership.bin_group = Some(v);
    }
    source.for_each_in_array(&["ownership", "forbidden_owners"], &mut |v| {
        cfg.ownership.forbidden_owners.push(v)
    });
    source.for_each_in_array(&["ownership", "forbidden_groups"], &mut |v| {
        cfg.ownership.forbidden_groups.push(v)
    });

    source.for_each_in_array(&["shellsyntax", "shells"], &mut |v| {
        cfg.shellsyntax_shells.push(v)
    });

    if let Some(v) = source.get_string(&["filesize", "size_threshold"]) {
        cfg.filesize.size_threshold = v.parse().ok();
    }

    source.for_each_in_array(&["lto", "lto_symbol_name_prefixes"], &mut |v| {
        cfg.lto_symbol_name_prefixes.push(v)
    });

    if let Some(v) = source.get_string(&["specname", "match"]) {
        cfg.specname.match_mode = v;
    }
    if let Some(v) = source.get_string(&["specname", "primary"]) {
        cfg.specname.primary = v;
    }

    source.for_each_in_mapping(&["annocheck"], &mut |name, value| {
        if name != "failure_severity" && name != "profile" {
            cfg.annocheck.tests.insert(name.to_string(), value.to_string());
        }
    });
    if let Some(v) = source.get_string(&["annocheck", "failure_severity"]) {
        cfg.annocheck.failure_severity = Some(v);
    }
    if let Some(v) = source.get_string(&["annocheck", "profile"]) {
        cfg.annocheck.profile = Some(v);
    }

    source.for_each_in_mapping(&["javabytecode"], &mut |release, version| {
        cfg.javabytecode.insert(release.to_string(), version.to_string());
    });

    source.for_each_in_mapping(&["pathmigration", "migrated_paths"], &mut |old, new| {
        cfg.pathmigration.migrated_paths.insert(old.to_string(), new.to_string());
    });
    source.for_each_in_array(&["pathmigration", "excluded_paths"], &mut |v| {
        cfg.pathmigration.excluded_paths.push(v)
    });

    source.for_each_in_array(&["files", "forbidden_paths"], &mut |v| {
        cfg.forbidden_paths.push(v)
    });

    for (section, dst) in [("abidiff", &mut cfg.abidiff), ("kmidiff", &mut cfg.kmidiff)] {
        if let Some(v) = source.get_string(&[section, "suppression_file"]) {
            dst.suppression_file = Some(v);
        }
        if let Some(v) = source.get_string(&[section, "debuginfo_path"]) {
            dst.debuginfo_path = Some(v);
        }
        if let Some(v) = source.get_string(&[section, "include_path"]) {
            dst.include_path = Some(v);
        }
        if let Some(v) = source.get_string(&[section, "extra_args"]) {
            dst.extra_args = Some(v);
        }
        if let Some(v) = source.get_u64(&[section, "security_level_threshold"]) {
            dst.security_level_threshold = Some(v as i64);
        }
    }

    source.for_each_in_array(&["patches", "ignore_list"], &mut |v| {
        cfg.patches.ignore_list.push(v)
    });
    if let Some(v) = source.get_u64(&["patches", "file_count_threshold"]) {
        cfg.patches.file_count_threshold = Some(v);
    }
    if let Some(v) = source.get_u64(&["patches", "line_count_threshold"]) {
        cfg.patches.line_count_threshold = Some(v);
    }

    source.for_each_in_array(&["badfuncs"], &mut |v| cfg.badfuncs.push(v));

    source.for_each_in_array(&["runpath", "allowed_paths"], &mut |v| {
        cfg.runpath.allowed_paths.push(v)
    });
    source.for_each_in_array(&["runpath", "allowed_origin_paths"], &mut |v| {
        cfg.runpath.allowed_origin_paths.push(v)
    });
    source.for_each_in_array(&["runpath", "origin_prefix_trim"], &mut |v| {
        cfg.runpath.origin_prefix_trim.push(v)
    });

    if let Some(v) = source.get_string(&["unicode", "exclude"]) {
        cfg.unicode.exclude = Some(v);
    }
    source.for_each_in_array(&["unicode", "excluded_mime_types"], &mut |v| {
        cfg.unicode.excluded_mime_types.push(v)
    });
    source.for_each_in_array(&["unicode", "forbidden_codepoints"], &mut |v| {
        if let Ok(cp) = u32::from_str_radix(v.trim_start_matches("0x"), 16) {
            cfg.unicode.forbidden_codepoints.push(cp);
        }
    });

    source.for_each_in_mapping(&["rpmdeps", "ignore"], &mut |dep_type, regex| {
        cfg.rpmdeps_ignore.insert(dep_type.to_string(), regex.to_string());
    });

    if let Some(v) = source.get_string(&["debuginfo", "debuginfo_sections"]) {
        cfg.debuginfo.debuginfo_sections = crate::strutil::split(&v, " ").into();
    }
    if let Some(v) = source.get_string(&["debuginfo", "debuginfo_path"]) {
        cfg.debuginfo.debuginfo_path = Some(v);
    }

    source.for_each_in_array(&["udevrules"], &mut |v| cfg.udevrules_dirs.push(v));

    if let Some(v) = source.get_string(&["modularity", "static_context"]) {
        cfg.modularity.static_context = match v.as_str() {
            "required" => ModularityStaticContext::Required,
            "forbidden" => ModularityStaticContext::Forbidden,
            "recommend" => ModularityStaticContext::Recommend,
            _ => ModularityStaticContext::Null,
        };
    }
    source.for_each_in_mapping(&["modularity", "release"], &mut |token, regex| {
        cfg.modularity.release.insert(token.to_string(), regex.to_string());
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_enables_unlisted_inspections() {
        let cfg = RunConfig::default();
        assert!(cfg.inspection_enabled("addedfiles"));
    }

    #[test]
    fn load_applies_multiple_overlay_documents_in_order() {
        let first: Box<dyn ConfigSource> =
            Box::new(yaml::YamlConfigSource::from_str("threshold_marker: base\nignore:\n  - \"*.bak\"\n").unwrap());
        let second: Box<dyn ConfigSource> = Box::new(
            yaml::YamlConfigSource::from_str("ignore:\n  - \"*.tmp\"\n").unwrap(),
        );
        let cfg = load(&[first, second]).unwrap();
        assert_eq!(cfg.ignore.len(), 2);
    }

    #[test]
    fn idempotent_load_yields_equal_ignore_lists() {
        let src = "ignore:\n  - \"*.bak\"\nsecurity_path_prefix:\n  - /etc/security\n";
        let a = load(&[Box::new(yaml::YamlConfigSource::from_str(src).unwrap())]).unwrap();
        let b = load(&[Box::new(yaml::YamlConfigSource::from_str(src).unwrap())]).unwrap();
        assert_eq!(a.ignore.len(), b.ignore.len());
        assert_eq!(a.security_path_prefix.len(), b.security_path_prefix.len());
    }
}
