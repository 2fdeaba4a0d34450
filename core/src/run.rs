//! The `Run` (§3): the whole comparison, threaded through every inspection
//! driver instead of living behind global mutable state (DESIGN NOTES §9).

use crate::build::{self, BuildCatalog, BuildSpec, Side};
use crate::config::{FavorRelease, RunConfig};
use crate::peers::SubpackagePeer;
use crate::policy::PolicyTables;
use crate::rebase::{self, RebaseCache};
use crate::results::Results;
use crate::strutil::StringList;
use crate::Result;

use std::path::PathBuf;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// The whole comparison (§3 `Run`).
pub struct Run {
    pub config: RunConfig,
    pub workdir: PathBuf,
    pub worksubdir: PathBuf,
    pub before_spec: Option<BuildSpec>,
    pub after_spec: Option<BuildSpec>,
    pub peers: Vec<SubpackagePeer>,
    pub product_release: String,
    pub results: Results,
    rebase_cache: RebaseCache,
    policy: PolicyTables,
    pub arches: Option<StringList>,
}

impl Run {
    /// Acquires both builds, builds the peer list, and derives the product
    /// release, leaving inspection dispatch to the caller (§2 control flow
    /// steps 1-3; step 4 onward is [`crate::inspect::dispatch`]).
    pub fn new(
        config: RunConfig,
        before_spec: Option<BuildSpec>,
        after_spec: Option<BuildSpec>,
        catalog: Option<&dyn BuildCatalog>,
        product_release_override: Option<&str>,
    ) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let workdir = config.workdir.clone();
        let worksubdir = workdir.join(&run_id);
        crate::fsutil::mkdirp(&worksubdir, 0o755)?;

        let arches = config.arches.clone();
        let results = Results::new();

        let after_outcome = {
            let _span = info_span!("acquire", side = "after").entered();
            let spec = after_spec
                .as_ref()
                .ok_or_else(|| crate::anyhow!("no after build specified; nothing to inspect"))?;
            build::acquire(spec, Side::After, &worksubdir, arches.as_ref(), catalog)?
        };
        if after_outcome.inputs.is_empty() {
            return Err(crate::anyhow!("after build acquisition yielded no packages"));
        }
        for diag in &after_outcome.diagnostics {
            warn!(side = "after", %diag, "per-package acquisition diagnostic");
        }

        let before_outcome = if let Some(spec) = &before_spec {
            let _span = info_span!("acquire", side = "before").entered();
            let outcome = build::acquire(spec, Side::Before, &worksubdir, arches.as_ref(), catalog)?;
            if outcome.inputs.is_empty() {
                return Err(crate::anyhow!("before build acquisition yielded no packages"));
            }
            for diag in &outcome.diagnostics {
                warn!(side = "before", %diag, "per-package acquisition diagnostic");
            }
            Some(outcome)
        } else {
            None
        };

        let peers = {
            let _span = info_span!("match_peers").entered();
            crate::peers::build_peers(
                before_outcome.map(|o| o.inputs).unwrap_or_default(),
                after_outcome.inputs,
            )?
        };

        let product_release = derive_product_release(&peers, &config, product_release_override)?;
        info!(product_release = %product_release, peer_count = peers.len(), "run initialized");

        Ok(Self {
            config,
            workdir,
            worksubdir,
            before_spec,
            after_spec,
            peers,
            product_release,
            results,
            rebase_cache: RebaseCache::new(),
            policy: PolicyTables::new(),
            arches,
        })
    }

    pub fn primary_package_name(&self) -> Option<&str> {
        self.peers
            .iter()
            .find(|p| !p.is_source())
            .map(|p| p.name())
            .or_else(|| self.peers.first().map(|p| p.name()))
    }

    pub fn is_rebase(&self) -> bool {
        let peers = &self.peers;
        let rebaseable = self
            .policy
            .rebaseable(self.config.vendor.vendor_data_dir.as_deref(), &self.product_release);
        let primary = self.primary_package_name();
        let enabled = self.config.rebase_detection;
        self.rebase_cache
            .get_or_compute(|| rebase::is_rebase(enabled, peers, rebaseable, primary))
    }

    pub fn policy(&self) -> &PolicyTables {
        &self.policy
    }

    /// Removes the worksubdir unless `keep` was requested (§2 step 8, §3
    /// invariants).
    pub fn cleanup(&self) -> Result<()> {
        if self.config.keep_workdir {
            return Ok(());
        }
        crate::fsutil::rmtree(&self.worksubdir, true, false)
    }

    /// Builds a `Run` directly from a peer list, bypassing acquisition --
    /// every inspection driver's test module needs a `Run` to exercise but
    /// none of them should have to stage real package files to get one.
    #[cfg(test)]
    pub fn test_instance(config: RunConfig, peers: Vec<SubpackagePeer>) -> Self {
        Self {
            workdir: config.workdir.clone(),
            worksubdir: PathBuf::new(),
            before_spec: None,
            after_spec: None,
            peers,
            product_release: "test".to_string(),
            results: Results::new(),
            rebase_cache: RebaseCache::new(),
            policy: PolicyTables::new(),
            arches: config.arches.clone(),
            config,
        }
    }
}

/// Product-release derivation (§6, SPEC_FULL §11): when `-r`/override is
/// absent, take the after build's primary package release's dist tag; if
/// the before release's tag differs, consult `products` regexes and
/// `favor_release`. Aborts (returns `Err`) when no consensus can be found.
pub fn derive_product_release(
    peers: &[SubpackagePeer],
    config: &RunConfig,
    override_value: Option<&str>,
) -> Result<String> {
    if let Some(explicit) = override_value.or(config.product_release_override.as_deref()) {
        return Ok(explicit.to_string());
    }

    let after_tag = peers
        .iter()
        .find_map(|p| p.after_header.as_ref())
        .and_then(|h| h.dist_tag())
        .ok_or_else(|| crate::anyhow!("after build has no dist tag to derive a product release from"))?
        .to_string();

    let before_tag = peers
        .iter()
        .find_map(|p| p.before_header.as_ref())
        .and_then(|h| h.dist_tag())
        .map(str::to_string);

    match before_tag {
        None => Ok(after_tag),
        Some(before_tag) if before_tag == after_tag => Ok(after_tag),
        Some(before_tag) => resolve_divergent_tags(&before_tag, &after_tag, config),
    }
}

fn resolve_divergent_tags(before_tag: &str, after_tag: &str, config: &RunConfig) -> Result<String> {
    let before_match = match_products_regex(before_tag, config);
    let after_match = match_products_regex(after_tag, config);

    match (before_match, after_match) {
        (Some(b), Some(a)) if b == a => Ok(b),
        (Some(b), Some(a)) => match config.vendor.favor_release {
            FavorRelease::Oldest => Ok(b),
            FavorRelease::Newest => Ok(a),
            FavorRelease::None => Err(crate::anyhow!(
                "before/after dist tags '{before_tag}'/'{after_tag}' resolve to different products \
                 ('{b}'/'{a}') and favor_release is 'none'"
            )),
        },
        (Some(b), None) => Ok(b),
        (None, Some(a)) => Ok(a),
        (None, None) => Err(crate::anyhow!(
            "before/after dist tags '{before_tag}'/'{after_tag}' differ and neither matches a \
             configured product regex"
        )),
    }
}

fn match_products_regex(tag: &str, config: &RunConfig) -> Option<String> {
    for (token, pattern) in &config.products {
        if let Ok(re) = regex::Regex::new(pattern) {
            if re.is_match(tag) {
                return Some(token.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;

    fn header_with_release(release: &str) -> Header {
        Header {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            release: release.to_string(),
            epoch: None,
            arch: "x86_64".to_string(),
            license: "MIT".to_string(),
            summary: String::new(),
            description: String::new(),
            vendor: None,
            buildhost: None,
            sourcerpm: None,
            changelog: vec![],
            requires: Default::default(),
            provides: Default::default(),
            conflicts: Default::default(),
            obsoletes: Default::default(),
            enhances: Default::default(),
            recommends: Default::default(),
            suggests: Default::default(),
            supplements: Default::default(),
        }
    }

    fn peer(before: Option<&str>, after: &str) -> SubpackagePeer {
        SubpackagePeer {
            before_header: before.map(header_with_release),
            after_header: Some(header_with_release(after)),
            before_root: None,
            after_root: None,
            before_files: vec![],
            after_files: vec![],
        }
    }

    #[test]
    fn matching_dist_tags_derive_directly() {
        let peers = vec![peer(Some("3.fc40"), "5.fc40")];
        let release = derive_product_release(&peers, &RunConfig::default(), None).unwrap();
        assert_eq!(release, "fc40");
    }

    #[test]
    fn no_before_package_uses_after_tag() {
        let peers = vec![peer(None, "5.fc40")];
        let release = derive_product_release(&peers, &RunConfig::default(), None).unwrap();
        assert_eq!(release, "fc40");
    }

    #[test]
    fn divergent_tags_without_products_config_fails() {
        let peers = vec![peer(Some("3.fc39"), "5.fc40")];
        let err = derive_product_release(&peers, &RunConfig::default(), None);
        assert!(err.is_err());
    }

    #[test]
    fn divergent_tags_resolved_by_favor_newest() {
        let peers = vec![peer(Some("3.fc39"), "5.fc40")];
        let mut config = RunConfig::default();
        config.products.insert("f39".to_string(), "^fc39$".to_string());
        config.products.insert("f40".to_string(), "^fc40$".to_string());
        config.vendor.favor_release = FavorRelease::Newest;
        let release = derive_product_release(&peers, &config, None).unwrap();
        assert_eq!(release, "f40");
    }

    #[test]
    fn explicit_override_short_circuits_derivation() {
        let peers = vec![peer(Some("3.fc39"), "5.fc40")];
        let release = derive_product_release(&peers, &RunConfig::default(), Some("rhel9")).unwrap();
        assert_eq!(release, "rhel9");
    }
}
