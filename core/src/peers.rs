//! The peer matcher (§4.7): pairs subpackages across builds by `(name,
//! arch)` (or by name for source packages), and within each pair, pairs
//! individual files by localpath with rename/move fallback heuristics.

use crate::header::Header;
use crate::package::file::{FileEntry, PeerRef};
use crate::Result;

use std::collections::HashMap;
use std::path::PathBuf;

/// One `(before?, after?)` pair at the package level (§3 `SubpackagePeer`).
/// Either side may be absent, but never both.
pub struct SubpackagePeer {
    pub before_header: Option<Header>,
    pub after_header: Option<Header>,
    pub before_root: Option<PathBuf>,
    pub after_root: Option<PathBuf>,
    pub before_files: Vec<FileEntry>,
    pub after_files: Vec<FileEntry>,
}

impl SubpackagePeer {
    /// The identity used to report this peer: prefers the after header's
    /// `(name, arch)`, falling back to before's when after is absent.
    pub fn identity(&self) -> (String, Option<String>) {
        self.after_header
            .as_ref()
            .or(self.before_header.as_ref())
            .map(|h| h.identity())
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.after_header
            .as_ref()
            .or(self.before_header.as_ref())
            .map(|h| h.name.as_str())
            .unwrap_or("")
    }

    pub fn is_source(&self) -> bool {
        self.after_header
            .as_ref()
            .or(self.before_header.as_ref())
            .map(|h| h.is_source())
            .unwrap_or(false)
    }
}

/// A single unmatched-before-file that the move-detection pass may link to
/// a later unmatched after-file; digests are only compared for files under
/// this byte threshold (Open Question, resolved in DESIGN.md).
const MOVE_DIGEST_THRESHOLD_BYTES: u64 = 64 * 1024;

/// One subpackage to be paired: carries the parsed header and the extracted
/// file entries, keyed by the loader in §4.6.
pub struct SubpackageInput {
    pub header: Header,
    pub root: PathBuf,
    pub files: Vec<FileEntry>,
}

/// Builds the `peers` sequence (§4.7 step 1-3) and links file-level peers
/// within each pair (§4.7 file-level matching, steps 1-4). Deterministic:
/// iteration follows payload order.
pub fn build_peers(
    before: Vec<SubpackageInput>,
    after: Vec<SubpackageInput>,
) -> Result<Vec<SubpackagePeer>> {
    let mut before_by_identity: HashMap<(String, Option<String>), SubpackageInput> = HashMap::new();
    let mut before_order: Vec<(String, Option<String>)> = Vec::new();
    for input in before {
        let id = input.header.identity();
        before_order.push(id.clone());
        before_by_identity.insert(id, input);
    }

    let mut peers = Vec::new();
    let mut matched_before: std::collections::HashSet<(String, Option<String>)> =
        std::collections::HashSet::new();

    for after_input in after {
        let id = after_input.header.identity();
        if let Some(before_input) = before_by_identity.get(&id) {
            matched_before.insert(id.clone());
            let mut peer = SubpackagePeer {
                before_header: Some(before_input.header.clone()),
                after_header: Some(after_input.header.clone()),
                before_root: Some(before_input.root.clone()),
                after_root: Some(after_input.root.clone()),
                before_files: clone_files(&before_input.files),
                after_files: clone_files(&after_input.files),
            };
            match_files_within_peer(&mut peer);
            peers.push(peer);
        } else {
            peers.push(SubpackagePeer {
                before_header: None,
                after_header: Some(after_input.header),
                before_root: None,
                after_root: Some(after_input.root),
                before_files: Vec::new(),
                after_files: after_input.files,
            });
        }
    }

    for id in before_order {
        if matched_before.contains(&id) {
            continue;
        }
        if let Some(before_input) = before_by_identity.remove(&id) {
            peers.push(SubpackagePeer {
                before_header: Some(before_input.header),
                after_header: None,
                before_root: Some(before_input.root),
                after_root: None,
                before_files: before_input.files,
                after_files: Vec::new(),
            });
        }
    }

    cross_subpackage_move_pass(&mut peers);

    Ok(peers)
}

fn clone_files(files: &[FileEntry]) -> Vec<FileEntry> {
    files
        .iter()
        .map(|f| {
            FileEntry::new(
                f.localpath.clone(),
                f.fullpath.clone(),
                f.stat,
                f.owner.clone(),
                f.group.clone(),
                f.symlink_target.clone(),
                f.flags,
                f.capabilities.clone(),
            )
        })
        .collect()
}

/// File-level matching within one paired `SubpackagePeer` (§4.7 steps 1-2).
fn match_files_within_peer(peer: &mut SubpackagePeer) {
    let mut before_by_path: HashMap<String, usize> = HashMap::new();
    for (i, f) in peer.before_files.iter().enumerate() {
        before_by_path.entry(f.localpath.clone()).or_insert(i);
    }

    let mut before_matched = vec![false; peer.before_files.len()];

    for ai in 0..peer.after_files.len() {
        let localpath = peer.after_files[ai].localpath.clone();
        if let Some(&bi) = before_by_path.get(&localpath) {
            if !before_matched[bi] {
                link(peer, bi, ai, false, false);
                before_matched[bi] = true;
                continue;
            }
        }
    }

    // Move detection within the same subpackage: same basename, equal
    // size, and (for small files) equal digest.
    for ai in 0..peer.after_files.len() {
        if peer.after_files[ai].peer.is_some() {
            continue;
        }
        let after_basename = peer.after_files[ai].basename().to_string();
        let after_size = peer.after_files[ai].stat.size;

        let mut candidate: Option<usize> = None;
        for (bi, matched) in before_matched.iter().enumerate() {
            if *matched {
                continue;
            }
            let before_file = &peer.before_files[bi];
            if !before_file.is_regular() || !peer.after_files[ai].is_regular() {
                continue;
            }
            if before_file.basename() != after_basename || before_file.stat.size != after_size {
                continue;
            }
            if after_size < MOVE_DIGEST_THRESHOLD_BYTES {
                let before_digest = before_file.checksum().ok();
                let after_digest = peer.after_files[ai].checksum().ok();
                if before_digest.is_none() || before_digest != after_digest {
                    continue;
                }
            }
            candidate = Some(bi);
            break;
        }

        if let Some(bi) = candidate {
            link(peer, bi, ai, true, false);
            before_matched[bi] = true;
        }
    }
}

fn link(peer: &mut SubpackagePeer, before_index: usize, after_index: usize, moved_path: bool, moved_subpackage: bool) {
    peer.before_files[before_index].peer = Some(PeerRef { index: after_index });
    peer.after_files[after_index].peer = Some(PeerRef { index: before_index });
    if moved_path {
        peer.before_files[before_index].moved_path = true;
        peer.after_files[after_index].moved_path = true;
    }
    if moved_subpackage {
        peer.before_files[before_index].moved_subpackage = true;
        peer.after_files[after_index].moved_subpackage = true;
    }
}

/// Cross-subpackage move detection (§4.7 step 3): an unmatched after-file
/// may link to an unmatched before-file with the same localpath in a
/// *different* `SubpackagePeer`.
fn cross_subpackage_move_pass(peers: &mut [SubpackagePeer]) {
    let mut unmatched_before: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
    for (pi, peer) in peers.iter().enumerate() {
        for (fi, f) in peer.before_files.iter().enumerate() {
            if f.peer.is_none() {
                unmatched_before
                    .entry(f.localpath.clone())
                    .or_default()
                    .push((pi, fi));
            }
        }
    }

    for ai_peer in 0..peers.len() {
        let unmatched_after_indices: Vec<usize> = peers[ai_peer]
            .after_files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.peer.is_none())
            .map(|(i, _)| i)
            .collect();

        for ai in unmatched_after_indices {
            let localpath = peers[ai_peer].after_files[ai].localpath.clone();
            let Some(candidates) = unmatched_before.get_mut(&localpath) else {
                continue;
            };
            let Some(pos) = candidates
                .iter()
                .position(|(pi, fi)| *pi != ai_peer && peers[*pi].before_files[*fi].peer.is_none())
            else {
                continue;
            };
            let (bi_peer, bi) = candidates.remove(pos);

            // Cross-peer links can't use shared indices into each other's
            // opposite-side vector (the `PeerRef` model assumes same-peer
            // indices), so we mark the cross-subpackage flag on both sides
            // without trying to express the link as an index pair.
            peers[bi_peer].before_files[bi].moved_subpackage = true;
            peers[ai_peer].after_files[ai].moved_subpackage = true;
        }
    }
}
