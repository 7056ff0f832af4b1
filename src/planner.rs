//! Sync planner.
//!
//! Compares two snapshot trees and emits the ordered operation list that
//! converges the destination toward the source. The comparison is by
//! relative position in each tree, never by absolute path equality, so a
//! local tree can be planned against a remote tree rooted elsewhere.
//!
//! The planner is a pure function of its inputs: no I/O, no shared state,
//! safe to call from any thread.

use crate::error::SyncError;
use crate::snapshot::node::{FileNode, Node};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default allowed difference between two modification timestamps from
/// possibly unsynchronized clocks, in seconds.
pub const DEFAULT_SKEW_TOLERANCE_SECS: u64 = 2;

/// Planner tuning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Files whose timestamps differ by at most this many seconds are
    /// treated as equal when either side lacks a content hash.
    pub skew_tolerance: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            skew_tolerance: DEFAULT_SKEW_TOLERANCE_SECS,
        }
    }
}

/// One action needed to converge the destination toward the source.
///
/// `New` and `Modified` carry both endpoints; `Deleted` has no source
/// counterpart. A `New` directory stands for its whole subtree; the
/// transfer stage recreates descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum SyncOperation {
    New {
        source: PathBuf,
        destination: PathBuf,
    },
    Modified {
        source: PathBuf,
        destination: PathBuf,
    },
    Deleted {
        destination: PathBuf,
    },
}

impl SyncOperation {
    /// Path in the destination tree where the action applies.
    pub fn destination(&self) -> &Path {
        match self {
            SyncOperation::New { destination, .. }
            | SyncOperation::Modified { destination, .. }
            | SyncOperation::Deleted { destination } => destination,
        }
    }

    /// Path in the source tree; `None` for deletions.
    pub fn source(&self) -> Option<&Path> {
        match self {
            SyncOperation::New { source, .. } | SyncOperation::Modified { source, .. } => {
                Some(source)
            }
            SyncOperation::Deleted { .. } => None,
        }
    }
}

/// Compute the ordered operation list converging `destination` toward
/// `source`.
///
/// Both roots must be directories. Creations and modifications come first,
/// top-down, so parents exist before their contents; deletions follow,
/// bottom-up, so directories empty out before they are removed.
pub fn plan(
    source: &Node,
    destination: &Node,
    config: &PlannerConfig,
) -> Result<Vec<SyncOperation>, SyncError> {
    if !source.is_directory() || !destination.is_directory() {
        return Err(SyncError::InvalidArgument(
            "plan requires directory roots on both sides".to_string(),
        ));
    }

    let (mut operations, deletions) = diff_level(
        source,
        &source.full_path(),
        destination,
        &destination.full_path(),
        config,
    );
    operations.extend(deletions);
    debug!(operations = operations.len(), "plan computed");
    Ok(operations)
}

/// Diff one corresponding directory pair. Returns the top-down
/// creation/modification stream and the bottom-up deletion stream
/// separately; the caller concatenates them at the end.
fn diff_level(
    source: &Node,
    source_path: &Path,
    destination: &Node,
    destination_path: &Path,
    config: &PlannerConfig,
) -> (Vec<SyncOperation>, Vec<SyncOperation>) {
    let empty = Default::default();
    let src_children = source.children().unwrap_or(&empty);
    let dst_children = destination.children().unwrap_or(&empty);

    let mut upserts = Vec::new();
    let mut deletions = Vec::new();
    let mut own_deletions = Vec::new();

    let names: BTreeSet<&String> = src_children.keys().chain(dst_children.keys()).collect();
    for name in names {
        let src_path = source_path.join(name);
        let dst_path = destination_path.join(name);
        match (src_children.get(name), dst_children.get(name)) {
            // Present only in source: one operation covers the whole
            // entry, subtree included.
            (Some(_), None) => upserts.push(SyncOperation::New {
                source: src_path,
                destination: dst_path,
            }),
            // Present only in destination: likewise collapsed.
            (None, Some(_)) => own_deletions.push(SyncOperation::Deleted {
                destination: dst_path,
            }),
            (Some(s @ Node::Directory(_)), Some(d @ Node::Directory(_))) => {
                let (child_upserts, child_deletions) =
                    diff_level(s, &src_path, d, &dst_path, config);
                upserts.extend(child_upserts);
                deletions.extend(child_deletions);
            }
            (Some(Node::File(s)), Some(Node::File(d))) => {
                if !files_equal(s, d, config) {
                    upserts.push(SyncOperation::Modified {
                        source: src_path,
                        destination: dst_path,
                    });
                }
            }
            // Kind changed between the trees. A transfer executor cannot
            // modify across kinds, so the stale destination entry is
            // removed and the source entry recreated, adjacently in the
            // top-down stream.
            (Some(_), Some(_)) => {
                upserts.push(SyncOperation::Deleted {
                    destination: dst_path.clone(),
                });
                upserts.push(SyncOperation::New {
                    source: src_path,
                    destination: dst_path,
                });
            }
            (None, None) => unreachable!("name came from one of the key sets"),
        }
    }

    // Recursive deletions first, then this level's own: child before parent.
    deletions.extend(own_deletions);
    (upserts, deletions)
}

/// Equality rule for two files at the same relative position.
///
/// When both sides carry a content hash, hash equality is authoritative and
/// overrides any timestamp difference. Otherwise the modification times are
/// compared under the configured skew tolerance.
fn files_equal(source: &FileNode, destination: &FileNode, config: &PlannerConfig) -> bool {
    match (&source.content_hash, &destination.content_hash) {
        (Some(a), Some(b)) => a == b,
        _ => source.modified_at.abs_diff(destination.modified_at) <= config.skew_tolerance,
    }
}
