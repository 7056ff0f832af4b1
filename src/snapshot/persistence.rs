//! Snapshot persistence.
//!
//! Serializes a snapshot tree to JSON and back, so a tree captured once can
//! be reused without re-scanning. The encoding is deterministic: struct
//! fields serialize in sorted key order and children live in a `BTreeMap`,
//! so two runs over an unchanged tree produce byte-identical output.

use crate::error::SyncError;
use crate::snapshot::node::Node;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Render a snapshot to its persisted JSON form.
pub fn snapshot_to_string(tree: &Node) -> Result<String, SyncError> {
    serde_json::to_string_pretty(tree)
        .map_err(|e| SyncError::InvalidArgument(format!("failed to encode snapshot: {e}")))
}

/// Decode a snapshot from its persisted JSON form.
///
/// `origin` names the source in error messages, e.g. a file path.
pub fn snapshot_from_str(data: &str, origin: &str) -> Result<Node, SyncError> {
    serde_json::from_str(data).map_err(|e| SyncError::ConfigLoad {
        target: origin.to_string(),
        detail: e.to_string(),
    })
}

/// Save a snapshot tree to `target`, creating parent directories as needed.
pub fn save_snapshot(tree: &Node, target: &Path) -> Result<(), SyncError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::from_io(parent, e))?;
    }
    let mut encoded = snapshot_to_string(tree)?;
    encoded.push('\n');
    std::fs::write(target, encoded).map_err(|e| SyncError::from_io(target, e))?;
    debug!(target = %target.display(), entries = tree.entry_count(), "snapshot saved");
    Ok(())
}

/// Load a snapshot tree from `target`.
///
/// A missing file is [`SyncError::PathNotFound`]; malformed or truncated
/// content is [`SyncError::ConfigLoad`] naming the file.
pub fn load_snapshot(target: &Path) -> Result<Node, SyncError> {
    let data = std::fs::read_to_string(target).map_err(|e| SyncError::from_io(target, e))?;
    let tree = snapshot_from_str(&data, &target.display().to_string())?;
    debug!(target = %target.display(), entries = tree.entry_count(), "snapshot loaded");
    Ok(tree)
}

/// Platform data directory where callers keep reusable snapshots, or `None`
/// when no home directory can be determined.
pub fn default_store_dir() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "driftsync", "driftsync")?;
    Some(dirs.data_dir().to_path_buf())
}
