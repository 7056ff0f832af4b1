//! Local filesystem metadata source.
//!
//! Reads one entry's type, modification time, and content hash straight from
//! the filesystem. Directory listings go one level at a time, mirroring the
//! one-command-per-level shape of the remote source so both feed the same
//! builder.

use crate::error::SyncError;
use crate::snapshot::builder::{build_snapshot, EntryKind, EntryMeta, MetadataSource};
use crate::snapshot::node::Node;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::debug;

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Policy knobs for a local scan.
#[derive(Debug, Clone)]
pub struct LocalScanOptions {
    /// Skip entries whose name starts with a dot.
    pub exclude_hidden: bool,
    /// Compute content hashes for files. Disabling trades change detection
    /// accuracy (the planner falls back to timestamps) for scan speed.
    pub hashing: bool,
}

impl Default for LocalScanOptions {
    fn default() -> Self {
        Self {
            exclude_hidden: true,
            hashing: true,
        }
    }
}

/// Describe exactly one filesystem entry, without descendants.
///
/// Fails with [`SyncError::PathNotFound`] when the path is missing and
/// [`SyncError::HashComputation`] when a file cannot be read for hashing.
pub fn extract_metadata(path: &Path, hashing: bool) -> Result<EntryMeta, SyncError> {
    // Follows symlinks, so a linked directory scans like a plain one.
    let metadata = std::fs::metadata(path).map_err(|e| SyncError::from_io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if metadata.is_dir() {
        return Ok(EntryMeta {
            kind: EntryKind::Directory,
            name,
            modified_at: modified_epoch(&metadata, path)?,
            content_hash: None,
        });
    }

    let content_hash = if hashing {
        Some(hash_file(path)?)
    } else {
        None
    };
    Ok(EntryMeta {
        kind: EntryKind::File,
        name,
        modified_at: modified_epoch(&metadata, path)?,
        content_hash,
    })
}

/// Streamed MD5 of the full file content, as a lowercase hex digest.
fn hash_file(path: &Path) -> Result<String, SyncError> {
    let hash_err = |source| SyncError::HashComputation {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(hash_err)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(hash_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn modified_epoch(metadata: &std::fs::Metadata, path: &Path) -> Result<i64, SyncError> {
    let modified = metadata
        .modified()
        .map_err(|e| SyncError::from_io(path, e))?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        // Pre-epoch timestamps come out negative.
        Err(e) => -(e.duration().as_secs() as i64),
    })
}

/// Metadata source backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalSource {
    options: LocalScanOptions,
}

impl LocalSource {
    pub fn new(options: LocalScanOptions) -> Self {
        Self { options }
    }
}

impl MetadataSource for LocalSource {
    fn list_dir(&mut self, path: &Path) -> Result<Vec<EntryMeta>, SyncError> {
        debug!(dir = %path.display(), "scanning local directory");
        let mut entries = Vec::new();
        let read_dir = std::fs::read_dir(path).map_err(|e| SyncError::from_io(path, e))?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| SyncError::from_io(path, e))?;
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if self.options.exclude_hidden && name.starts_with('.') {
                continue;
            }
            entries.push(extract_metadata(&dir_entry.path(), self.options.hashing)?);
        }
        Ok(entries)
    }
}

/// Build a complete snapshot of a local directory tree.
///
/// The root path is canonicalized first and must name an existing directory.
pub fn build_local_snapshot(root: &Path, options: &LocalScanOptions) -> Result<Node, SyncError> {
    let root = dunce::canonicalize(root).map_err(|e| SyncError::from_io(root, e))?;
    if !root.is_dir() {
        return Err(SyncError::InvalidArgument(format!(
            "snapshot root must be a directory: {}",
            root.display()
        )));
    }
    let mut source = LocalSource::new(options.clone());
    let tree = build_snapshot(&mut source, &root)?;
    debug!(
        root = %root.display(),
        entries = tree.entry_count(),
        "local snapshot complete"
    );
    Ok(tree)
}
