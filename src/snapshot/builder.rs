//! Canonical snapshot builder.
//!
//! One recursive tree assembly shared by every metadata acquisition
//! mechanism. A [`MetadataSource`] yields the immediate children of a single
//! directory; the builder recurses into subdirectories and returns an owned
//! tree. Nothing is mutated after construction, so completed snapshots can
//! be shared freely across threads.

use crate::error::SyncError;
use crate::snapshot::node::Node;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::trace;

/// Entry kind as reported by a metadata source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Per-entry metadata, the shape both acquisition mechanisms reconcile into.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub kind: EntryKind,
    pub name: String,
    /// Modification time, seconds since the Unix epoch. Ignored for
    /// directories when the node is built.
    pub modified_at: i64,
    /// Lowercase hex MD5 digest; `None` when hashing was skipped or the
    /// source cannot hash (remote listings).
    pub content_hash: Option<String>,
}

/// Supplies the immediate children of one directory.
///
/// Implementations take `&mut self` because listing may consume a session
/// round-trip; the local implementation simply reads the filesystem.
pub trait MetadataSource {
    fn list_dir(&mut self, path: &Path) -> Result<Vec<EntryMeta>, SyncError>;
}

/// Build a complete snapshot rooted at `root`.
///
/// The root is always a directory node. Any listing or extraction failure
/// aborts the build; no partial tree is returned.
pub fn build_snapshot<S: MetadataSource + ?Sized>(
    source: &mut S,
    root: &Path,
) -> Result<Node, SyncError> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = root
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let children = build_children(source, root)?;
    Ok(Node::directory(name, parent, children))
}

/// Assemble the children map for one directory, recursing into
/// subdirectories. An empty directory yields an empty map.
pub(crate) fn build_children<S: MetadataSource + ?Sized>(
    source: &mut S,
    dir: &Path,
) -> Result<BTreeMap<String, Node>, SyncError> {
    let mut children = BTreeMap::new();
    for entry in source.list_dir(dir)? {
        trace!(dir = %dir.display(), name = %entry.name, "visiting entry");
        let child = match entry.kind {
            EntryKind::Directory => {
                let sub = build_children(source, &dir.join(&entry.name))?;
                Node::directory(entry.name, dir.to_path_buf(), sub)
            }
            EntryKind::File => Node::file(
                entry.name,
                dir.to_path_buf(),
                entry.modified_at,
                entry.content_hash,
            ),
        };
        // Key by the node's own name so the map key invariant holds even
        // after name normalization.
        children.insert(child.name().to_owned(), child);
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Scripted source: path -> entries.
    struct FixedSource {
        dirs: HashMap<PathBuf, Vec<EntryMeta>>,
    }

    impl MetadataSource for FixedSource {
        fn list_dir(&mut self, path: &Path) -> Result<Vec<EntryMeta>, SyncError> {
            self.dirs
                .get(path)
                .cloned()
                .ok_or_else(|| SyncError::PathNotFound(path.to_path_buf()))
        }
    }

    fn file_meta(name: &str, ts: i64) -> EntryMeta {
        EntryMeta {
            kind: EntryKind::File,
            name: name.to_string(),
            modified_at: ts,
            content_hash: None,
        }
    }

    fn dir_meta(name: &str) -> EntryMeta {
        EntryMeta {
            kind: EntryKind::Directory,
            name: name.to_string(),
            modified_at: 0,
            content_hash: None,
        }
    }

    #[test]
    fn test_builds_nested_tree() {
        let mut dirs = HashMap::new();
        dirs.insert(
            PathBuf::from("/data"),
            vec![file_meta("a.txt", 10), dir_meta("sub")],
        );
        dirs.insert(PathBuf::from("/data/sub"), vec![file_meta("b.txt", 20)]);
        let mut source = FixedSource { dirs };

        let root = build_snapshot(&mut source, Path::new("/data")).unwrap();
        assert_eq!(root.name(), "data");
        assert!(root.is_directory());
        let children = root.children().unwrap();
        assert_eq!(children.len(), 2);
        let sub = &children["sub"];
        assert_eq!(sub.children().unwrap()["b.txt"].name(), "b.txt");
    }

    #[test]
    fn test_empty_directory_yields_empty_children() {
        let mut dirs = HashMap::new();
        dirs.insert(PathBuf::from("/empty"), vec![]);
        let mut source = FixedSource { dirs };

        let root = build_snapshot(&mut source, Path::new("/empty")).unwrap();
        assert_eq!(root.children().unwrap().len(), 0);
    }

    #[test]
    fn test_listing_failure_aborts_build() {
        // The subdirectory is announced but its listing is missing, so the
        // recursion must fail the whole build.
        let mut dirs = HashMap::new();
        dirs.insert(PathBuf::from("/data"), vec![dir_meta("gone")]);
        let mut source = FixedSource { dirs };

        let err = build_snapshot(&mut source, Path::new("/data")).unwrap_err();
        assert!(matches!(err, SyncError::PathNotFound(p) if p.ends_with("gone")));
    }
}
