//! Snapshot node types.
//!
//! A snapshot is an immutable tree of [`Node`] values rooted at a directory.
//! Each kind carries only the fields valid for it: a file never holds
//! children, a directory never holds a content hash. The serde representation
//! doubles as the persisted snapshot format: an internally tagged object
//! keyed by `file_type`, with `the_content` mapping child names to child
//! objects and all keys emitted in sorted order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// File node representation.
///
/// `content_hash` is a lowercase hex MD5 digest of the full content, absent
/// when hashing was disabled or the entry came from a remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Absolute path of the containing directory.
    #[serde(rename = "full_path")]
    pub parent_path: PathBuf,
    /// Modification time, seconds since the Unix epoch.
    #[serde(rename = "last_edit")]
    pub modified_at: i64,
    #[serde(rename = "md5", default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub name: String,
}

/// Directory node representation.
///
/// Children are keyed by each child's own `name`; `BTreeMap` keeps the
/// iteration and persisted key order deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Absolute path of the containing directory.
    #[serde(rename = "full_path")]
    pub parent_path: PathBuf,
    pub name: String,
    #[serde(rename = "the_content")]
    pub children: BTreeMap<String, Node>,
}

/// One filesystem entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "file_type", rename_all = "lowercase")]
pub enum Node {
    File(FileNode),
    Directory(DirectoryNode),
}

impl Node {
    /// Build a file node. The name is normalized to Unicode NFC so that
    /// name matching stays stable across hosts with differing filesystem
    /// normalization.
    pub fn file(
        name: impl Into<String>,
        parent_path: impl Into<PathBuf>,
        modified_at: i64,
        content_hash: Option<String>,
    ) -> Self {
        Node::File(FileNode {
            parent_path: parent_path.into(),
            modified_at,
            content_hash,
            name: normalize_name(name.into()),
        })
    }

    /// Build a directory node with already-assembled children.
    pub fn directory(
        name: impl Into<String>,
        parent_path: impl Into<PathBuf>,
        children: BTreeMap<String, Node>,
    ) -> Self {
        Node::Directory(DirectoryNode {
            parent_path: parent_path.into(),
            name: normalize_name(name.into()),
            children,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => &f.name,
            Node::Directory(d) => &d.name,
        }
    }

    pub fn parent_path(&self) -> &Path {
        match self {
            Node::File(f) => &f.parent_path,
            Node::Directory(d) => &d.parent_path,
        }
    }

    /// Absolute path of the entry itself.
    pub fn full_path(&self) -> PathBuf {
        self.parent_path().join(self.name())
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    /// Children map for directories, `None` for files.
    pub fn children(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::File(_) => None,
            Node::Directory(d) => Some(&d.children),
        }
    }

    /// Total number of entries in the subtree, the root included.
    pub fn entry_count(&self) -> usize {
        match self {
            Node::File(_) => 1,
            Node::Directory(d) => 1 + d.children.values().map(Node::entry_count).sum::<usize>(),
        }
    }
}

fn normalize_name(name: String) -> String {
    // NFC pass only allocates when the name was not already composed.
    if name.is_ascii() {
        name
    } else {
        name.nfc().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path_joins_parent_and_name() {
        let node = Node::file("report.txt", "/srv/data", 1_600_000_000, None);
        assert_eq!(node.full_path(), PathBuf::from("/srv/data/report.txt"));
    }

    #[test]
    fn test_file_serializes_with_persisted_field_names() {
        let node = Node::file(
            "a.txt",
            "/root",
            42,
            Some("d41d8cd98f00b204e9800998ecf8427e".to_string()),
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["file_type"], "file");
        assert_eq!(json["full_path"], "/root");
        assert_eq!(json["last_edit"], 42);
        assert_eq!(json["md5"], "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(json["name"], "a.txt");
    }

    #[test]
    fn test_directory_serializes_children_under_the_content() {
        let mut children = BTreeMap::new();
        children.insert(
            "a.txt".to_string(),
            Node::file("a.txt", "/root/docs", 1, None),
        );
        let node = Node::directory("docs", "/root", children);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["file_type"], "directory");
        assert_eq!(json["the_content"]["a.txt"]["name"], "a.txt");
        assert!(json.get("md5").is_none());
        assert!(json.get("last_edit").is_none());
    }

    #[test]
    fn test_missing_hash_is_omitted_and_reloads_as_none() {
        let node = Node::file("a.txt", "/root", 7, None);
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("md5"));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_names_are_normalized_to_nfc() {
        // "é" as 'e' + combining acute accent decomposes to two scalars.
        let decomposed = "re\u{301}sume\u{301}.txt";
        let composed = "r\u{e9}sum\u{e9}.txt";
        let node = Node::file(decomposed, "/root", 0, None);
        assert_eq!(node.name(), composed);
    }

    #[test]
    fn test_entry_count_includes_root() {
        let mut inner = BTreeMap::new();
        inner.insert("b".to_string(), Node::file("b", "/r/a", 0, None));
        let mut children = BTreeMap::new();
        children.insert("a".to_string(), Node::directory("a", "/r", inner));
        let root = Node::directory("r", "/", children);
        assert_eq!(root.entry_count(), 3);
    }
}
