//! Snapshot model and builders.
//!
//! A snapshot is a structural, hashable representation of a directory tree,
//! captured at one point in time. Two acquisition mechanisms feed the same
//! canonical builder: local filesystem metadata and parsed remote listing
//! output, so trees from either side compare cleanly in the planner.

pub mod builder;
pub mod listing;
pub mod local;
pub mod node;
pub mod persistence;
pub mod remote;

pub use builder::{build_snapshot, EntryKind, EntryMeta, MetadataSource};
pub use listing::{listing_command, parse_listing, Dialect};
pub use local::{build_local_snapshot, extract_metadata, LocalScanOptions, LocalSource};
pub use node::{DirectoryNode, FileNode, Node};
pub use persistence::{
    default_store_dir, load_snapshot, save_snapshot, snapshot_from_str, snapshot_to_string,
};
pub use remote::{
    build_remote_snapshot, build_remote_snapshot_with, CommandOutput, RemoteScanOptions,
    RemoteSession, RemoteSource,
};
