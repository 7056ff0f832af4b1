//! Driftsync: snapshot and sync-planning core for NAS and remote backups.
//!
//! Builds a canonical tree representation of a directory, either from the
//! local filesystem or from textual listing output captured over a shell
//! session, persists it for reuse, and computes the minimal ordered set of
//! file-level operations that brings a destination tree in sync with a
//! source tree. Byte transfer, credentials, and UI belong to the callers.

pub mod error;
pub mod logging;
pub mod planner;
pub mod snapshot;

pub use error::SyncError;
pub use planner::{plan, PlannerConfig, SyncOperation};
pub use snapshot::{
    build_local_snapshot, build_remote_snapshot, load_snapshot, save_snapshot, Dialect,
    LocalScanOptions, Node, RemoteSession,
};
