//! Remote metadata source.
//!
//! The core never manages credentials or transports; it consumes an abstract
//! "run command, get output" capability through [`RemoteSession`]. One
//! listing command is issued per directory level and the captured output is
//! handed to the listing parser, so the resulting tree is shape-equivalent
//! to a local scan. Remote entries carry no content hash, which pushes the
//! planner onto its timestamp fallback for those files.

use crate::error::SyncError;
use crate::snapshot::builder::{build_children, build_snapshot, EntryKind, EntryMeta, MetadataSource};
use crate::snapshot::listing::{listing_command, parse_listing, Dialect};
use crate::snapshot::node::Node;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Captured result of one remote command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    pub fn success(stdout: Vec<String>) -> Self {
        Self {
            status: 0,
            stdout,
            stderr: Vec::new(),
        }
    }
}

/// One-shot command execution over an established session.
///
/// Implementations map transport failures (dropped connection, timeout) to
/// [`SyncError::RemoteConnection`]; command-level failures are reported
/// through a non-zero `status`.
pub trait RemoteSession {
    fn run(&mut self, command: &str) -> Result<CommandOutput, SyncError>;
}

/// Options for a remote scan.
#[derive(Debug, Clone, Default)]
pub struct RemoteScanOptions {
    pub dialect: Dialect,
    /// Sibling subdirectories of the root are scanned by up to this many
    /// worker threads; `0` and `1` both mean serial. Each worker serializes
    /// its commands through the shared session.
    pub workers: usize,
    /// Cooperative cancellation, checked before every listing command.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Issue one listing command and parse its output.
fn list_remote_dir<S: RemoteSession + ?Sized>(
    session: &mut S,
    dialect: Dialect,
    cancel: Option<&AtomicBool>,
    path: &Path,
) -> Result<Vec<EntryMeta>, SyncError> {
    if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
        return Err(SyncError::Cancelled);
    }
    let command = listing_command(dialect, path);
    debug!(command = %command, "issuing remote listing");
    let output = session.run(&command)?;
    if !output.stderr.is_empty() {
        warn!(
            command = %command,
            stderr = %output.stderr.join("\n"),
            "remote listing produced stderr output"
        );
    }
    if output.status != 0 {
        let detail = if output.stderr.is_empty() {
            format!("exit status {}", output.status)
        } else {
            output.stderr.join("\n")
        };
        return Err(SyncError::RemoteConnection { command, detail });
    }
    parse_listing(dialect, &output.stdout, path)
}

/// Metadata source backed by a remote session.
pub struct RemoteSource<'a, S: RemoteSession + ?Sized> {
    session: &'a mut S,
    dialect: Dialect,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, S: RemoteSession + ?Sized> RemoteSource<'a, S> {
    pub fn new(session: &'a mut S, dialect: Dialect) -> Self {
        Self {
            session,
            dialect,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<S: RemoteSession + ?Sized> MetadataSource for RemoteSource<'_, S> {
    fn list_dir(&mut self, path: &Path) -> Result<Vec<EntryMeta>, SyncError> {
        list_remote_dir(self.session, self.dialect, self.cancel.as_deref(), path)
    }
}

/// Source sharing one session across scan workers. The lock is held for the
/// whole command round-trip so interleaved output cannot corrupt streams.
struct SharedSource<'m, 's, S: RemoteSession + Send + ?Sized> {
    session: &'m Mutex<&'s mut S>,
    dialect: Dialect,
    cancel: Option<&'m AtomicBool>,
}

impl<S: RemoteSession + Send + ?Sized> MetadataSource for SharedSource<'_, '_, S> {
    fn list_dir(&mut self, path: &Path) -> Result<Vec<EntryMeta>, SyncError> {
        let mut guard = self.session.lock();
        list_remote_dir(&mut **guard, self.dialect, self.cancel, path)
    }
}

/// Build a complete snapshot of a remote directory tree, serially.
pub fn build_remote_snapshot<S: RemoteSession + ?Sized>(
    session: &mut S,
    root: &Path,
    dialect: Dialect,
) -> Result<Node, SyncError> {
    let mut source = RemoteSource::new(session, dialect);
    let tree = build_snapshot(&mut source, root)?;
    debug!(
        root = %root.display(),
        entries = tree.entry_count(),
        "remote snapshot complete"
    );
    Ok(tree)
}

/// Build a remote snapshot with scan options.
///
/// With more than one worker, the root's subdirectories are partitioned
/// across a bounded pool of threads. Results rejoin the parent map by name,
/// so the assembled tree is identical regardless of completion order. A
/// cancelled build discards the partial tree and returns
/// [`SyncError::Cancelled`].
pub fn build_remote_snapshot_with<S: RemoteSession + Send + ?Sized>(
    session: &mut S,
    root: &Path,
    options: &RemoteScanOptions,
) -> Result<Node, SyncError> {
    let workers = options.workers.max(1);
    if workers == 1 {
        let mut source =
            RemoteSource::new(session, options.dialect).with_cancel(options.cancel.clone());
        return build_snapshot(&mut source, root);
    }

    let cancel = options.cancel.as_deref();
    let entries = list_remote_dir(session, options.dialect, cancel, root)?;

    let mut children: BTreeMap<String, Node> = BTreeMap::new();
    let mut dir_names: Vec<String> = Vec::new();
    for entry in entries {
        match entry.kind {
            EntryKind::Directory => dir_names.push(entry.name),
            EntryKind::File => {
                let node = Node::file(
                    entry.name,
                    root.to_path_buf(),
                    entry.modified_at,
                    entry.content_hash,
                );
                children.insert(node.name().to_owned(), node);
            }
        }
    }

    if !dir_names.is_empty() {
        let session = Mutex::new(session);
        let chunk_size = (dir_names.len() + workers - 1) / workers;
        let results: Vec<Result<Vec<Node>, SyncError>> = thread::scope(|scope| {
            let mut handles = Vec::new();
            for chunk in dir_names.chunks(chunk_size) {
                let session = &session;
                let dialect = options.dialect;
                handles.push(scope.spawn(move || {
                    let mut built = Vec::new();
                    for name in chunk {
                        let path = root.join(name);
                        let mut source = SharedSource {
                            session,
                            dialect,
                            cancel,
                        };
                        let sub = build_children(&mut source, &path)?;
                        built.push(Node::directory(name.clone(), root.to_path_buf(), sub));
                    }
                    Ok(built)
                }));
            }
            handles
                .into_iter()
                .map(|h| h.join().expect("remote scan worker panicked"))
                .collect()
        });
        for result in results {
            for node in result? {
                children.insert(node.name().to_owned(), node);
            }
        }
    }

    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = root
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(Node::directory(name, parent, children))
}
