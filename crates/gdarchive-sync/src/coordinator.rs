//! Download coordinator
//!
//! Archives one tree of a [`DriveGraph`] into a local directory. The walk
//! runs on the calling task and is the only producer: it creates directories
//! synchronously, so every ancestor exists before a job below it is queued,
//! and it owns the [`PathDeduplicator`] that keeps job paths unique. Jobs go
//! through a capacity-1 channel to a fixed pool of workers, which blocks the
//! walk whenever every worker is busy.
//!
//! A failed file is logged and counted; only a directory that cannot be
//! created fails the whole tree.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use gdarchive_core::domain::path::join_path;
use gdarchive_core::domain::{
    ContentKind, DriveGraph, MimePolicy, Node, NodeId, PathDeduplicator, Record,
};

use crate::transfer::{Transfer, TransferOutcome};

/// Per-tree counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub directories: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub unsupported: usize,
    pub unresolved: usize,
    pub failed: usize,
}

impl TreeSummary {
    pub fn merge(&mut self, other: &TreeSummary) {
        self.directories += other.directories;
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.unsupported += other.unsupported;
        self.unresolved += other.unresolved;
        self.failed += other.failed;
    }

    /// Number of file entries seen, whatever their outcome
    pub fn files(&self) -> usize {
        self.downloaded + self.skipped + self.unsupported + self.unresolved + self.failed
    }
}

/// One file to transfer, relative to the output directory
#[derive(Debug, Clone)]
pub struct Job {
    pub path: String,
    pub record: Arc<Record>,
}

/// What the producer does with one walk entry
#[derive(Debug, Clone)]
pub enum Planned {
    Directory(String),
    /// Shortcut whose target is not in the listing
    Unresolved(String),
    File(Job),
}

/// Turns walk entries into directories and uniquely-named jobs
///
/// Directories and files share one [`PathDeduplicator`], so a file and a
/// folder with the same name never claim the same local path; whichever
/// comes second in walk order gets the `_<n>` suffix. Same-named folders
/// still merge into one directory. Walk paths below a renamed directory are
/// rewritten to live under its local name.
pub struct JobPlanner<'a> {
    policy: &'a MimePolicy,
    dedup: PathDeduplicator,
    /// Walk path of each planned directory to its local path
    directories: HashMap<String, String>,
}

impl<'a> JobPlanner<'a> {
    pub fn new(policy: &'a MimePolicy) -> Self {
        Self {
            policy,
            dedup: PathDeduplicator::new(),
            directories: HashMap::new(),
        }
    }

    pub fn plan(&mut self, path: &str, node: &Node) -> Planned {
        if node.is_folder() {
            if let Some(local) = self.directories.get(path) {
                return Planned::Directory(local.clone());
            }
            let candidate = self.local_path(path);
            let local = self.dedup.claim(candidate);
            self.directories.insert(path.to_string(), local.clone());
            return Planned::Directory(local);
        }

        let local = self.local_path(path);
        let Some(record) = node.record().filter(|_| !node.is_shortcut()) else {
            return Planned::Unresolved(local);
        };

        let local = match self.policy.classify(node.mime_type()) {
            ContentKind::Export(format) => format!("{local}{}", format.extension),
            _ => local,
        };
        Planned::File(Job {
            path: self.dedup.claim(local),
            record: Arc::clone(record),
        })
    }

    /// Places a walk path under its parent directory's local path
    fn local_path(&self, path: &str) -> String {
        // The walk yields every parent before its children
        match path.rsplit_once('/') {
            Some((parent, segment)) => match self.directories.get(parent) {
                Some(local_parent) => join_path(local_parent, segment),
                None => path.to_string(),
            },
            None => path.to_string(),
        }
    }
}

/// Plans a whole tree without touching the filesystem
pub fn plan_tree(graph: &DriveGraph, root: NodeId, policy: &MimePolicy) -> Vec<Planned> {
    let mut planner = JobPlanner::new(policy);
    graph
        .walk(root)
        .map(|(path, node)| planner.plan(&path, node))
        .collect()
}

/// Resolves a configured worker count; 0 means host parallelism
pub fn worker_count(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Producer/worker pool archiving trees through a shared [`Transfer`]
#[derive(Clone)]
pub struct DownloadCoordinator {
    transfer: Arc<Transfer>,
}

impl DownloadCoordinator {
    pub fn new(transfer: Arc<Transfer>) -> Self {
        Self { transfer }
    }

    /// Downloads every file under `root` into `output_dir`
    ///
    /// `workers` of 0 uses the host's available parallelism. Returns once
    /// every queued job has finished.
    pub async fn download_tree(
        &self,
        graph: &DriveGraph,
        root: NodeId,
        output_dir: &Path,
        workers: usize,
    ) -> Result<TreeSummary> {
        let workers = worker_count(workers);
        let (tx, rx) = mpsc::channel::<Job>(1);
        let rx = Arc::new(Mutex::new(rx));

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&rx),
                    Arc::clone(&self.transfer),
                    output_dir.to_path_buf(),
                ))
            })
            .collect();
        debug!(workers, root = %graph[root].name(), "Started download workers");

        let produced = self.produce(graph, root, output_dir, tx).await;

        let mut summary = TreeSummary::default();
        for handle in handles {
            let tally = handle.await.context("download worker panicked")?;
            summary.merge(&tally);
        }

        let planned = produced.context("could not finish walking tree")?;
        summary.merge(&planned);
        info!(
            root = %graph[root].name(),
            directories = summary.directories,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Tree finished"
        );
        Ok(summary)
    }

    /// Walks the tree, creating directories and queueing jobs
    ///
    /// Consumes the sender so the channel closes however this returns.
    async fn produce(
        &self,
        graph: &DriveGraph,
        root: NodeId,
        output_dir: &Path,
        tx: mpsc::Sender<Job>,
    ) -> Result<TreeSummary> {
        let mut planner = JobPlanner::new(self.transfer.policy());
        let mut summary = TreeSummary::default();

        for (path, node) in graph.walk(root) {
            match planner.plan(&path, node) {
                Planned::Directory(path) => {
                    tokio::fs::create_dir_all(output_dir.join(&path))
                        .await
                        .with_context(|| format!("{path}: could not create directory"))?;
                    info!(path = %path, "created directory");
                    summary.directories += 1;
                }
                Planned::Unresolved(path) => {
                    info!(path = %path, "could not resolve shortcut");
                    summary.unresolved += 1;
                }
                Planned::File(job) => {
                    if tx.send(job).await.is_err() {
                        anyhow::bail!("download workers exited early");
                    }
                }
            }
        }
        Ok(summary)
    }
}

async fn run_worker(
    worker: usize,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    transfer: Arc<Transfer>,
    output_dir: PathBuf,
) -> TreeSummary {
    let mut tally = TreeSummary::default();
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else { break };

        let dest = output_dir.join(&job.path);
        match transfer.transfer(&job.record, &dest).await {
            Ok(TransferOutcome::Downloaded) => {
                info!(worker, path = %job.path, "downloaded");
                tally.downloaded += 1;
            }
            Ok(TransferOutcome::SkippedExisting) => {
                info!(worker, path = %job.path, "skipped existing file");
                tally.skipped += 1;
            }
            Ok(TransferOutcome::Unsupported) => {
                info!(
                    worker,
                    path = %job.path,
                    mime_type = %job.record.mime_type,
                    "skipped unsupported type"
                );
                tally.unsupported += 1;
            }
            Err(e) => {
                warn!(worker, path = %job.path, error = %e, "could not download file");
                tally.failed += 1;
            }
        }
    }
    tally
}
