//! Archive command - Download the whole drive
//!
//! Provides the `gdarchive archive` CLI command which:
//! 1. Creates the output directory
//! 2. Resolves the root folder and lists every file
//! 3. Builds the folder graph
//! 4. Downloads the main tree, then the orphaned tree
//! 5. Reports a summary per tree

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use gdarchive_core::config::Config;
use gdarchive_sync::{DownloadCoordinator, Transfer, TreeSummary};

use crate::commands::{load_graph, DriveArgs};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ArchiveCommand {
    /// Output directory
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub drive: DriveArgs,

    /// Concurrent downloads (0 = one per CPU)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Do not download files outside the main tree
    #[arg(long)]
    pub skip_orphaned: bool,
}

impl ArchiveCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let out = self
            .out
            .clone()
            .or_else(|| config.download.output_dir.clone())
            .context("no output directory: pass --out or set download.output_dir")?;
        std::fs::create_dir_all(&out)
            .with_context(|| format!("Failed to create output directory {}", out.display()))?;

        let source = self.drive.connect(config)?;
        let (graph, count) = load_graph(&self.drive, config, source.as_ref()).await?;
        formatter.info(&format!("found {count} total files"));

        let transfer = Transfer::new(source, Arc::new(config.mime_policy()), config.retry.policy());
        let coordinator = DownloadCoordinator::new(Arc::new(transfer));
        let workers = self.workers.unwrap_or(config.download.workers);
        info!(out = %out.display(), workers, "Starting archive");

        let mut total = TreeSummary::default();
        let main = coordinator
            .download_tree(&graph, graph.main(), &out, workers)
            .await?;
        formatter.tree_summary(graph[graph.main()].name(), &main);
        total.merge(&main);

        if config.download.include_orphaned && !self.skip_orphaned {
            let orphaned = coordinator
                .download_tree(&graph, graph.orphaned(), &out, workers)
                .await?;
            formatter.tree_summary(graph[graph.orphaned()].name(), &orphaned);
            total.merge(&orphaned);
        }

        if total.failed > 0 {
            formatter.warn(&format!("{} files could not be downloaded", total.failed));
        }
        formatter.success("done!");
        Ok(())
    }
}
