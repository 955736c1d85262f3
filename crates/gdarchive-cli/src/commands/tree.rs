//! Tree command - Dry run of an archive
//!
//! Lists the drive and prints every path an archive run would create,
//! after export extensions and duplicate renaming, without writing anything.

use anyhow::Result;
use clap::Args;

use gdarchive_core::config::Config;
use gdarchive_sync::{plan_tree, Planned};

use crate::commands::{load_graph, DriveArgs};
use crate::output::{get_formatter, EntryKind, OutputFormat};

#[derive(Debug, Args)]
pub struct TreeCommand {
    #[command(flatten)]
    pub drive: DriveArgs,

    /// Leave out files outside the main tree
    #[arg(long)]
    pub skip_orphaned: bool,
}

impl TreeCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let source = self.drive.connect(config)?;
        let (graph, count) = load_graph(&self.drive, config, source.as_ref()).await?;
        let policy = config.mime_policy();

        let mut roots = vec![graph.main()];
        if config.download.include_orphaned && !self.skip_orphaned {
            roots.push(graph.orphaned());
        }
        let planned: Vec<Planned> = roots
            .into_iter()
            .flat_map(|root| plan_tree(&graph, root, &policy))
            .collect();

        formatter.info(&format!("found {count} total files"));
        for entry in &planned {
            let (kind, path) = EntryKind::of(entry);
            formatter.entry(kind, path);
        }
        Ok(())
    }
}
