//! CLI command implementations

pub mod archive;
pub mod config;
pub mod tree;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use gdarchive_core::config::Config;
use gdarchive_core::domain::{DriveGraph, GraphBuilder};
use gdarchive_core::ports::IDriveSource;
use gdarchive_drive::{DriveClient, GoogleDriveSource};

/// Connection options shared by commands that talk to Drive
#[derive(Debug, Args)]
pub struct DriveArgs {
    /// OAuth access token
    #[arg(long, env = "GDARCHIVE_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File holding the OAuth access token
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Id of the drive's root folder (discovered when absent)
    #[arg(long)]
    pub root_id: Option<String>,
}

impl DriveArgs {
    /// Access token from the flag/environment, else the token file
    pub fn access_token(&self, config: &Config) -> Result<String> {
        if let Some(token) = self.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        let Some(path) = self.token_file.as_ref().or(config.drive.token_file.as_ref()) else {
            bail!("no access token: pass --token, --token-file or set GDARCHIVE_ACCESS_TOKEN");
        };
        let token = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let token = token.trim();
        if token.is_empty() {
            bail!("token file {} is empty", path.display());
        }
        Ok(token.to_string())
    }

    pub fn connect(&self, config: &Config) -> Result<Arc<dyn IDriveSource>> {
        let token = self.access_token(config)?;
        let client = match config.drive.base_url.as_deref() {
            Some(base_url) => DriveClient::with_base_url(token, base_url),
            None => DriveClient::new(token),
        };
        let source = GoogleDriveSource::new(client).with_retry_policy(config.retry.policy());
        Ok(Arc::new(source))
    }

    /// Root id from the flag or config, discovered remotely when neither is set
    pub async fn resolve_root(&self, config: &Config, source: &dyn IDriveSource) -> Result<String> {
        let configured = self
            .root_id
            .as_ref()
            .or(config.drive.root_id.as_ref())
            .filter(|id| !id.is_empty());
        match configured {
            Some(id) => Ok(id.clone()),
            None => source.root_id().await.context("could not get root folder id"),
        }
    }
}

/// Lists every record and builds the graph with the configured root names
pub async fn load_graph(
    args: &DriveArgs,
    config: &Config,
    source: &dyn IDriveSource,
) -> Result<(DriveGraph, usize)> {
    let root_id = args.resolve_root(config, source).await?;
    let records = source.list_files().await.context("could not list files")?;
    let count = records.len();
    info!(root_id = %root_id, records = count, "Listed drive");

    let graph = GraphBuilder::new()
        .main_name(config.download.main_name.clone())
        .orphaned_name(config.download.orphaned_name.clone())
        .build(&root_id, records);
    Ok((graph, count))
}
