//! Config command - View and validate gdarchive configuration

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use gdarchive_core::config::Config;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => show(config, path, format),
            ConfigCommand::Validate => validate(config, path, format),
            ConfigCommand::Path => {
                let formatter = get_formatter(format);
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "path": path.display().to_string(),
                        "exists": path.exists(),
                    }));
                } else {
                    formatter.info(&path.display().to_string());
                }
                Ok(())
            }
        }
    }
}

fn show(config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    info!(config_path = %path.display(), "Showing configuration");

    if format.is_json() {
        let json = serde_json::to_value(config)
            .context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.success(&format!("Configuration ({})", path.display()));
    let yaml =
        serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn validate(config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let errors = config.validate();

    if format.is_json() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "path": path.display().to_string(),
            "errors": messages,
        }));
    } else if errors.is_empty() {
        formatter.success(&format!("Configuration is valid ({})", path.display()));
    } else {
        for error in &errors {
            formatter.error(&error.to_string());
        }
    }

    if !errors.is_empty() {
        bail!("{} configuration error(s)", errors.len());
    }
    Ok(())
}
