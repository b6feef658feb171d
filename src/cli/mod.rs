//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::global_config::GlobalConfig;
use crate::infra::dirs::FilepathDirs;
use commands::Commands;
use output::OutputConfig;

/// filepath - Declarative directory hierarchy management
///
/// Ensure directories exist or are absent, with owner, group and mode applied
/// to a configurable number of hierarchy levels.
#[derive(Parser, Debug)]
#[command(name = "filepath")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this configuration file instead of the default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Loaded global configuration
    pub config: GlobalConfig,
    /// Effective output settings
    pub output: OutputConfig,
}

impl Cli {
    /// Output settings from the command-line flags alone
    pub fn output(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.json)
    }

    /// Load the global configuration and merge it with the flags
    pub fn context(&self) -> Result<RunContext> {
        let config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file '{}' does not exist", path.display());
                }
                GlobalConfig::load_from_path(path)
            }
            None => GlobalConfig::load(&FilepathDirs::new()),
        }
        .context("Failed to load global configuration")?;

        let output = OutputConfig::new(
            self.quiet || config.output.quiet.unwrap_or(false),
            self.json || config.output.json.unwrap_or(false),
        );
        tracing::debug!("Maximum uid/gid: {}", config.maximum_uid());

        Ok(RunContext { config, output })
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        if let Some(cmd) = &self.command {
            let ctx = self.context()?;
            cmd.run(&ctx)
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
