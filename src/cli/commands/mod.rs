//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod apply;
pub mod ensure;
pub mod show;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use super::RunContext;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring one directory to its desired state
    Ensure {
        /// Fully qualified directory path
        path: String,

        /// Remove the directory instead of creating it
        #[arg(long)]
        absent: bool,

        /// Owner (user name or uid)
        #[arg(long)]
        owner: Option<String>,

        /// Group (group name or gid)
        #[arg(long)]
        group: Option<String>,

        /// Mode, numeric (0750) or symbolic (u=rwx,g=rx)
        #[arg(long)]
        mode: Option<String>,

        /// Number of hierarchy levels to manage, starting at the path
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        managedepth: Option<i64>,
    },

    /// Apply every resource declared in a manifest
    Apply {
        /// Manifest file with [[filepath]] tables
        manifest: PathBuf,
    },

    /// Show the current state of a directory
    Show {
        /// Fully qualified directory path
        path: String,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(&self, ctx: &RunContext) -> Result<()> {
        match self {
            Self::Ensure {
                path,
                absent,
                owner,
                group,
                mode,
                managedepth,
            } => {
                let options = ensure::EnsureOptions {
                    path: path.clone(),
                    absent: *absent,
                    owner: owner.clone(),
                    group: group.clone(),
                    mode: mode.clone(),
                    managedepth: *managedepth,
                };
                ensure::execute(ctx, options)
            }
            Self::Apply { manifest } => apply::execute(ctx, manifest),
            Self::Show { path } => show::execute(ctx, path),
        }
    }
}
