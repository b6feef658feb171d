//! Show command implementation
//!
//! Implements `filepath show`, which reads owner, group and mode without
//! changing anything.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::RunContext;
use crate::core::reconciler::{Account, Current, LifecycleState, Reconciler};
use crate::core::resource::{DesiredState, ManagedPath};

/// Current state of one path
#[derive(Debug, Serialize)]
pub struct ShowReport {
    /// Target path
    pub path: PathBuf,
    /// Whether it exists
    pub state: LifecycleState,
    /// Owner
    pub owner: Current<Account>,
    /// Group
    pub group: Current<Account>,
    /// Permission bits
    pub mode: Current<String>,
}

/// Execute the show command
pub fn execute(ctx: &RunContext, path: &str) -> Result<()> {
    let resource = ManagedPath::new(DesiredState::for_path(path))
        .with_context(|| format!("Invalid path '{path}'"))?;
    let mut reconciler = Reconciler::system(resource, ctx.config.maximum_uid());

    reconciler.exists()?;
    let report = ShowReport {
        path: reconciler.resource().path().to_path_buf(),
        state: reconciler.state(),
        owner: reconciler.current_owner()?,
        group: reconciler.current_group()?,
        mode: reconciler.current_mode()?,
    };

    ctx.output.json(&report)?;
    if report.state == LifecycleState::Absent {
        ctx.output.info(format!("{} is absent", report.path.display()));
        return Ok(());
    }

    ctx.output.success(report.path.display());
    ctx.output.detail(format!("owner: {}", describe_account(&report.owner)));
    ctx.output.detail(format!("group: {}", describe_account(&report.group)));
    if let Current::Value(mode) = &report.mode {
        ctx.output.detail(format!("mode:  {mode}"));
    }
    Ok(())
}

fn describe_account(value: &Current<Account>) -> String {
    match value {
        Current::Absent => "-".to_string(),
        Current::Invalid(id) => format!("{id} (invalid)"),
        Current::Value(Account {
            id,
            name: Some(name),
        }) => format!("{name} ({id})"),
        Current::Value(Account { id, name: None }) => id.to_string(),
    }
}
