//! Ensure command implementation
//!
//! Implements `filepath ensure` for a single directory given on the command
//! line.

use anyhow::{Context, Result};

use crate::cli::RunContext;
use crate::core::identity::Principal;
use crate::core::reconciler::{ApplyReport, Reconciler};
use crate::core::resource::{DesiredState, Ensure, ManagedPath};

/// Options for the ensure command
#[derive(Debug, Clone, Default)]
pub struct EnsureOptions {
    /// Target path
    pub path: String,
    /// Remove instead of create
    pub absent: bool,
    /// Desired owner
    pub owner: Option<String>,
    /// Desired group
    pub group: Option<String>,
    /// Desired mode
    pub mode: Option<String>,
    /// Managed levels
    pub managedepth: Option<i64>,
}

impl EnsureOptions {
    /// Desired state described by these options
    pub fn desired_state(&self) -> DesiredState {
        DesiredState {
            path: Some(self.path.clone()),
            ensure: if self.absent {
                Ensure::Absent
            } else {
                Ensure::Present
            },
            owner: self.owner.as_deref().map(Principal::parse),
            group: self.group.as_deref().map(Principal::parse),
            mode: self.mode.clone(),
            managedepth: self.managedepth,
        }
    }
}

/// Execute the ensure command
pub fn execute(ctx: &RunContext, options: EnsureOptions) -> Result<()> {
    let resource = ManagedPath::new(options.desired_state())
        .with_context(|| format!("Invalid desired state for '{}'", options.path))?;

    tracing::info!(
        "Ensuring '{}' is {} (managedepth {})",
        resource.path().display(),
        resource.ensure(),
        resource.manage_depth()
    );

    let report = Reconciler::system(resource, ctx.config.maximum_uid()).apply()?;
    print_report(ctx, &report)
}

/// Print one apply report
pub fn print_report(ctx: &RunContext, report: &ApplyReport) -> Result<()> {
    ctx.output.json(report)?;
    for change in &report.changes {
        ctx.output.detail(change);
    }
    ctx.output
        .success(format!("{}: {}", report.path.display(), report.outcome));
    Ok(())
}
