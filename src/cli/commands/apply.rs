//! Apply command implementation
//!
//! Implements `filepath apply` for a manifest of `[[filepath]]` tables.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::RunContext;
use crate::core::apply::apply_manifest;
use crate::core::manifest::Manifest;

/// Execute the apply command
pub fn execute(ctx: &RunContext, manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    let report = apply_manifest(&manifest, ctx.config.maximum_uid())
        .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;

    ctx.output.json(&report)?;
    for resource in &report.resources {
        match (&resource.outcome, &resource.error) {
            (Some(outcome), _) => {
                ctx.output
                    .success(format!("{}: {outcome}", resource.path.display()));
            }
            (None, Some(error)) => {
                ctx.output.warning(format!("{}: {error}", resource.path.display()));
            }
            (None, None) => {}
        }
        for change in &resource.changes {
            ctx.output.detail(change);
        }
    }

    if !report.is_success() {
        bail!(
            "{} of {} resource(s) failed",
            report.failures(),
            report.resources.len()
        );
    }

    ctx.output.info(format!(
        "Applied {} resource(s), {} change(s)",
        report.resources.len(),
        report.change_count()
    ));
    Ok(())
}
