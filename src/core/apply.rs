//! Applying many desired states in one run
//!
//! Resources that should exist are applied shallow-first so parents declared
//! alongside their children are in place before the children; resources that
//! should be removed go deep-first. One failing resource does not stop the
//! others.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::manifest::Manifest;
use crate::core::reconciler::{Change, Outcome, Reconciler};
use crate::core::resource::{Ensure, ManagedPath};
use crate::error::ManifestError;
use crate::infra::accounts::AccountDatabase;
use crate::infra::filesystem::DirectoryOps;

/// Result for one resource of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    /// Target path
    pub path: PathBuf,
    /// Desired existence state
    pub ensure: Ensure,
    /// Outcome, when the resource applied cleanly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// Mutations performed
    pub changes: Vec<Change>,
    /// Error message, when the resource failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceReport {
    /// Whether this resource failed
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Per-resource results, in application order
    pub resources: Vec<ResourceReport>,
}

impl RunReport {
    /// Number of failed resources
    pub fn failures(&self) -> usize {
        self.resources.iter().filter(|r| r.failed()).count()
    }

    /// Total number of mutations
    pub fn change_count(&self) -> usize {
        self.resources.iter().map(|r| r.changes.len()).sum()
    }

    /// Whether every resource applied
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Order resources for application
pub fn order_for_apply(resources: Vec<ManagedPath>) -> Vec<ManagedPath> {
    let depth = |r: &ManagedPath| r.path().components().count();

    let (mut present, mut absent): (Vec<_>, Vec<_>) = resources
        .into_iter()
        .partition(|r| r.ensure() == Ensure::Present);
    present.sort_by_key(depth);
    absent.sort_by_key(|r| std::cmp::Reverse(depth(r)));

    present.extend(absent);
    present
}

/// Apply resources one after another
///
/// `reconciler_for` builds the reconciler for each resource, which lets
/// callers pick the filesystem and account database.
pub fn apply_all<F, A>(
    resources: Vec<ManagedPath>,
    mut reconciler_for: impl FnMut(ManagedPath) -> Reconciler<F, A>,
) -> RunReport
where
    F: DirectoryOps,
    A: AccountDatabase,
{
    let mut report = RunReport::default();

    for resource in order_for_apply(resources) {
        let path = resource.path().to_path_buf();
        let ensure = resource.ensure();
        let mut reconciler = reconciler_for(resource);

        let entry = match reconciler.apply() {
            Ok(applied) => ResourceReport {
                path,
                ensure,
                outcome: Some(applied.outcome),
                changes: applied.changes,
                error: None,
            },
            Err(e) => {
                tracing::error!("Failed to apply '{}': {e}", path.display());
                ResourceReport {
                    path,
                    ensure,
                    outcome: None,
                    changes: reconciler.take_changes(),
                    error: Some(e.to_string()),
                }
            }
        };
        report.resources.push(entry);
    }

    report
}

/// Validate and apply a manifest against the real system
pub fn apply_manifest(manifest: &Manifest, maximum_uid: u32) -> Result<RunReport, ManifestError> {
    let resources = manifest.resources()?;
    tracing::info!("Applying {} resource(s)", resources.len());
    Ok(apply_all(resources, |resource| {
        Reconciler::system(resource, maximum_uid)
    }))
}
