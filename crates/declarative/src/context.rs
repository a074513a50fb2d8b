//! Apply context and progress callback
//!
//! These let the executor report progress without depending on a specific
//! terminal UI.

use crate::types::{Mode, Report};

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called when starting to reconcile a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource has been reconciled
    fn on_resource_complete(&mut self, report: &Report);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _report: &Report) {}
}

/// Context passed to resource reconciliation
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Whether mutating calls are issued
    pub mode: Mode,
}

impl ApplyContext {
    /// Create a new apply context
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Shorthand for `self.mode.is_dry_run()`
    pub fn dry_run(&self) -> bool {
        self.mode.is_dry_run()
    }
}
