//! # Declarative
//!
//! A framework for declarative reconciliation of remote state.
//!
//! This crate provides the core abstractions for declaring desired
//! attributes, diffing them against live state, and converging a list of
//! resources in order.
//!
//! ## Core Concepts
//!
//! - **DesiredAttributes**: attribute values to enforce; unspecified ones are
//!   left alone and never sent
//! - **Diff**: names of attributes whose desired value differs from current
//! - **Resource**: one declared object that can read and converge itself
//! - **ExecutionPlan**: resources in convergence order
//! - **Report**: what a resource changed, or would change in dry-run
//!
//! ## Example
//!
//! ```
//! use declarative::{DesiredAttributes, compute_diff};
//! use serde_json::json;
//!
//! let desired = DesiredAttributes::new()
//!     .set("repo_type", "git")
//!     .set("private", true)
//!     .unspecified("description");
//! let current = json!({"repo_type": "git", "private": false, "description": "old"});
//!
//! let diff = compute_diff(&desired, current.as_object().unwrap(), &[]);
//! assert_eq!(diff.into_iter().collect::<Vec<_>>(), vec!["private"]);
//! ```

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use diff::{check_immutable, compute_diff};
pub use error::{Error, Result};
pub use executor::execute;
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource};
pub use types::{
    Action, CurrentAttributes, DesiredAttributes, Diff, ExecuteSummary, Mode, Presence, Report,
};
