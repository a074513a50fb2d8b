//! Resource trait for declarative reconciliation
//!
//! A Resource is one declared piece of remote state (a repository, a
//! membership assertion, a permission grant) that knows how to read the
//! live state and converge it.

use crate::context::ApplyContext;
use crate::types::Report;
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// # Example
///
/// ```ignore
/// use declarative::{Action, ApplyContext, Report, Resource};
///
/// #[derive(Debug)]
/// struct Flag { name: String, wanted: bool }
///
/// impl Resource for Flag {
///     fn id(&self) -> String { self.name.clone() }
///     fn description(&self) -> String { format!("Flag {}", self.name) }
///     fn resource_type(&self) -> &'static str { "flag" }
///
///     fn converge(&self, ctx: &ApplyContext) -> anyhow::Result<Report> {
///         let current = read_flag(&self.name)?;
///         if current == self.wanted {
///             return Ok(Report::unchanged("flag", &self.name, ctx.mode));
///         }
///         if !ctx.dry_run() {
///             write_flag(&self.name, self.wanted)?;
///         }
///         Ok(Report::changed("flag", &self.name, Action::Update, ctx.mode))
///     }
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Identifier of the managed object within its type
    ///
    /// Examples:
    /// - "group/proj" for a repository
    /// - "developers" for a user group
    fn id(&self) -> String;

    /// Human-readable description of what this resource declares
    fn description(&self) -> String;

    /// Resource type category
    ///
    /// Used for grouping and filtering. Examples:
    /// - "repository", "repo_group", "user", "user_group"
    /// - "membership", "permission"
    fn resource_type(&self) -> &'static str;

    /// Read live state, compute the change set and, unless dry-run,
    /// issue the mutating calls
    ///
    /// Implementations must finish every read before the first mutating
    /// call so that dry-run and apply report on the same snapshot.
    fn converge(&self, ctx: &ApplyContext) -> Result<Report>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;
