//! Core types for declarative reconciliation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

/// Attributes as reported by the remote side
pub type CurrentAttributes = Map<String, Value>;

/// Set of attribute names whose desired value differs from current
pub type Diff = BTreeSet<String>;

/// Desired attribute values
///
/// `None` marks an attribute as unspecified: leave it unchanged, or let the
/// server pick its default on create. Unspecified attributes never take part
/// in a diff and are never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredAttributes(BTreeMap<String, Option<Value>>);

impl DesiredAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set an attribute to a value
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), Some(value.into()));
        self
    }

    /// Builder: mark an attribute as unspecified
    pub fn unspecified(mut self, name: &str) -> Self {
        self.0.insert(name.to_string(), None);
        self
    }

    /// Get a specified value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).and_then(Option::as_ref)
    }

    /// Iterate over specified attributes only
    pub fn specified(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.as_str(), v)))
    }

    /// Names of all attributes, specified or not
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether no attribute is specified
    pub fn is_empty(&self) -> bool {
        self.specified().next().is_none()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for DesiredAttributes {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Whether mutating calls are issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Apply,
    DryRun,
}

impl Mode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Apply }
    }

    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Desired presence of a managed object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Object exists with the desired attributes
    #[default]
    Present,
    /// Object does not exist
    Absent,
    /// Report current state only
    Query,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Present => write!(f, "present"),
            Presence::Absent => write!(f, "absent"),
            Presence::Query => write!(f, "query"),
        }
    }
}

/// What a reconciliation did, or would do in dry-run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NoChange,
    Query,
    Create,
    Update,
    Delete,
    Grant,
    Revoke,
    AddMembers,
    RemoveMembers,
}

/// Outcome of reconciling one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub resource_type: String,
    pub id: String,
    pub changed: bool,
    pub action: Action,
    pub dry_run: bool,
    /// Changed attribute names (attribute reconciliation)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub diff: Diff,
    /// Per-subject or per-group targets (permission/membership reconciliation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Value>,
    /// Current attributes (query mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Value>,
    /// Raw results of the mutating calls actually issued
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote: Vec<Value>,
}

impl Report {
    /// Report for a resource that needs nothing
    pub fn unchanged(resource_type: &str, id: &str, mode: Mode) -> Self {
        Self::new(resource_type, id, Action::NoChange, false, mode)
    }

    /// Report for a resource that changed (or would change in dry-run)
    pub fn changed(resource_type: &str, id: &str, action: Action, mode: Mode) -> Self {
        Self::new(resource_type, id, action, true, mode)
    }

    /// Report for a read-only query
    pub fn query(resource_type: &str, id: &str, mode: Mode) -> Self {
        Self::new(resource_type, id, Action::Query, false, mode)
    }

    fn new(resource_type: &str, id: &str, action: Action, changed: bool, mode: Mode) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            changed,
            action,
            dry_run: mode.is_dry_run(),
            diff: Diff::new(),
            targets: None,
            current: None,
            remote: Vec::new(),
        }
    }

    pub fn with_diff(mut self, diff: Diff) -> Self {
        self.diff = diff;
        self
    }

    pub fn with_targets(mut self, targets: Value) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn with_current(mut self, current: Value) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_remote(mut self, remote: Vec<Value>) -> Self {
        self.remote = remote;
        self
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub granted: usize,
    pub revoked: usize,
    pub members_changed: usize,
    pub queried: usize,
    pub no_change: usize,
    pub dry_run: bool,
}

impl ExecuteSummary {
    /// Total number of resources that changed (or would in dry-run)
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted + self.granted + self.revoked + self.members_changed
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.queried + self.no_change
    }

    /// Add a report to the summary
    pub fn add_report(&mut self, report: &Report) {
        self.dry_run |= report.dry_run;
        match report.action {
            Action::NoChange => self.no_change += 1,
            Action::Query => self.queried += 1,
            Action::Create => self.created += 1,
            Action::Update => self.updated += 1,
            Action::Delete => self.deleted += 1,
            Action::Grant => self.granted += 1,
            Action::Revoke => self.revoked += 1,
            Action::AddMembers | Action::RemoveMembers => self.members_changed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_specified_skips_unspecified() {
        let desired = DesiredAttributes::new()
            .set("private", true)
            .unspecified("description")
            .set("repo_type", "git");

        let names: Vec<&str> = desired.specified().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["private", "repo_type"]);
        assert_eq!(desired.get("description"), None);
        assert_eq!(desired.names().count(), 3);
    }

    #[test]
    fn test_json_null_is_unspecified() {
        let desired: DesiredAttributes =
            serde_json::from_value(json!({"private": true, "description": null})).unwrap();
        assert_eq!(desired.get("private"), Some(&json!(true)));
        assert_eq!(desired.get("description"), None);
        assert_eq!(desired.specified().count(), 1);
    }

    #[test]
    fn test_empty_when_all_unspecified() {
        let desired = DesiredAttributes::new().unspecified("owner");
        assert!(desired.is_empty());
        assert!(!desired.clone().set("owner", "admin").is_empty());
    }

    #[test]
    fn test_mode() {
        assert!(Mode::from_dry_run(true).is_dry_run());
        assert_eq!(Mode::from_dry_run(false), Mode::Apply);
    }

    #[test]
    fn test_report_serialization_skips_empty() {
        let report = Report::unchanged("repository", "proj", Mode::Apply);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["changed"], json!(false));
        assert_eq!(value["action"], json!("no_change"));
        assert!(value.get("diff").is_none());
        assert!(value.get("remote").is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        summary.add_report(&Report::changed("repository", "a", Action::Create, Mode::Apply));
        summary.add_report(&Report::changed("permission", "b", Action::Grant, Mode::Apply));
        summary.add_report(&Report::unchanged("user", "c", Mode::Apply));
        summary.add_report(&Report::changed("membership", "d", Action::AddMembers, Mode::DryRun));

        assert_eq!(summary.total_changes(), 3);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.no_change, 1);
        assert!(summary.dry_run);
    }
}
