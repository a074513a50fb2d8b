//! Declared permission state as a plan resource

use anyhow::{Result, bail};
use declarative::{Action, ApplyContext, Presence, Report, Resource};
use serde_json::{Map, Value, json};
use std::rc::Rc;

use super::resolver::{PermissionResolver, any_changes, targets_json};
use super::{Level, Observed, Subject, Targets};
use crate::engine::Session;

/// Permission `level` for `subjects` on a set of repositories and groups
///
/// Present grants the level where it is not already in effect, absent removes
/// any entry, query reports what the server knows.
#[derive(Debug)]
pub struct PermissionResource {
    session: Rc<Session>,
    subjects: Vec<Subject>,
    requested: Targets,
    level: Option<Level>,
    presence: Presence,
}

impl PermissionResource {
    pub fn new(
        session: Rc<Session>,
        subjects: Vec<Subject>,
        requested: Targets,
        level: Option<Level>,
        presence: Presence,
    ) -> Self {
        Self {
            session,
            subjects,
            requested,
            level,
            presence,
        }
    }

    fn query(&self, resolver: &PermissionResolver, ctx: &ApplyContext) -> Result<Report> {
        let mut users = Map::new();
        let mut user_groups = Map::new();
        for subject in &self.subjects {
            match resolver.current_permissions(subject)? {
                Observed::Known(current) => {
                    users.insert(subject.name().to_string(), json!(current));
                }
                Observed::Unqueryable => {
                    user_groups.insert(subject.name().to_string(), json!("unqueryable"));
                }
            }
        }
        Ok(Report::query("permission", &self.id(), ctx.mode)
            .with_current(json!({"users": users, "user_groups": user_groups})))
    }
}

impl Resource for PermissionResource {
    fn id(&self) -> String {
        self.subjects
            .iter()
            .map(Subject::name)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn description(&self) -> String {
        match (self.presence, self.level) {
            (Presence::Present, Some(level)) => format!("Grant {} to {}", level, self.id()),
            (Presence::Absent, _) => format!("Revoke permissions of {}", self.id()),
            _ => format!("Read permissions of {}", self.id()),
        }
    }

    fn resource_type(&self) -> &'static str {
        "permission"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Report> {
        let resolver = PermissionResolver::new(&self.session);
        let id = self.id();

        let (action, level) = match (self.presence, self.level) {
            (Presence::Query, _) => return self.query(&resolver, ctx),
            (Presence::Present, Some(level)) => (Action::Grant, Some(level)),
            (Presence::Present, None) => bail!("a permission level is required to grant"),
            (Presence::Absent, _) => (Action::Revoke, None),
        };

        let targets = resolver.resolve(&self.subjects, &self.requested, level)?;
        if !any_changes(&targets) {
            return Ok(Report::unchanged("permission", &id, ctx.mode));
        }

        let report = Report::changed("permission", &id, action, ctx.mode)
            .with_targets(targets_json(&targets));
        if ctx.dry_run() {
            log::info!("Would change permissions of {}", id);
            return Ok(report);
        }

        let remote: Vec<Value> = match level {
            Some(level) => resolver.apply_grants(level, &targets)?,
            None => resolver.apply_revokes(&targets)?,
        };
        Ok(report.with_remote(remote))
    }
}
