//! Grant and revoke target resolution

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use super::{CurrentPermissions, Level, Observed, Subject, Targets};
use crate::engine::Session;
use crate::resource::{Reconciler, user};

/// Resolved targets per subject; subjects with nothing to do are left out
pub type TargetMap = BTreeMap<Subject, Targets>;

/// Objects on which `level` must be granted to reach the requested state
///
/// Known entries already at `level` are skipped. A missing entry differs from
/// every level, `none` included. Unqueryable subjects get the full request.
pub fn grant_targets(requested: &Targets, observed: &Observed, level: Level) -> Targets {
    match observed {
        Observed::Unqueryable => requested.clone(),
        Observed::Known(current) => Targets {
            repositories: requested
                .repositories
                .iter()
                .filter(|name| current.repositories.get(*name) != Some(&level))
                .cloned()
                .collect(),
            repo_groups: requested
                .repo_groups
                .iter()
                .filter(|name| current.repo_groups.get(*name) != Some(&level))
                .cloned()
                .collect(),
        },
    }
}

/// Objects on which an entry must be removed
///
/// Only known entries are revoked, `none` included. Unqueryable subjects get
/// the full request.
pub fn revoke_targets(requested: &Targets, observed: &Observed) -> Targets {
    match observed {
        Observed::Unqueryable => requested.clone(),
        Observed::Known(current) => Targets {
            repositories: requested
                .repositories
                .iter()
                .filter(|name| current.repositories.contains_key(*name))
                .cloned()
                .collect(),
            repo_groups: requested
                .repo_groups
                .iter()
                .filter(|name| current.repo_groups.contains_key(*name))
                .cloned()
                .collect(),
        },
    }
}

/// `repository.write` -> `write`
pub fn strip_prefix(perm: &str) -> &str {
    perm.split_once('.').map_or(perm, |(_, level)| level)
}

/// Parse the `permissions` block of a `get_user` result
pub fn parse_current(user: &Value) -> Result<CurrentPermissions> {
    let permissions = user.get("permissions");
    Ok(CurrentPermissions {
        repositories: parse_entries(permissions.and_then(|p| p.get("repositories")))?,
        repo_groups: parse_entries(permissions.and_then(|p| p.get("repositories_groups")))?,
    })
}

fn parse_entries(entries: Option<&Value>) -> Result<BTreeMap<String, Level>> {
    let Some(entries) = entries else {
        return Ok(BTreeMap::new());
    };
    let Some(entries) = entries.as_object() else {
        bail!("permission listing is not an object: {}", entries);
    };

    entries
        .iter()
        .map(|(name, perm)| {
            let perm = perm.as_str().unwrap_or_default();
            let level: Level = strip_prefix(perm)
                .parse()
                .with_context(|| format!("permission on {name}"))?;
            Ok::<_, anyhow::Error>((name.clone(), level))
        })
        .collect()
}

/// Reads current permissions and issues grants and revokes
pub struct PermissionResolver<'a> {
    session: &'a Session,
    users: Reconciler<'a>,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            users: Reconciler::new(session, &user::KIND),
        }
    }

    /// Current permissions of one subject
    pub fn current_permissions(&self, subject: &Subject) -> Result<Observed> {
        match subject {
            Subject::User(name) => {
                let raw = self.users.fetch_raw(name)?;
                Ok(Observed::Known(parse_current(&raw)?))
            }
            Subject::UserGroup(_) => Ok(Observed::Unqueryable),
        }
    }

    /// Targets per subject: grants at `level`, or revokes when `level` is `None`
    ///
    /// Every read happens here, before any mutation.
    pub fn resolve(
        &self,
        subjects: &[Subject],
        requested: &Targets,
        level: Option<Level>,
    ) -> Result<TargetMap> {
        let mut map = TargetMap::new();
        for subject in subjects {
            let observed = self.current_permissions(subject)?;
            if !subject.is_queryable() && !requested.is_empty() {
                log::warn!(
                    "Current permissions of {} cannot be read; re-asserting all requested targets",
                    subject
                );
            }

            let targets = match level {
                Some(level) => grant_targets(requested, &observed, level),
                None => revoke_targets(requested, &observed),
            };
            if !targets.is_empty() {
                map.insert(subject.clone(), targets);
            }
        }
        Ok(map)
    }

    /// One grant call per (subject, object) pair
    pub fn apply_grants(&self, level: Level, targets: &TargetMap) -> Result<Vec<Value>> {
        let profile = self.session.profile();
        let mut results = Vec::new();

        for (subject, targets) in targets {
            for repository in &targets.repositories {
                let mut args = subject_args(subject, "repoid", repository);
                args.insert("perm".into(), json!(profile.repository_perm(level.as_str())));
                results.push(self.call(grant_method(subject, false), args)?);
            }
            for group in &targets.repo_groups {
                let mut args = subject_args(subject, "repogroupid", group);
                args.insert("perm".into(), json!(profile.repo_group_perm(level.as_str())));
                results.push(self.call(grant_method(subject, true), args)?);
            }
        }
        Ok(results)
    }

    /// One revoke call per (subject, object) pair
    pub fn apply_revokes(&self, targets: &TargetMap) -> Result<Vec<Value>> {
        let mut results = Vec::new();

        for (subject, targets) in targets {
            for repository in &targets.repositories {
                let args = subject_args(subject, "repoid", repository);
                results.push(self.call(revoke_method(subject, false), args)?);
            }
            for group in &targets.repo_groups {
                let args = subject_args(subject, "repogroupid", group);
                results.push(self.call(revoke_method(subject, true), args)?);
            }
        }
        Ok(results)
    }

    fn call(&self, method: &str, args: Map<String, Value>) -> Result<Value> {
        log::info!("{} {}", method, Value::Object(args.clone()));
        Ok(self.session.client.call(method, Value::Object(args))?)
    }
}

/// Whether any subject has something to change
pub fn any_changes(targets: &TargetMap) -> bool {
    targets.values().any(|t| !t.is_empty())
}

/// `{"users": {name: targets}, "user_groups": {name: targets}}`
pub fn targets_json(targets: &TargetMap) -> Value {
    let mut users = Map::new();
    let mut user_groups = Map::new();
    for (subject, targets) in targets {
        let value = json!(targets);
        match subject {
            Subject::User(name) => users.insert(name.clone(), value),
            Subject::UserGroup(name) => user_groups.insert(name.clone(), value),
        };
    }
    json!({"users": users, "user_groups": user_groups})
}

fn subject_args(subject: &Subject, object_arg: &str, object: &str) -> Map<String, Value> {
    let subject_arg = match subject {
        Subject::User(_) => "userid",
        Subject::UserGroup(_) => "usergroupid",
    };
    let mut args = Map::new();
    args.insert(object_arg.to_string(), json!(object));
    args.insert(subject_arg.to_string(), json!(subject.name()));
    args
}

fn grant_method(subject: &Subject, repo_group: bool) -> &'static str {
    match (subject, repo_group) {
        (Subject::User(_), false) => "grant_user_permission",
        (Subject::User(_), true) => "grant_user_permission_to_repo_group",
        (Subject::UserGroup(_), false) => "grant_user_group_permission",
        (Subject::UserGroup(_), true) => "grant_user_group_permission_to_repo_group",
    }
}

fn revoke_method(subject: &Subject, repo_group: bool) -> &'static str {
    match (subject, repo_group) {
        (Subject::User(_), false) => "revoke_user_permission",
        (Subject::User(_), true) => "revoke_user_permission_from_repo_group",
        (Subject::UserGroup(_), false) => "revoke_user_group_permission",
        (Subject::UserGroup(_), true) => "revoke_user_group_permission_from_repo_group",
    }
}
