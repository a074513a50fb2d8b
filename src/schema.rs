//! Desired-state manifest
//!
//! A TOML file listing the objects to reconcile:
//!
//! ```toml
//! [[repo_groups]]
//! name = "web"
//! description = "Web sites"
//!
//! [[repositories]]
//! name = "web/site"
//! repo_type = "git"
//! private = true
//!
//! [[memberships]]
//! groups = ["devs"]
//! users = ["alice"]
//!
//! [[permissions]]
//! user_groups = ["devs"]
//! repositories = ["web/site"]
//! level = "write"
//! ```
//!
//! Sections converge in a fixed order so parents exist before children:
//! repo groups, users, user groups, repositories, memberships, permissions.

use anyhow::{Context, Result, bail};
use declarative::{DesiredAttributes, ExecutionPlan, Presence};
use serde::Deserialize;
use std::path::Path;
use std::rc::Rc;

use crate::engine::Session;
use crate::membership::MembershipResource;
use crate::permission::{Level, PermissionResource, Subject, Targets};
use crate::resource::{EntityKind, EntityResource, repo_group, repository, user, user_group};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub repo_groups: Vec<EntityEntry>,
    #[serde(default)]
    pub users: Vec<EntityEntry>,
    #[serde(default)]
    pub user_groups: Vec<EntityEntry>,
    #[serde(default)]
    pub repositories: Vec<EntityEntry>,
    #[serde(default)]
    pub memberships: Vec<MembershipEntry>,
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

/// One repository, repository group, user or user group
#[derive(Debug, Deserialize)]
pub struct EntityEntry {
    pub name: String,
    #[serde(default)]
    pub state: Presence,
    /// Every other key is an attribute
    #[serde(flatten)]
    pub attributes: DesiredAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MembershipEntry {
    pub groups: Vec<String>,
    pub users: Vec<String>,
    #[serde(default)]
    pub state: Presence,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionEntry {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub user_groups: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub repo_groups: Vec<String>,
    pub level: Option<Level>,
    #[serde(default)]
    pub state: Presence,
}

impl PermissionEntry {
    pub fn subjects(&self) -> Vec<Subject> {
        self.users
            .iter()
            .cloned()
            .map(Subject::User)
            .chain(self.user_groups.iter().cloned().map(Subject::UserGroup))
            .collect()
    }
}

impl Manifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        let manifest: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check attribute names and required fields before any remote call
    pub fn validate(&self) -> Result<()> {
        for (kind, entries) in self.entity_sections() {
            for entry in entries {
                kind.validate(&entry.attributes)
                    .with_context(|| format!("{} '{}'", kind.name, entry.name))?;
            }
        }

        for entry in &self.memberships {
            if entry.groups.is_empty() || entry.users.is_empty() {
                bail!("membership entries need at least one group and one user");
            }
        }

        for entry in &self.permissions {
            if entry.users.is_empty() && entry.user_groups.is_empty() {
                bail!("permission entries need at least one user or user group");
            }
            if entry.state == Presence::Present && entry.level.is_none() {
                bail!("permission entries granting access need a level");
            }
        }

        Ok(())
    }

    fn entity_sections(&self) -> [(&'static EntityKind, &[EntityEntry]); 4] {
        [
            (&repo_group::KIND, self.repo_groups.as_slice()),
            (&user::KIND, self.users.as_slice()),
            (&user_group::KIND, self.user_groups.as_slice()),
            (&repository::KIND, self.repositories.as_slice()),
        ]
    }

    /// Resources in convergence order
    pub fn into_plan(self, session: &Rc<Session>) -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();

        let sections = [
            (&repo_group::KIND, self.repo_groups),
            (&user::KIND, self.users),
            (&user_group::KIND, self.user_groups),
            (&repository::KIND, self.repositories),
        ];
        for (kind, entries) in sections {
            for entry in entries {
                plan.push(Box::new(EntityResource::new(
                    Rc::clone(session),
                    kind,
                    entry.name,
                    entry.state,
                    entry.attributes,
                )));
            }
        }

        for entry in self.memberships {
            plan.push(Box::new(MembershipResource::new(
                Rc::clone(session),
                entry.groups,
                entry.users,
                entry.state,
            )));
        }

        for entry in self.permissions {
            let subjects = entry.subjects();
            plan.push(Box::new(PermissionResource::new(
                Rc::clone(session),
                subjects,
                Targets::new(entry.repositories, entry.repo_groups),
                entry.level,
                entry.state,
            )));
        }

        plan
    }
}
