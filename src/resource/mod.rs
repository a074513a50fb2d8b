//! Entity reconciliation: repositories, repository groups, users, user groups
//!
//! Every entity kind is described by an [`EntityKind`] table naming its
//! remote methods and attributes. [`Reconciler`] is the CRUD primitive over
//! one kind; [`EntityResource`] is the orchestration that decides between
//! create, update, delete and query and enforces immutable attributes.

pub mod repo_group;
pub mod repository;
pub mod user;
pub mod user_group;

use anyhow::{Result, bail};
use declarative::{
    Action, ApplyContext, CurrentAttributes, DesiredAttributes, Diff, Presence, Report, Resource,
    check_immutable, compute_diff,
};
use rpckit::{Profile, RpcClient};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::engine::Session;

/// Remote method table and attribute rules for one entity kind
#[derive(Debug)]
pub struct EntityKind {
    /// Resource type name, e.g. "repository"
    pub name: &'static str,
    pub list_method: &'static str,
    pub get_method: &'static str,
    pub create_method: &'static str,
    pub update_method: &'static str,
    pub delete_method: &'static str,
    /// Argument naming an existing object, e.g. "repoid"
    pub id_arg: &'static str,
    /// Field carrying the name in listings and in create calls
    pub name_field: &'static str,
    /// Create argument for the parent of a hierarchical name
    pub parent_arg: Option<&'static str>,
    /// Attributes that may be declared
    pub attributes: &'static [&'static str],
    /// Attributes fixed at creation
    pub immutable: &'static [&'static str],
    /// Attributes sent on create only and never compared
    pub create_only: &'static [&'static str],
    /// Attributes the server reports under a different field name
    pub reported_as: &'static [(&'static str, &'static str)],
}

impl EntityKind {
    fn reported_field(&self, attribute: &'static str) -> &'static str {
        self.reported_as
            .iter()
            .find(|(name, _)| *name == attribute)
            .map_or(attribute, |(_, field)| field)
    }

    /// Reject attributes this kind does not know
    pub fn validate(&self, desired: &DesiredAttributes) -> Result<()> {
        for name in desired.names() {
            if !self.attributes.contains(&name) {
                bail!(
                    "unknown {} attribute '{}' (expected one of: {})",
                    self.name,
                    name,
                    self.attributes.join(", ")
                );
            }
        }
        Ok(())
    }
}

/// Split a hierarchical name on its last separator into (parent, basename)
pub fn split_hierarchy(id: &str) -> (Option<&str>, &str) {
    match id.rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, id),
    }
}

/// Owners come back as a user object from some calls and a name from others
fn owner_name(value: &Value) -> Value {
    match value.get("username") {
        Some(name) => name.clone(),
        None => value.clone(),
    }
}

/// Landing revisions are reported as `[kind, name]` and declared as `kind:name`
fn landing_rev(value: &Value) -> Value {
    match value.as_array() {
        Some(parts) => Value::from(
            parts
                .iter()
                .map(|part| part.as_str().map_or_else(|| part.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(":"),
        ),
        None => value.clone(),
    }
}

/// CRUD primitive over one entity kind
///
/// Listings and fetched objects are cached for the lifetime of the
/// reconciler and dropped after any mutation.
pub struct Reconciler<'a> {
    client: &'a RpcClient,
    profile: &'static Profile,
    kind: &'static EntityKind,
    listing: RefCell<Option<Vec<Value>>>,
    fetched: RefCell<BTreeMap<String, Value>>,
}

impl<'a> Reconciler<'a> {
    pub fn new(session: &'a Session, kind: &'static EntityKind) -> Self {
        Self {
            client: &session.client,
            profile: session.profile(),
            kind,
            listing: RefCell::new(None),
            fetched: RefCell::new(BTreeMap::new()),
        }
    }

    /// Whether an object with this name exists
    ///
    /// Scans the full listing: no single-object existence call is assumed.
    pub fn exists(&self, id: &str) -> Result<bool> {
        if self.listing.borrow().is_none() {
            let listing = self.client.call(self.kind.list_method, Value::Object(Map::new()))?;
            let items = match listing {
                Value::Array(items) => items,
                other => bail!(
                    "{} returned {} instead of a list",
                    self.kind.list_method,
                    other
                ),
            };
            *self.listing.borrow_mut() = Some(items);
        }

        Ok(self.listing.borrow().iter().flatten().any(|item| {
            item.get(self.kind.name_field).and_then(Value::as_str) == Some(id)
        }))
    }

    /// The object as the server reports it
    pub fn fetch_raw(&self, id: &str) -> Result<Value> {
        if let Some(raw) = self.fetched.borrow().get(id) {
            return Ok(raw.clone());
        }
        if !self.exists(id)? {
            return Err(rpckit::Error::not_found(self.kind.name, id).into());
        }

        let mut args = Map::new();
        args.insert(self.kind.id_arg.to_string(), Value::from(id));
        let raw = self.client.call(self.kind.get_method, Value::Object(args))?;

        self.fetched.borrow_mut().insert(id.to_string(), raw.clone());
        Ok(raw)
    }

    /// Declarable attributes of an existing object, in canonical form
    pub fn fetch_current(&self, id: &str) -> Result<CurrentAttributes> {
        let raw = self.fetch_raw(id)?;
        let mut current = CurrentAttributes::new();

        for attribute in self.kind.attributes {
            let Some(value) = raw.get(self.kind.reported_field(*attribute)) else {
                continue;
            };
            let value = match *attribute {
                "owner" => owner_name(value),
                "landing_rev" => landing_rev(value),
                _ => value.clone(),
            };
            current.insert(
                (*attribute).to_string(),
                self.profile.incoming(attribute, &value),
            );
        }

        Ok(current)
    }

    /// Names of specified attributes whose value differs from current
    pub fn diff(&self, id: &str, desired: &DesiredAttributes) -> Result<Diff> {
        let current = self.fetch_current(id)?;
        Ok(compute_diff(desired, &current, self.kind.create_only))
    }

    /// Create an object from the specified attributes
    pub fn create(&self, id: &str, desired: &DesiredAttributes) -> Result<Value> {
        let mut args = Map::new();
        match self.kind.parent_arg {
            Some(parent_arg) => {
                let (parent, name) = split_hierarchy(id);
                args.insert(self.kind.name_field.to_string(), Value::from(name));
                if let Some(parent) = parent {
                    args.insert(parent_arg.to_string(), Value::from(parent));
                }
            }
            None => {
                args.insert(self.kind.name_field.to_string(), Value::from(id));
            }
        }
        self.insert_attributes(&mut args, desired, false);

        log::info!("Creating {} {}", self.kind.name, id);
        self.mutate(self.kind.create_method, args)
    }

    /// Update an existing object with the specified attributes
    pub fn update(&self, id: &str, desired: &DesiredAttributes) -> Result<Value> {
        let mut args = Map::new();
        args.insert(self.kind.id_arg.to_string(), Value::from(id));
        self.insert_attributes(&mut args, desired, true);

        log::info!("Updating {} {}", self.kind.name, id);
        self.mutate(self.kind.update_method, args)
    }

    /// Delete an existing object
    pub fn delete(&self, id: &str) -> Result<Value> {
        let mut args = Map::new();
        args.insert(self.kind.id_arg.to_string(), Value::from(id));

        log::info!("Deleting {} {}", self.kind.name, id);
        self.mutate(self.kind.delete_method, args)
    }

    fn insert_attributes(
        &self,
        args: &mut Map<String, Value>,
        desired: &DesiredAttributes,
        update: bool,
    ) {
        for (name, value) in desired.specified() {
            if update && self.kind.create_only.contains(&name) {
                continue;
            }
            args.insert(name.to_string(), self.profile.outgoing(name, value));
        }
    }

    fn mutate(&self, method: &str, args: Map<String, Value>) -> Result<Value> {
        let result = self.client.call(method, Value::Object(args))?;
        self.listing.borrow_mut().take();
        self.fetched.borrow_mut().clear();
        Ok(result)
    }
}

/// Declared state of one entity
#[derive(Debug)]
pub struct EntityResource {
    session: Rc<Session>,
    kind: &'static EntityKind,
    id: String,
    presence: Presence,
    desired: DesiredAttributes,
}

impl EntityResource {
    pub fn new(
        session: Rc<Session>,
        kind: &'static EntityKind,
        id: impl Into<String>,
        presence: Presence,
        desired: DesiredAttributes,
    ) -> Self {
        Self {
            session,
            kind,
            id: id.into(),
            presence,
            desired,
        }
    }

    fn ensure_present(&self, reconciler: &Reconciler, ctx: &ApplyContext) -> Result<Report> {
        if !reconciler.exists(&self.id)? {
            let diff: Diff = self.desired.specified().map(|(n, _)| n.to_string()).collect();
            let mut report = Report::changed(self.kind.name, &self.id, Action::Create, ctx.mode)
                .with_diff(diff);
            if ctx.dry_run() {
                log::info!("Would create {} {}", self.kind.name, self.id);
            } else {
                report.remote.push(reconciler.create(&self.id, &self.desired)?);
            }
            return Ok(report);
        }

        let diff = reconciler.diff(&self.id, &self.desired)?;
        if diff.is_empty() {
            return Ok(Report::unchanged(self.kind.name, &self.id, ctx.mode));
        }
        check_immutable(&self.id, &diff, self.kind.immutable)?;

        let changes: DesiredAttributes = self
            .desired
            .specified()
            .filter(|(name, _)| diff.contains(*name))
            .map(|(name, value)| (name, Some(value.clone())))
            .collect();

        let mut report =
            Report::changed(self.kind.name, &self.id, Action::Update, ctx.mode).with_diff(diff);
        if ctx.dry_run() {
            log::info!("Would update {} {}", self.kind.name, self.id);
        } else {
            report.remote.push(reconciler.update(&self.id, &changes)?);
        }
        Ok(report)
    }

    fn ensure_absent(&self, reconciler: &Reconciler, ctx: &ApplyContext) -> Result<Report> {
        if !reconciler.exists(&self.id)? {
            return Ok(Report::unchanged(self.kind.name, &self.id, ctx.mode));
        }

        let mut report = Report::changed(self.kind.name, &self.id, Action::Delete, ctx.mode);
        if ctx.dry_run() {
            log::info!("Would delete {} {}", self.kind.name, self.id);
        } else {
            report.remote.push(reconciler.delete(&self.id)?);
        }
        Ok(report)
    }
}

impl Resource for EntityResource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn description(&self) -> String {
        format!("Ensure {} {} is {}", self.kind.name, self.id, self.presence)
    }

    fn resource_type(&self) -> &'static str {
        self.kind.name
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Report> {
        self.kind.validate(&self.desired)?;
        let reconciler = Reconciler::new(&self.session, self.kind);

        match self.presence {
            Presence::Present => self.ensure_present(&reconciler, ctx),
            Presence::Absent => self.ensure_absent(&reconciler, ctx),
            Presence::Query => {
                let current = reconciler.fetch_current(&self.id)?;
                Ok(Report::query(self.kind.name, &self.id, ctx.mode)
                    .with_current(Value::Object(current)))
            }
        }
    }
}
