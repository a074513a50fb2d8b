//! User group membership reconciliation
//!
//! Membership is read per group from `get_user_group(...).members` and changed
//! one (group, user) pair per call. A failure halfway through a batch leaves
//! the earlier pairs applied.

use anyhow::Result;
use declarative::{Action, ApplyContext, Presence, Report, Resource};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::engine::Session;
use crate::resource::{Reconciler, user_group};

/// Per-group sets of users; groups with nothing to do are left out
pub type MembershipMap = BTreeMap<String, BTreeSet<String>>;

/// Reads and changes user group membership
pub struct MembershipReconciler<'a> {
    session: &'a Session,
    groups: Reconciler<'a>,
}

impl<'a> MembershipReconciler<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            groups: Reconciler::new(session, &user_group::KIND),
        }
    }

    /// Current members of one group
    ///
    /// Members are reported either as user objects or as bare names.
    pub fn members(&self, group: &str) -> Result<BTreeSet<String>> {
        let raw = self.groups.fetch_raw(group)?;
        let members = raw
            .get("members")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(members
            .iter()
            .filter_map(|member| match member {
                Value::String(name) => Some(name.clone()),
                other => other
                    .get("username")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect())
    }

    /// Users in `desired` that are not yet members, per group
    pub fn missing(&self, groups: &[String], desired: &BTreeSet<String>) -> Result<MembershipMap> {
        self.collect(groups, |current| desired.difference(current).cloned().collect())
    }

    /// Users in `to_remove` that are currently members, per group
    pub fn excess(&self, groups: &[String], to_remove: &BTreeSet<String>) -> Result<MembershipMap> {
        self.collect(groups, |current| {
            to_remove.intersection(current).cloned().collect()
        })
    }

    /// Add every (group, user) pair, one call each
    pub fn add(&self, missing: &MembershipMap) -> Result<Vec<Value>> {
        self.apply("add_user_to_user_group", missing)
    }

    /// Remove every (group, user) pair, one call each
    pub fn remove(&self, excess: &MembershipMap) -> Result<Vec<Value>> {
        self.apply("remove_user_from_user_group", excess)
    }

    fn collect<F>(&self, groups: &[String], select: F) -> Result<MembershipMap>
    where
        F: Fn(&BTreeSet<String>) -> BTreeSet<String>,
    {
        let mut map = MembershipMap::new();
        for group in groups {
            let users = select(&self.members(group)?);
            if !users.is_empty() {
                map.insert(group.clone(), users);
            }
        }
        Ok(map)
    }

    fn apply(&self, method: &str, map: &MembershipMap) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        for (group, users) in map {
            for user in users {
                log::info!("{} {} / {}", method, group, user);
                results.push(
                    self.session
                        .client
                        .call(method, json!({"usergroupid": group, "userid": user}))?,
                );
            }
        }
        Ok(results)
    }
}

/// Declared membership of a set of users in a set of user groups
#[derive(Debug)]
pub struct MembershipResource {
    session: Rc<Session>,
    groups: Vec<String>,
    users: BTreeSet<String>,
    presence: Presence,
}

impl MembershipResource {
    pub fn new(
        session: Rc<Session>,
        groups: Vec<String>,
        users: impl IntoIterator<Item = String>,
        presence: Presence,
    ) -> Self {
        Self {
            session,
            groups,
            users: users.into_iter().collect(),
            presence,
        }
    }
}

impl Resource for MembershipResource {
    fn id(&self) -> String {
        self.groups.join(",")
    }

    fn description(&self) -> String {
        let users: Vec<&str> = self.users.iter().map(String::as_str).collect();
        format!(
            "Ensure {} {} in {}",
            users.join(", "),
            if self.presence == Presence::Absent { "are not members" } else { "are members" },
            self.id()
        )
    }

    fn resource_type(&self) -> &'static str {
        "membership"
    }

    fn converge(&self, ctx: &ApplyContext) -> Result<Report> {
        let reconciler = MembershipReconciler::new(&self.session);
        let id = self.id();

        let (action, targets) = match self.presence {
            Presence::Present => (Action::AddMembers, reconciler.missing(&self.groups, &self.users)?),
            Presence::Absent => (Action::RemoveMembers, reconciler.excess(&self.groups, &self.users)?),
            Presence::Query => {
                let mut current = BTreeMap::new();
                for group in &self.groups {
                    current.insert(group.clone(), reconciler.members(group)?);
                }
                return Ok(Report::query("membership", &id, ctx.mode).with_current(json!(current)));
            }
        };

        if targets.is_empty() {
            return Ok(Report::unchanged("membership", &id, ctx.mode));
        }

        let report = Report::changed("membership", &id, action, ctx.mode).with_targets(json!(targets));
        if ctx.dry_run() {
            log::info!("Would change membership of {}", id);
            return Ok(report);
        }

        let remote = match action {
            Action::AddMembers => reconciler.add(&targets)?,
            _ => reconciler.remove(&targets)?,
        };
        Ok(report.with_remote(remote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::kallithea;
    use declarative::Mode;
    use rpckit::MockTransport;

    fn server() -> MockTransport {
        let mock = MockTransport::new();
        mock.respond(
            "get_user_groups",
            json!([{"group_name": "devs"}, {"group_name": "ops"}]),
        );
        mock.respond_when(
            "get_user_group",
            "usergroupid",
            "devs",
            json!({"group_name": "devs", "members": [{"username": "alice"}, {"username": "bob"}]}),
        );
        mock.respond_when(
            "get_user_group",
            "usergroupid",
            "ops",
            json!({"group_name": "ops", "members": ["carol"]}),
        );
        mock.respond_by_default(json!({"success": true}));
        mock
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_members_accepts_objects_and_names() {
        let mock = server();
        let session = kallithea(&mock);
        let reconciler = MembershipReconciler::new(&session);

        assert_eq!(reconciler.members("devs").unwrap(), set(&["alice", "bob"]));
        assert_eq!(reconciler.members("ops").unwrap(), set(&["carol"]));
    }

    #[test]
    fn test_missing_per_group() {
        let mock = server();
        let session = kallithea(&mock);
        let reconciler = MembershipReconciler::new(&session);

        let missing = reconciler
            .missing(&groups(&["devs", "ops"]), &set(&["alice", "carol"]))
            .unwrap();

        assert_eq!(missing.len(), 2);
        assert_eq!(missing["devs"], set(&["carol"]));
        assert_eq!(missing["ops"], set(&["alice"]));
    }

    #[test]
    fn test_excess_only_current_members() {
        let mock = server();
        let session = kallithea(&mock);
        let reconciler = MembershipReconciler::new(&session);

        let excess = reconciler
            .excess(&groups(&["devs", "ops"]), &set(&["bob", "dave"]))
            .unwrap();

        assert_eq!(excess.len(), 1);
        assert_eq!(excess["devs"], set(&["bob"]));
    }

    #[test]
    fn test_unknown_group_fails() {
        let mock = server();
        let session = kallithea(&mock);
        let reconciler = MembershipReconciler::new(&session);

        let err = reconciler
            .missing(&groups(&["devs", "nobody"]), &set(&["alice"]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<rpckit::Error>(),
            Some(rpckit::Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_issues_one_call_per_pair() {
        let mock = server();
        let resource = MembershipResource::new(
            kallithea(&mock),
            groups(&["devs", "ops"]),
            groups(&["alice", "dave"]),
            Presence::Present,
        );

        let report = resource.converge(&ApplyContext::default()).unwrap();

        assert!(report.changed);
        assert_eq!(report.action, Action::AddMembers);
        assert_eq!(
            report.targets,
            Some(json!({"devs": ["dave"], "ops": ["alice", "dave"]}))
        );
        let adds = mock.calls_to("add_user_to_user_group");
        assert_eq!(adds.len(), 3);
        assert_eq!(adds[0].arg("usergroupid"), Some("devs"));
        assert_eq!(adds[0].arg("userid"), Some("dave"));
        assert_eq!(report.remote.len(), 3);
    }

    #[test]
    fn test_remove_in_dry_run() {
        let mock = server();
        let resource = MembershipResource::new(
            kallithea(&mock),
            groups(&["devs"]),
            groups(&["bob"]),
            Presence::Absent,
        );

        let report = resource
            .converge(&ApplyContext::new(Mode::DryRun))
            .unwrap();

        assert!(report.changed);
        assert_eq!(report.targets, Some(json!({"devs": ["bob"]})));
        assert!(mock.write_calls().is_empty());
    }

    #[test]
    fn test_already_members_is_unchanged() {
        let mock = server();
        let resource = MembershipResource::new(
            kallithea(&mock),
            groups(&["devs"]),
            groups(&["alice"]),
            Presence::Present,
        );

        let report = resource.converge(&ApplyContext::default()).unwrap();

        assert!(!report.changed);
        assert!(mock.write_calls().is_empty());
    }
}
