//! Execution planner - ordered list of resources to reconcile

use crate::resource::{BoxedResource, Resource};

/// An execution plan: resources in the order they must converge
///
/// Order matters because later resources may live inside earlier ones
/// (a repository inside a repository group, a grant on a new repository).
#[derive(Default)]
pub struct ExecutionPlan {
    resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource
    pub fn push(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Resources in plan order
    pub fn resources(&self) -> &[BoxedResource] {
        &self.resources
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            resources: self
                .resources
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"; the name may itself contain dots
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type, name))
            }
        }
    }

    /// Total number of resources in the plan
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('.') {
        Some((resource_type, name)) => (resource_type, Some(name)),
        None => (target, None),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(resource: &dyn Resource, resource_type: &str, name: Option<&str>) -> bool {
    // Allow plural aliases
    let matches_type = match resource_type {
        "repositories" | "repos" => resource.resource_type() == "repository",
        "repo_groups" => resource.resource_type() == "repo_group",
        "users" => resource.resource_type() == "user",
        "user_groups" => resource.resource_type() == "user_group",
        "memberships" => resource.resource_type() == "membership",
        "permissions" => resource.resource_type() == "permission",
        _ => resource.resource_type() == resource_type,
    };
    if !matches_type {
        return false;
    }

    if let Some(n) = name
        && resource.id() != n
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::Report;

    #[derive(Debug)]
    struct Named(&'static str, &'static str);

    impl Resource for Named {
        fn id(&self) -> String {
            self.1.to_string()
        }
        fn description(&self) -> String {
            String::new()
        }
        fn resource_type(&self) -> &'static str {
            self.0
        }
        fn converge(&self, ctx: &ApplyContext) -> anyhow::Result<Report> {
            Ok(Report::unchanged(self.0, self.1, ctx.mode))
        }
    }

    fn plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        plan.push(Box::new(Named("repo_group", "web")));
        plan.push(Box::new(Named("repository", "web/site.io")));
        plan.push(Box::new(Named("repository", "tools")));
        plan.push(Box::new(Named("user", "alice")));
        plan
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("repository"), ("repository", None));
        assert_eq!(
            parse_target("repository.web/site.io"),
            ("repository", Some("web/site.io"))
        );
    }

    #[test]
    fn test_filter_by_type_alias() {
        let filtered = plan().filter_by_target(Some("repos"));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_by_type_and_name() {
        let filtered = plan().filter_by_target(Some("repository.web/site.io"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.resources()[0].id(), "web/site.io");
    }

    #[test]
    fn test_no_filter_keeps_order() {
        let filtered = plan().filter_by_target(None);
        let ids: Vec<String> = filtered.resources().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["web", "web/site.io", "tools", "alice"]);
    }
}
