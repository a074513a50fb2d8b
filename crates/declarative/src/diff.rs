//! Diff computation for attribute sets

use crate::error::{Error, Result};
use crate::types::{CurrentAttributes, DesiredAttributes, Diff};

/// Compute the names of attributes whose desired value differs from current
///
/// Unspecified desired attributes and names listed in `ignore` never appear.
/// An attribute missing from `current` differs from any specified value.
pub fn compute_diff(
    desired: &DesiredAttributes,
    current: &CurrentAttributes,
    ignore: &[&str],
) -> Diff {
    desired
        .specified()
        .filter(|(name, _)| !ignore.contains(name))
        .filter(|(name, value)| current.get(*name) != Some(*value))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Reject a diff that touches an attribute which cannot change after creation
pub fn check_immutable(resource: &str, diff: &Diff, immutable: &[&str]) -> Result<()> {
    match immutable.iter().find(|name| diff.contains(**name)) {
        Some(attribute) => Err(Error::ImmutableAttribute {
            resource: resource.to_string(),
            attribute: (*attribute).to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn current(value: Value) -> CurrentAttributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_diff_reports_changed_only() {
        let desired = DesiredAttributes::new()
            .set("repo_type", "git")
            .set("private", true);
        let current = current(json!({"repo_type": "git", "private": false, "description": ""}));

        let diff = compute_diff(&desired, &current, &[]);
        assert_eq!(diff.into_iter().collect::<Vec<_>>(), vec!["private"]);
    }

    #[test]
    fn test_diff_excludes_unspecified_regardless_of_current() {
        let desired = DesiredAttributes::new()
            .unspecified("description")
            .unspecified("private")
            .set("owner", "admin");

        for state in [
            json!({"description": "x", "private": true, "owner": "admin"}),
            json!({"owner": "admin"}),
            json!({}),
        ] {
            let diff = compute_diff(&desired, &current(state), &[]);
            assert!(!diff.contains("description"));
            assert!(!diff.contains("private"));
        }
    }

    #[test]
    fn test_diff_missing_current_attribute_differs() {
        let desired = DesiredAttributes::new().set("landing_rev", "rev:tip");
        let diff = compute_diff(&desired, &current(json!({})), &[]);
        assert!(diff.contains("landing_rev"));
    }

    #[test]
    fn test_diff_ignore_list() {
        let desired = DesiredAttributes::new()
            .set("repo_name", "other")
            .set("password", "x");
        let diff = compute_diff(
            &desired,
            &current(json!({"repo_name": "proj"})),
            &["repo_name", "password"],
        );
        assert!(diff.is_empty());
    }

    #[test]
    fn test_check_immutable() {
        let mut diff = Diff::new();
        diff.insert("private".to_string());
        assert!(check_immutable("proj", &diff, &["repo_type"]).is_ok());

        diff.insert("repo_type".to_string());
        let err = check_immutable("proj", &diff, &["repo_type"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot change immutable attribute repo_type of proj"
        );
    }
}
