//! User group entity

use super::EntityKind;

pub static KIND: EntityKind = EntityKind {
    name: "user_group",
    list_method: "get_user_groups",
    get_method: "get_user_group",
    create_method: "create_user_group",
    update_method: "update_user_group",
    delete_method: "delete_user_group",
    id_arg: "usergroupid",
    name_field: "group_name",
    parent_arg: None,
    attributes: &["description", "owner", "active"],
    immutable: &[],
    create_only: &[],
    reported_as: &[("description", "group_description")],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::kallithea;
    use crate::resource::EntityResource;
    use declarative::{Action, ApplyContext, DesiredAttributes, Presence, Resource};
    use rpckit::MockTransport;
    use serde_json::json;

    #[test]
    fn test_deactivate_group() {
        let mock = MockTransport::new();
        mock.respond("get_user_groups", json!([{"group_name": "devs"}]));
        mock.respond(
            "get_user_group",
            json!({
                "group_name": "devs",
                "group_description": "Developers",
                "active": true,
                "owner": "admin",
                "members": [],
            }),
        );
        mock.respond("update_user_group", json!({"msg": "updated"}));

        let desired = DesiredAttributes::new()
            .set("description", "Developers")
            .set("active", false);
        let report = EntityResource::new(kallithea(&mock), &KIND, "devs", Presence::Present, desired)
            .converge(&ApplyContext::default())
            .unwrap();

        assert_eq!(report.action, Action::Update);
        assert_eq!(report.diff.iter().collect::<Vec<_>>(), vec!["active"]);
        let update = &mock.calls_to("update_user_group")[0];
        assert_eq!(update.arg("usergroupid"), Some("devs"));
        assert_eq!(update.args.get("active"), Some(&json!(false)));
        assert!(!update.args.contains_key("description"));
    }
}
