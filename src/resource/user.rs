//! User entity
//!
//! `extern_type` is the authentication method and cannot change after
//! creation. `password` is sent on create only: the server never reports it,
//! so it cannot be compared.

use super::EntityKind;

pub static KIND: EntityKind = EntityKind {
    name: "user",
    list_method: "get_users",
    get_method: "get_user",
    create_method: "create_user",
    update_method: "update_user",
    delete_method: "delete_user",
    id_arg: "userid",
    name_field: "username",
    parent_arg: None,
    attributes: &[
        "email",
        "firstname",
        "lastname",
        "active",
        "admin",
        "extern_type",
        "extern_name",
        "password",
    ],
    immutable: &["extern_type"],
    create_only: &["password"],
    reported_as: &[],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{kallithea, session};
    use crate::resource::EntityResource;
    use declarative::{Action, ApplyContext, DesiredAttributes, Presence, Resource};
    use rpckit::{MockTransport, ProductFamily};
    use serde_json::json;

    fn server(extern_type: &str) -> MockTransport {
        let mock = MockTransport::new();
        mock.respond("get_users", json!([{"username": "alice"}]));
        mock.respond_when(
            "get_user",
            "userid",
            "alice",
            json!({
                "username": "alice",
                "email": "alice@example.com",
                "active": true,
                "admin": false,
                "extern_type": extern_type,
                "extern_name": "alice",
                "permissions": {"repositories": {}, "repositories_groups": {}},
            }),
        );
        mock.respond_by_default(json!({"msg": "ok"}));
        mock
    }

    #[test]
    fn test_password_never_diffed_or_updated() {
        let mock = server("internal");
        let desired = DesiredAttributes::new()
            .set("password", "s3cret")
            .set("admin", true);

        let report = EntityResource::new(kallithea(&mock), &KIND, "alice", Presence::Present, desired)
            .converge(&ApplyContext::default())
            .unwrap();

        assert_eq!(report.diff.iter().collect::<Vec<_>>(), vec!["admin"]);
        let update = &mock.calls_to("update_user")[0];
        assert!(!update.args.contains_key("password"));
    }

    #[test]
    fn test_password_sent_on_create() {
        let mock = server("internal");
        let desired = DesiredAttributes::new()
            .set("password", "s3cret")
            .set("email", "bob@example.com");

        let report = EntityResource::new(kallithea(&mock), &KIND, "bob", Presence::Present, desired)
            .converge(&ApplyContext::default())
            .unwrap();

        assert_eq!(report.action, Action::Create);
        let create = &mock.calls_to("create_user")[0];
        assert_eq!(create.arg("username"), Some("bob"));
        assert_eq!(create.arg("password"), Some("s3cret"));
    }

    #[test]
    fn test_auth_method_change_rejected() {
        let mock = server("internal");
        let desired = DesiredAttributes::new().set("extern_type", "ldap");

        let err = EntityResource::new(kallithea(&mock), &KIND, "alice", Presence::Present, desired)
            .converge(&ApplyContext::default())
            .unwrap_err();

        assert!(err.to_string().contains("extern_type"));
        assert!(mock.write_calls().is_empty());
    }

    #[test]
    fn test_rhodecode_internal_auth_is_canonical() {
        let mock = server("rhodecode");
        let desired = DesiredAttributes::new().set("extern_type", "internal");

        let report = EntityResource::new(
            session(&mock, ProductFamily::RhodeCode),
            &KIND,
            "alice",
            Presence::Present,
            desired,
        )
        .converge(&ApplyContext::default())
        .unwrap();

        assert!(!report.changed);
    }

    #[test]
    fn test_rhodecode_create_translates_auth() {
        let mock = server("rhodecode");
        let desired = DesiredAttributes::new().set("extern_type", "internal");

        EntityResource::new(
            session(&mock, ProductFamily::RhodeCode),
            &KIND,
            "carol",
            Presence::Present,
            desired,
        )
        .converge(&ApplyContext::default())
        .unwrap();

        let create = &mock.calls_to("create_user")[0];
        assert_eq!(create.arg("extern_type"), Some("rhodecode"));
    }
}
