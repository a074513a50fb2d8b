//! Repository group entity

use super::EntityKind;

pub static KIND: EntityKind = EntityKind {
    name: "repo_group",
    list_method: "get_repo_groups",
    get_method: "get_repo_group",
    create_method: "create_repo_group",
    update_method: "update_repo_group",
    delete_method: "delete_repo_group",
    id_arg: "repogroupid",
    name_field: "group_name",
    parent_arg: Some("parent"),
    attributes: &["description", "owner"],
    immutable: &[],
    create_only: &[],
    reported_as: &[("description", "group_description")],
};
