//! Repository entity

use super::EntityKind;

pub static KIND: EntityKind = EntityKind {
    name: "repository",
    list_method: "get_repos",
    get_method: "get_repo",
    create_method: "create_repo",
    update_method: "update_repo",
    delete_method: "delete_repo",
    id_arg: "repoid",
    name_field: "repo_name",
    parent_arg: Some("repo_group"),
    attributes: &[
        "repo_type",
        "description",
        "private",
        "clone_uri",
        "landing_rev",
        "owner",
        "enable_statistics",
        "enable_downloads",
        "enable_locking",
    ],
    immutable: &["repo_type"],
    create_only: &[],
    reported_as: &[],
};
