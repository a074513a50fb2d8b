//! `permission` - grant, revoke or report repository permissions

use anyhow::{Result, bail};
use declarative::{ExecutionPlan, Presence};

use crate::Context;
use crate::cli::PermissionArgs;
use crate::engine;
use crate::permission::{PermissionResource, Subject, Targets};

pub fn run(ctx: &Context, args: PermissionArgs) -> Result<()> {
    let presence: Presence = args.state.into();
    if args.users.is_empty() && args.user_groups.is_empty() {
        bail!("at least one --user or --user-group is required");
    }
    if presence == Presence::Present && args.level.is_none() {
        bail!("--level is required to grant a permission");
    }

    let subjects: Vec<Subject> = args
        .users
        .into_iter()
        .map(Subject::User)
        .chain(args.user_groups.into_iter().map(Subject::UserGroup))
        .collect();

    let session = ctx.connect()?;
    let mut plan = ExecutionPlan::new();
    plan.push(Box::new(PermissionResource::new(
        session,
        subjects,
        Targets::new(args.repositories, args.repo_groups),
        args.level,
        presence,
    )));

    engine::run(&plan, &ctx.apply_context(), ctx.output())?;
    Ok(())
}
