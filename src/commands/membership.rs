//! `membership` - add users to or remove them from user groups

use anyhow::{Result, bail};
use declarative::ExecutionPlan;

use crate::Context;
use crate::cli::MembershipArgs;
use crate::engine;
use crate::membership::MembershipResource;

pub fn run(ctx: &Context, args: MembershipArgs) -> Result<()> {
    if args.groups.is_empty() || args.users.is_empty() {
        bail!("at least one --group and one --user are required");
    }

    let session = ctx.connect()?;
    let mut plan = ExecutionPlan::new();
    plan.push(Box::new(MembershipResource::new(
        session,
        args.groups,
        args.users,
        args.state.into(),
    )));

    engine::run(&plan, &ctx.apply_context(), ctx.output())?;
    Ok(())
}
