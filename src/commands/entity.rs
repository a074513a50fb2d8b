//! `repo`, `repo-group`, `user`, `user-group` - reconcile one object

use anyhow::Result;
use declarative::ExecutionPlan;

use crate::Context;
use crate::cli::EntityArgs;
use crate::engine;
use crate::resource::{EntityKind, EntityResource};

pub fn run(ctx: &Context, kind: &'static EntityKind, args: EntityArgs) -> Result<()> {
    let desired = args.desired();
    kind.validate(&desired)?;

    let session = ctx.connect()?;
    let mut plan = ExecutionPlan::new();
    plan.push(Box::new(EntityResource::new(
        session,
        kind,
        args.name,
        args.state.into(),
        desired,
    )));

    engine::run(&plan, &ctx.apply_context(), ctx.output())?;
    Ok(())
}
