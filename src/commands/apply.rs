//! `apply` - reconcile a manifest

use anyhow::Result;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine;
use crate::schema::Manifest;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    // Validate before touching the server
    let manifest = Manifest::load(&args.manifest)?;
    let session = ctx.connect()?;

    let plan = manifest
        .into_plan(&session)
        .filter_by_target(args.target.as_deref());
    log::info!("{} resources to reconcile", plan.len());

    engine::run(&plan, &ctx.apply_context(), ctx.output())?;
    Ok(())
}
