//! `server-info` - identify the server without changing anything

use anyhow::Result;
use serde_json::json;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let connection = ctx.connection()?;
    let session = ctx.connect_to(&connection)?;
    let profile = session.profile();

    if ctx.json {
        let info = json!({
            "url": connection.url,
            "family": session.identity.family,
            "version": session.identity.version,
            "minimum_version": profile.minimum_version,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }

    ui::header("Server");
    ui::kv("URL", &connection.url);
    ui::kv("Product", &session.identity.family.to_string());
    ui::kv("Version", session.identity.version.as_str());
    ui::kv("Minimum", profile.minimum_version);
    ui::kv("Internal auth", profile.internal_auth);
    println!();
    ui::success("Server is supported");
    Ok(())
}
