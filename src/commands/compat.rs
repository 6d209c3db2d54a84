// Compat command for listing versions a mod build is compatible with

use crate::cli::Target;
use crate::session::Session;
use crate::ui;
use crate::versions::Scheme;

pub fn compat(session: &Session, mod_id: &str, target: Target) -> anyhow::Result<i32> {
    let scheme = match target {
        Target::Client => Scheme::Client,
        Target::Server => Scheme::Server,
    };
    let mapping = session.mapping();

    let Some(token) = mapping.range_token(Scheme::ModBuild, mod_id, scheme) else {
        ui::error(&format!("No compatibility data for mod build '{}'", mod_id));
        return Ok(1);
    };

    let ids = mapping.compatible_identifiers(session.store(), Scheme::ModBuild, mod_id, scheme);
    ui::dim(&format!("Range: {}", token));
    if ids.is_empty() {
        ui::warning(&format!("No loaded version falls in {}", token));
        return Ok(1);
    }
    for id in ids {
        ui::action(&id);
    }
    Ok(0)
}
