// Status command for showing the working directory state

use crate::session::Session;
use crate::ui;
use crate::versions::Namespace;

pub fn status(session: &Session) -> anyhow::Result<i32> {
    let config = session.config();
    let store = session.store();

    ui::status("Working directory", &session.workspace().root().display().to_string());
    ui::status("Manifest", &config.manifest_url);
    ui::status("Mod manifest", &config.mod_manifest_url);

    let mut healthy = true;
    for namespace in Namespace::ALL {
        match store.failure(namespace) {
            Some(failure) => {
                healthy = false;
                ui::warning(&failure.to_string());
            }
            None => ui::dim(&format!("{} {} version(s) loaded", store.len(namespace), namespace)),
        }
    }

    let active = session.active();
    match active.game {
        Some(id) => ui::success(&format!("Active version: {}", id)),
        None => ui::dim("No version set up"),
    }
    if let Some(id) = active.mod_build {
        ui::success(&format!("Active mod build: {}", id));
    }
    if session.workspace().has_sources() {
        ui::dim("Sources present");
    }

    Ok(if healthy { 0 } else { 1 })
}
