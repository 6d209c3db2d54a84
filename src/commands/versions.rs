// Versions command for listing a namespace, newest first

use crate::session::Session;
use crate::ui;
use crate::versions::Namespace;

pub fn versions(session: &Session, mods: bool) -> anyhow::Result<i32> {
    let namespace = if mods { Namespace::Mod } else { Namespace::Primary };
    let store = session.store();
    let records = store.list_sorted_by_recency(namespace);

    if records.is_empty() {
        if let Some(failure) = store.failure(namespace) {
            ui::error(&failure.to_string());
            return Ok(1);
        }
        ui::dim(&format!("No {} versions available", namespace));
        return Ok(0);
    }

    let active = session.active();
    let active_id = match namespace {
        Namespace::Primary => active.game,
        Namespace::Mod => active.mod_build,
    };

    ui::header(&format!("{} {} version(s)", records.len(), namespace));
    for record in records {
        let marker = if active_id.as_deref() == Some(record.id.as_str()) { "*" } else { " " };
        let released = record
            .released_at()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        ui::status(
            &format!("{} {:<16}", marker, record.id),
            &format!("{:<24} {}", record.to_string(), released),
        );
    }
    Ok(0)
}
