use std::io::{self, Write};

use anyhow::{Result, anyhow};
use mineralia_core::{Catalog, EntityStore};
use uuid::Uuid;

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Accept either a mineral id or an exact (case-insensitive) name.
pub(super) fn resolve_mineral_id<S: EntityStore>(catalog: &Catalog<S>, raw: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(raw.trim()) {
        return Ok(id);
    }
    catalog
        .store()
        .mineral_by_name(raw)?
        .map(|mineral| mineral.id)
        .ok_or_else(|| anyhow!("no mineral named '{raw}'"))
}
