use anyhow::Result;
use log::debug;
use std::io::Write;

use super::{format_row, print_json};
use crate::cache::{PackageCache, PackageRecord};
use crate::session::Session;

/// List every package in the cache, or only installed ones.
#[tracing::instrument(skip(cache, out))]
pub fn list<S: Session, W: Write>(
    cache: &PackageCache<S>,
    installed_only: bool,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let records: Vec<&PackageRecord> = cache
        .values()
        .filter(|r| !installed_only || r.is_installed())
        .collect();
    debug!("Listing {} of {} package(s)", records.len(), cache.len());

    if json {
        return print_json(out, &records);
    }

    if records.is_empty() {
        writeln!(out, "No packages found.")?;
        return Ok(());
    }

    for record in records {
        writeln!(out, "{}", format_row(record))?;
    }
    Ok(())
}
