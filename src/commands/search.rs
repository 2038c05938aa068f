use anyhow::Result;
use std::io::Write;

use super::{format_row, print_json};
use crate::cache::PackageCache;
use crate::session::Session;

/// Search installed packages by shell glob.
#[tracing::instrument(skip(cache, out))]
pub fn search<S: Session, W: Write>(
    cache: &PackageCache<S>,
    pattern: &str,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let found = cache.search_installed(pattern);

    if json {
        return print_json(out, &found);
    }

    if found.is_empty() {
        writeln!(out, "No installed packages match '{}'.", pattern)?;
        return Ok(());
    }

    for record in found {
        writeln!(out, "{}", format_row(record))?;
    }
    Ok(())
}
