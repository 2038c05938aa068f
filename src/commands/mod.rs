//! CLI command implementations.
//!
//! Each command reads from an already built [`PackageCache`] and writes to
//! the given output, so it can be exercised without a real package engine.

mod list;
mod search;
mod show;

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::cache::{INSTALLED_REPO, PackageCache, PackageRecord};
use crate::session::Session;

pub use list::list;
pub use search::search;
pub use show::show;

/// Print `yes` or `no` depending on whether `name` is installed.
pub fn installed<S: Session, W: Write>(cache: &PackageCache<S>, name: &str, out: &mut W) -> Result<()> {
    let answer = if cache.is_installed(name) { "yes" } else { "no" };
    writeln!(out, "{}", answer)?;
    Ok(())
}

#[derive(Serialize)]
struct Stats<'a> {
    releasever: Option<&'a str>,
    cachedir: &'a std::path::Path,
    candidates: usize,
    installed: usize,
    packages: usize,
}

/// Print cache totals.
pub fn stats<S: Session, W: Write>(cache: &PackageCache<S>, json: bool, out: &mut W) -> Result<()> {
    let stats = Stats {
        releasever: cache.releasever(),
        cachedir: &cache.cache_dirs().cachedir,
        candidates: cache.total_candidates(),
        installed: cache.total_installed(),
        packages: cache.len(),
    };

    if json {
        print_json(out, &stats)?;
        return Ok(());
    }

    writeln!(out, "Release version: {}", stats.releasever.unwrap_or("(unknown)"))?;
    writeln!(out, "Cache directory: {}", stats.cachedir.display())?;
    writeln!(out, "Candidates: {}", stats.candidates)?;
    writeln!(out, "Installed: {}", stats.installed)?;
    writeln!(out, "Packages: {}", stats.packages)?;
    Ok(())
}

pub(crate) fn print_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// One listing line: name, version-release, repo and state.
pub(crate) fn format_row(record: &PackageRecord) -> String {
    let (evr, repo) = match (record.candidate(), record.installed()) {
        (Some(candidate), _) => (candidate.evr(), candidate.repoid.as_str()),
        (None, Some(installed)) => (installed.evr(), INSTALLED_REPO),
        (None, None) => ("(none)".to_string(), "-"),
    };
    let state = if record.is_installed() { "installed" } else { "available" };
    format!("{:<32} {:<28} {:<16} {}", record.name(), evr, repo, state)
}
