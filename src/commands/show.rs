use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use super::print_json;
use crate::cache::{PackageCache, PackageRecord};
use crate::session::{Package, Session};

#[derive(Serialize)]
struct Details<'a> {
    #[serde(flatten)]
    record: &'a PackageRecord,
    pkname: Option<String>,
    cname: Option<String>,
}

/// Show everything the cache knows about `name`.
#[tracing::instrument(skip(cache, out))]
pub fn show<S: Session, W: Write>(
    cache: &PackageCache<S>,
    name: &str,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let record = cache.lookup(name)?;

    if json {
        let details = Details {
            record,
            pkname: record.pkname().ok(),
            cname: record.cname().ok(),
        };
        return print_json(out, &details);
    }

    writeln!(out, "Package: {}", record.name())?;
    if let Some(summary) = record.summary() {
        writeln!(out, "Summary: {}", summary)?;
    }
    print_version(out, "Candidate", record.candidate())?;
    print_version(out, "Installed", record.installed())?;
    if let Ok(pkname) = record.pkname() {
        writeln!(out, "Package id: {}", pkname)?;
    }
    if let Ok(cname) = record.cname() {
        writeln!(out, "Component id: {}", cname)?;
    }
    Ok(())
}

fn print_version<W: Write>(out: &mut W, label: &str, pkg: Option<&Package>) -> Result<()> {
    match pkg {
        Some(pkg) => {
            write!(out, "{}: {} ({}, {})", label, pkg.evr(), pkg.arch, pkg.repoid)?;
            if let Some(size) = pkg.download_size {
                write!(out, " {} bytes", size)?;
            }
            writeln!(out)?;
            if !pkg.license.is_empty() {
                writeln!(out, "  License: {}", pkg.license)?;
            }
        }
        None => writeln!(out, "{}: (none)", label)?,
    }
    Ok(())
}
