//! Tab-separated query result lines shared by `rpm -qa` and `dnf repoquery`.

use super::{Package, SYSTEM_REPO};

/// Column order of a query result line.
pub const QUERY_FIELDS: [&str; 9] = [
    "name",
    "epoch",
    "version",
    "release",
    "arch",
    "repoid",
    "downloadsize",
    "license",
    "summary",
];

/// `dnf repoquery --qf` producing [`QUERY_FIELDS`]; dnf appends the newline.
pub(crate) const DNF_QUERYFORMAT: &str =
    "%{name}\t%{epoch}\t%{version}\t%{release}\t%{arch}\t%{repoid}\t%{downloadsize}\t%{license}\t%{summary}";

const NONE: &str = "(none)";

/// `rpm -qa --qf` producing [`QUERY_FIELDS`] for the installed database.
/// The rpm database knows no repositories, so every row reports
/// [`SYSTEM_REPO`] and no download size.
pub(crate) fn rpm_queryformat() -> String {
    let columns = [
        "%{NAME}",
        "%{EPOCHNUM}",
        "%{VERSION}",
        "%{RELEASE}",
        "%{ARCH}",
        SYSTEM_REPO,
        NONE,
        "%{LICENSE}",
        "%{SUMMARY}",
    ];
    format!("{}\n", columns.join("\t"))
}

/// Parse one result line. Returns `None` for lines that do not carry
/// every column or have an unparseable epoch.
pub fn parse_query_line(line: &str) -> Option<Package> {
    let mut cols = line.trim_end_matches(['\r', '\n']).splitn(QUERY_FIELDS.len(), '\t');

    let name = cols.next()?.trim();
    let epoch = cols.next()?.trim();
    let version = cols.next()?.trim();
    let release = cols.next()?.trim();
    let arch = cols.next()?.trim();
    let repoid = cols.next()?.trim();
    let size = cols.next()?.trim();
    let license = cols.next()?.trim();
    let summary = cols.next()?.trim();

    if name.is_empty() || version.is_empty() {
        return None;
    }

    let epoch = match epoch {
        "" | NONE => 0,
        other => other.parse().ok()?,
    };
    let download_size = size.parse::<u64>().ok().filter(|&n| n > 0);

    Some(Package {
        name: name.to_string(),
        epoch,
        version: version.to_string(),
        release: release.to_string(),
        arch: arch.to_string(),
        repoid: repoid.to_string(),
        summary: summary.to_string(),
        license: if license == NONE {
            String::new()
        } else {
            license.to_string()
        },
        download_size,
    })
}

/// Parse every well-formed line of query output, logging the rest.
pub(crate) fn parse_query_output(output: &str) -> Vec<Package> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_query_line(line);
            if parsed.is_none() {
                log::warn!("Skipping malformed query line: {:?}", line);
            }
            parsed
        })
        .collect()
}
