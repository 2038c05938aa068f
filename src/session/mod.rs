//! Package engine abstraction.
//!
//! A [`Session`] is the handle on the package database: it owns the engine
//! configuration, loads repository definitions, fetches metadata and answers
//! queries. [`PackageCache`](crate::PackageCache) only ever talks to the
//! engine through this trait.
//!
//! # Structure
//!
//! - `conf` - Session configuration and `$var` substitution
//! - `repo` - `.repo` definition parsing
//! - `query` - Query result line format
//! - `command` - [`CommandSession`], driving the system `rpm` and `dnf`

mod command;
mod conf;
mod query;
mod repo;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::progress::{DownloadProgress, Payload};

pub use command::CommandSession;
pub use conf::{Conf, basearch};
pub(crate) use conf::under_root;
pub use query::{QUERY_FIELDS, parse_query_line};
pub use repo::{RepoConfig, parse_repo_file};

/// Repository id the engine reports for installed packages.
pub const SYSTEM_REPO: &str = "@System";

/// A package as reported by the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub repoid: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_size: Option<u64>,
}

impl Package {
    /// `version-release`
    pub fn evr(&self) -> String {
        format!("{}-{}", self.version, self.release)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}.{}", self.name, self.version, self.release, self.arch)
    }
}

impl Payload for Package {
    fn download_size(&self) -> Option<u64> {
        self.download_size
    }
}

/// Handle on a package database.
///
/// Implementations are driven in a fixed order by the cache: configure,
/// [`read_all_repos`](Session::read_all_repos),
/// [`fill_sack`](Session::fill_sack), then the two queries.
pub trait Session {
    fn conf(&self) -> &Conf;
    fn conf_mut(&mut self) -> &mut Conf;

    /// Release version of the distribution under `install_root`, if one
    /// can be determined.
    fn detect_releasever(&self, install_root: &Path) -> Result<Option<String>>;

    /// Load every configured repository definition.
    fn read_all_repos(&mut self) -> Result<()>;

    /// Ids of the enabled repositories loaded so far.
    fn repo_ids(&self) -> Vec<String>;

    /// Fetch metadata for every enabled repository and build the package
    /// universe, reporting downloads to `progress`.
    fn fill_sack(&mut self, progress: &mut dyn DownloadProgress) -> Result<()>;

    /// Packages available for installation from enabled repositories.
    fn query_available(&self) -> Result<Vec<Package>>;

    /// Packages currently installed on the system.
    fn query_installed(&self) -> Result<Vec<Package>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curl() -> Package {
        Package {
            name: "curl".into(),
            epoch: 0,
            version: "7.61.1".into(),
            release: "18.el8".into(),
            arch: "x86_64".into(),
            repoid: "base".into(),
            summary: "A utility for getting files from remote servers".into(),
            license: "MIT".into(),
            download_size: Some(352_000),
        }
    }

    #[test]
    fn test_package_display_and_evr() {
        let pkg = curl();
        assert_eq!(pkg.to_string(), "curl-7.61.1-18.el8.x86_64");
        assert_eq!(pkg.evr(), "7.61.1-18.el8");
    }

    #[test]
    fn test_package_is_payload() {
        let pkg = curl();
        let payload: &dyn Payload = &pkg;
        assert_eq!(payload.download_size(), Some(352_000));
    }

    #[test]
    fn test_package_deserialize_defaults() {
        let json = r#"{
            "name": "bash",
            "version": "5.2.26",
            "release": "3.fc40",
            "arch": "x86_64",
            "repoid": "@System"
        }"#;
        let pkg: Package = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.epoch, 0);
        assert_eq!(pkg.summary, "");
        assert_eq!(pkg.download_size, None);
        assert_eq!(pkg.repoid, SYSTEM_REPO);
    }
}
