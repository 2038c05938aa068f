use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;
use crate::session::Conf;

/// System metadata cache, relative to the install root.
pub const SYSTEM_CACHEDIR: &str = "var/cache/dnf";

/// Metadata cache locations for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheDirs {
    /// Where this process reads and writes metadata.
    pub cachedir: PathBuf,
    /// The shared cache maintained by privileged runs.
    pub system_cachedir: PathBuf,
}

impl CacheDirs {
    /// Resolve the cache locations for `conf`.
    ///
    /// Privileged processes use the system cache directly. Everyone else
    /// gets a per-user cache: `<user cache dir>/dnf`, or
    /// `/var/tmp/dnf-<user>` when the user has no cache directory.
    #[tracing::instrument(skip(runtime, conf))]
    pub fn resolve<R: Runtime>(runtime: &R, conf: &Conf) -> Self {
        let system_cachedir = crate::session::under_root(&conf.installroot, Path::new(SYSTEM_CACHEDIR));

        let cachedir = if runtime.is_privileged() {
            system_cachedir.clone()
        } else {
            match runtime.cache_dir() {
                Some(dir) => dir.join("dnf"),
                None => {
                    let user = runtime.env_var("USER").unwrap_or_else(|_| "user".to_string());
                    PathBuf::from(format!("/var/tmp/dnf-{}", user))
                }
            }
        };

        Self {
            cachedir,
            system_cachedir,
        }
    }
}
