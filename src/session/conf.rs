use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default repository directory, relative to the install root.
pub const DEFAULT_REPOSDIR: &str = "etc/yum.repos.d";

/// Session configuration shared by all engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conf {
    pub installroot: PathBuf,
    pub reposdir: PathBuf,
    /// Template variables expanded in repository definitions (`$releasever`, `$basearch`).
    pub substitutions: BTreeMap<String, String>,
    pub cachedir: Option<PathBuf>,
}

impl Default for Conf {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Conf {
    pub fn new(installroot: impl Into<PathBuf>) -> Self {
        let mut substitutions = BTreeMap::new();
        substitutions.insert(
            "basearch".to_string(),
            basearch(std::env::consts::ARCH).to_string(),
        );
        Self {
            installroot: installroot.into(),
            reposdir: PathBuf::from(DEFAULT_REPOSDIR),
            substitutions,
            cachedir: None,
        }
    }

    pub fn releasever(&self) -> Option<&str> {
        self.substitutions.get("releasever").map(String::as_str)
    }

    /// Repository directory with the install root applied.
    pub fn reposdir_path(&self) -> PathBuf {
        under_root(&self.installroot, &self.reposdir)
    }

    /// Expand `$var` and `${var}` references from [`Conf::substitutions`].
    ///
    /// Unknown variables are left as written.
    pub fn substitute(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) => (&braced[..end], end + 2),
                    None => ("", 0),
                }
            } else {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], end)
            };

            match self.substitutions.get(name) {
                Some(value) if !name.is_empty() => {
                    out.push_str(value);
                    rest = &after[consumed..];
                }
                _ => {
                    out.push('$');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Join `path` below `root`, treating an absolute `path` as relative to it.
pub(crate) fn under_root(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix("/") {
        Ok(relative) => root.join(relative),
        Err(_) => root.join(path),
    }
}

/// Map a machine architecture to the repository base architecture.
pub fn basearch(arch: &str) -> &str {
    match arch {
        "x86" | "i386" | "i486" | "i586" | "i686" | "athlon" | "geode" => "i386",
        "arm" | "armv7" | "armv7l" | "armv7hl" => "armhfp",
        "powerpc64le" | "ppc64le" => "ppc64le",
        other => other,
    }
}
