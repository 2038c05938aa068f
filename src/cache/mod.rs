//! Name-indexed package cache.
//!
//! [`PackageCache`] drives a [`Session`] through configuration, repository
//! loading and metadata fetch exactly once, then folds the available and
//! installed query results into one [`PackageRecord`] per package name.

mod location;
mod record;

use glob::Pattern;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::ops::Index;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::progress::{MetadataProgress, ProgressFn};
use crate::runtime::Runtime;
use crate::session::{Package, Session};

pub use location::{CacheDirs, SYSTEM_CACHEDIR};
pub use record::{INSTALLED_REPO, PackageRecord};

/// Construction options for [`PackageCache`].
#[derive(Default)]
pub struct CacheOptions {
    /// Use this release version instead of detecting it from the install root.
    pub releasever: Option<String>,
    /// Use this metadata cache directory instead of the resolved one.
    pub cachedir: Option<PathBuf>,
    /// Receives `(name, fraction)` updates while metadata downloads.
    pub progress: Option<ProgressFn>,
}

impl std::fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOptions")
            .field("releasever", &self.releasever)
            .field("cachedir", &self.cachedir)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Packages known to a session, indexed by name.
///
/// Every name from either query has exactly one record. Records keep the
/// order in which names were first seen: candidates first, then names
/// that are only installed.
pub struct PackageCache<S: Session> {
    session: S,
    progress: MetadataProgress,
    releasever: Option<String>,
    cache_dirs: CacheDirs,
    candidates: Vec<Package>,
    installed: Vec<Package>,
    records: Vec<PackageRecord>,
    index: HashMap<String, usize>,
}

impl<S: Session> PackageCache<S> {
    /// Configure `session`, fetch its metadata and build the index.
    ///
    /// Any engine failure aborts construction; no partially built cache is
    /// ever returned.
    #[tracing::instrument(skip(runtime, session, options))]
    pub fn new<R: Runtime>(runtime: &R, mut session: S, options: CacheOptions) -> Result<Self> {
        let install_root = session.conf().installroot.clone();
        if !install_root.is_absolute() {
            return Err(Error::InvalidArgument(format!(
                "install root must be an absolute path, got {:?}",
                install_root
            )));
        }

        let releasever = match options.releasever {
            Some(releasever) => Some(releasever),
            None => session.detect_releasever(&install_root)?,
        };
        match &releasever {
            Some(releasever) => {
                debug!("Using releasever {}", releasever);
                session
                    .conf_mut()
                    .substitutions
                    .insert("releasever".to_string(), releasever.clone());
            }
            None => warn!(
                "Could not detect the release version under {}",
                install_root.display()
            ),
        }

        let mut cache_dirs = CacheDirs::resolve(runtime, session.conf());
        if let Some(cachedir) = options.cachedir {
            cache_dirs.cachedir = cachedir;
        }
        debug!("Using cache directory {}", cache_dirs.cachedir.display());
        session.conf_mut().cachedir = Some(cache_dirs.cachedir.clone());

        session.read_all_repos()?;

        let repo_ids = session.repo_ids();
        debug!("Attaching progress to {} repositories", repo_ids.len());
        let mut progress = MetadataProgress::new(options.progress);

        info!("Loading metadata for {} repositories", repo_ids.len());
        session.fill_sack(&mut progress)?;

        let candidates = session.query_available()?;
        let installed = session.query_installed()?;
        info!(
            "{} candidate(s), {} installed package(s)",
            candidates.len(),
            installed.len()
        );

        let (records, index) = build_index(&candidates, &installed);

        Ok(Self {
            session,
            progress,
            releasever,
            cache_dirs,
            candidates,
            installed,
            records,
            index,
        })
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn progress(&self) -> &MetadataProgress {
        &self.progress
    }

    /// Release version substituted into repository definitions, if known.
    pub fn releasever(&self) -> Option<&str> {
        self.releasever.as_deref()
    }

    pub fn cache_dirs(&self) -> &CacheDirs {
        &self.cache_dirs
    }

    /// Raw available query result, in engine order.
    pub fn candidates(&self) -> &[Package] {
        &self.candidates
    }

    /// Raw installed query result, in engine order.
    pub fn installed(&self) -> &[Package] {
        &self.installed
    }

    pub fn total_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn total_installed(&self) -> usize {
        self.installed.len()
    }

    pub fn package_list(&self) -> Vec<&PackageRecord> {
        self.records.iter().collect()
    }

    /// Record for `name`, or `None` if the name is unknown.
    pub fn package(&self, name: &str) -> Option<&PackageRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Same as [`package`](Self::package).
    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.package(name)
    }

    /// Record for `name`, failing with [`Error::PackageNotFound`] if unknown.
    pub fn lookup(&self, name: &str) -> Result<&PackageRecord> {
        self.package(name)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))
    }

    /// Mutable record for `name`, e.g. to attach extra records.
    pub fn package_mut(&mut self, name: &str) -> Option<&mut PackageRecord> {
        let i = *self.index.get(name)?;
        self.records.get_mut(i)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.package(name).is_some_and(PackageRecord::is_installed)
    }

    /// Records of installed packages whose name matches the shell glob
    /// `pattern`. An invalid pattern matches nothing.
    pub fn search_installed(&self, pattern: &str) -> Vec<&PackageRecord> {
        let pattern = match Pattern::new(&collapse_stars(pattern)) {
            Ok(p) => p,
            Err(e) => {
                debug!("Invalid pattern {:?}: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut found: Vec<&PackageRecord> = Vec::new();
        for pkg in &self.installed {
            if !pattern.matches(&pkg.name) {
                continue;
            }
            if let Some(record) = self.package(&pkg.name)
                && !found.iter().any(|r| std::ptr::eq(*r, record))
            {
                found.push(record);
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(PackageRecord::name)
    }

    pub fn values(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.iter()
    }

    /// `(name, record)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageRecord)> {
        self.records.iter().map(|r| (r.name(), r))
    }
}

impl<'a, S: Session> IntoIterator for &'a PackageCache<S> {
    type Item = &'a PackageRecord;
    type IntoIter = std::slice::Iter<'a, PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Panics on unknown names, like `HashMap`. Use [`PackageCache::lookup`]
/// for a fallible lookup.
impl<S: Session> Index<&str> for PackageCache<S> {
    type Output = PackageRecord;

    fn index(&self, name: &str) -> &PackageRecord {
        match self.package(name) {
            Some(record) => record,
            None => panic!("{}", Error::PackageNotFound(name.to_string())),
        }
    }
}

/// Shell globs treat `**` like `*`; glob's `Pattern` only accepts `**` as
/// a whole path component.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Fold both query results into one record per name.
///
/// A later package with an already indexed name replaces the earlier one
/// in the same role.
fn build_index(
    candidates: &[Package],
    installed: &[Package],
) -> (Vec<PackageRecord>, HashMap<String, usize>) {
    let mut records: Vec<PackageRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for pkg in candidates {
        match index.get(&pkg.name) {
            Some(&i) => records[i].set_candidate(Some(pkg.clone())),
            None => {
                index.insert(pkg.name.clone(), records.len());
                records.push(PackageRecord::with_candidate(pkg.clone()));
            }
        }
    }

    for pkg in installed {
        let i = match index.get(&pkg.name) {
            Some(&i) => i,
            None => {
                index.insert(pkg.name.clone(), records.len());
                records.push(PackageRecord::new(pkg.name.clone()));
                records.len() - 1
            }
        };
        records[i].set_installed(Some(pkg.clone()));
    }

    (records, index)
}
