use std::path::PathBuf;

/// Errors surfaced by the cache and its sessions.
///
/// Engine failures are carried unmodified in [`Error::Backend`]; the cache
/// never retries or recovers from them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository file {}: {message}", path.display())]
    Repository { path: PathBuf, message: String },

    #[error("Package {0} not found in cache.")]
    PackageNotFound(String),

    #[error("{0} not a valid record")]
    RecordNotFound(String),

    #[error("package {0} has neither a candidate nor an installed version")]
    NoPackage(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn repository(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Repository {
            path: path.into(),
            message: message.into(),
        }
    }
}
