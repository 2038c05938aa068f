pub mod cache;
pub mod commands;
pub mod error;
pub mod progress;
pub mod runtime;
pub mod session;

pub use cache::{CacheDirs, CacheOptions, PackageCache, PackageRecord};
pub use error::{Error, Result};
pub use session::{CommandSession, Conf, Package, Session};
