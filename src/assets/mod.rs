// Static asset cache module.
// Caches static files on disk, stamps their last use and expires unused entries.

pub mod fetch;
pub mod store;
pub mod timestamps;
pub mod worker;

pub use fetch::{Fetch, HttpFetcher};
pub use store::{AssetCache, CacheStorage};
pub use timestamps::{TimestampRecord, TimestampStore};
pub use worker::{
    ActivationReport, AssetWorker, CachedEntry, FetchOutcome, StartReport, SweepReport,
    WorkerConfig, WorkerState, spawn_sweeper,
};

use reqwest::{Method, Url};

use crate::error::Result;

/// Path extensions treated as cacheable static assets.
pub const STATIC_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".ogg", ".webm", ".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg",
    ".webp", ".ico", ".woff", ".woff2", ".ttf", ".eot",
];

/// Whether the URL path ends in a static asset extension (case-insensitive).
pub fn is_static_asset(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// A request seen by the asset worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
}

impl AssetRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }
}

/// A response as stored in and served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Result of a background upkeep step (cache write, timestamp update).
///
/// Upkeep never fails the request it belongs to; failures are logged and
/// reported here so callers can still see them.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Maintenance {
    Done,
    /// Nothing to do, e.g. a non-200 response that is not cached.
    Skipped,
    Failed(String),
}

impl Maintenance {
    /// Log and convert the result of an upkeep step.
    pub fn from_result<T>(operation: &str, result: Result<T>) -> Self {
        match result {
            Ok(_) => Maintenance::Done,
            Err(e) => {
                log::warn!("{} failed: {}", operation, e);
                Maintenance::Failed(format!("{}: {}", operation, e))
            }
        }
    }

    /// Combine two steps; the first failure wins.
    pub fn and(self, other: Maintenance) -> Maintenance {
        match (self, other) {
            (Maintenance::Failed(e), _) | (_, Maintenance::Failed(e)) => Maintenance::Failed(e),
            (Maintenance::Skipped, Maintenance::Skipped) => Maintenance::Skipped,
            _ => Maintenance::Done,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Maintenance::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_static_extensions() {
        assert!(is_static_asset(&url("http://host/static/app.css")));
        assert!(is_static_asset(&url("http://host/static/APP.JS")));
        assert!(is_static_asset(&url("http://host/sound/wuerfel.mp3?v=2")));
        assert!(is_static_asset(&url("http://host/fonts/a.woff2")));
        assert!(!is_static_asset(&url("http://host/api/game/abc")));
        assert!(!is_static_asset(&url("http://host/game.css/edit")));
        assert!(!is_static_asset(&url("http://host/index.html")));
    }

    #[test]
    fn test_maintenance_combination() {
        assert_eq!(Maintenance::Done.and(Maintenance::Skipped), Maintenance::Done);
        assert_eq!(
            Maintenance::Skipped.and(Maintenance::Skipped),
            Maintenance::Skipped
        );
        assert!(
            Maintenance::Done
                .and(Maintenance::Failed("disk full".into()))
                .is_failed()
        );
    }

    #[test]
    fn test_maintenance_from_result() {
        let ok: Result<()> = Ok(());
        assert_eq!(Maintenance::from_result("Stamping", ok), Maintenance::Done);

        let failed: Result<()> = Err(PanelError::Other("locked".into()));
        assert_eq!(
            Maintenance::from_result("Stamping", failed),
            Maintenance::Failed("Stamping: locked".into())
        );
    }
}
