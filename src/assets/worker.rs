// Asset worker lifecycle and request handling.
// Cache-first serving of static assets with last-access stamping and periodic expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Method;
use tokio::task::JoinHandle;

use crate::config::AssetConfig;
use crate::error::{PanelError, Result};
use crate::paths::sanitize_name;

use super::{
    AssetRequest, AssetResponse, CacheStorage, Fetch, Maintenance, TimestampStore,
    is_static_asset,
};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Installed with waiting skipped; activation may follow at once.
    Installed,
    Active,
}

/// Settings the worker runs with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the current cache version.
    pub cache_name: String,
    /// Entries unused for longer than this are expired.
    pub retention: Duration,
}

impl From<&AssetConfig> for WorkerConfig {
    fn from(config: &AssetConfig) -> Self {
        Self {
            cache_name: config.cache_version.clone(),
            retention: config.retention(),
        }
    }
}

/// What happened to an intercepted (or ignored) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not handled by the worker; the caller goes to the network itself.
    Passthrough,
    /// Served from cache without touching the network.
    Cached {
        response: AssetResponse,
        upkeep: Maintenance,
    },
    /// Fetched from the network, stored if the status was exactly 200.
    Network {
        response: AssetResponse,
        upkeep: Maintenance,
    },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&AssetResponse> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Cached { response, .. } | FetchOutcome::Network { response, .. } => {
                Some(response)
            }
        }
    }

    pub fn from_cache(&self) -> bool {
        matches!(self, FetchOutcome::Cached { .. })
    }
}

/// Caches removed on activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub deleted: Vec<String>,
}

/// What starting the worker did: activation, then the startup sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub activation: ActivationReport,
    pub sweep: SweepReport,
}

/// A cached URL and when it was last served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub url: String,
    /// `None` if the entry has no timestamp record.
    pub last_access: Option<DateTime<Utc>>,
}

/// Result of one expiry pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub cutoff: DateTime<Utc>,
    /// Number of timestamp records looked at.
    pub examined: usize,
    /// URLs whose cache entry and timestamp were removed.
    pub removed: Vec<String>,
    pub failures: Vec<String>,
}

/// Intercepts static asset requests and serves them cache-first.
pub struct AssetWorker<F: Fetch> {
    config: WorkerConfig,
    storage: CacheStorage,
    timestamps: TimestampStore,
    fetcher: F,
    state: WorkerState,
    claimed: bool,
}

impl<F: Fetch> AssetWorker<F> {
    pub fn new(
        config: WorkerConfig,
        storage: CacheStorage,
        timestamps: TimestampStore,
        fetcher: F,
    ) -> Self {
        Self {
            config,
            storage,
            timestamps,
            fetcher,
            state: WorkerState::Installing,
            claimed: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    /// Install event: nothing is precached and the waiting phase is skipped.
    pub fn install(&mut self) {
        if self.state == WorkerState::Installing {
            log::info!("Installing asset worker for cache {}", self.config.cache_name);
            self.state = WorkerState::Installed;
        }
    }

    /// Activate event: drop every cache except the current version and take
    /// control of clients immediately.
    pub fn activate(&mut self) -> Result<ActivationReport> {
        if self.state == WorkerState::Installing {
            return Err(PanelError::Other(
                "asset worker activated before install".to_string(),
            ));
        }

        let current = sanitize_name(&self.config.cache_name);
        let mut report = ActivationReport::default();
        for name in self.storage.keys()? {
            if name != current {
                log::info!("Deleting outdated cache {}", name);
                self.storage.delete(&name)?;
                report.deleted.push(name);
            }
        }

        self.state = WorkerState::Active;
        self.claimed = true;
        Ok(report)
    }

    /// Install, activate and run the startup sweep as of `now`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<StartReport> {
        self.install();
        let activation = self.activate()?;
        let sweep = self.sweep(now);
        log::info!(
            "Startup sweep: {} examined, {} expired, {} failures",
            sweep.examined,
            sweep.removed.len(),
            sweep.failures.len()
        );
        Ok(StartReport { activation, sweep })
    }

    /// Every entry of the current cache with its last access.
    pub fn entries(&self) -> Result<Vec<CachedEntry>> {
        let cache = self.storage.open(&self.config.cache_name)?;
        let mut entries = Vec::new();
        for url in cache.urls()? {
            let last_access = self
                .timestamps
                .get(&url)?
                .and_then(|record| record.accessed_at());
            entries.push(CachedEntry { url, last_access });
        }
        Ok(entries)
    }

    /// Whether `request` is handled by the worker at all.
    pub fn intercepts(&self, request: &AssetRequest) -> bool {
        self.state == WorkerState::Active
            && request.method == Method::GET
            && is_static_asset(&request.url)
    }

    fn touch(&self, url: &str) -> Maintenance {
        Maintenance::from_result("Updating timestamp", self.timestamps.put(url, Utc::now()))
    }

    /// Fetch event.
    ///
    /// Cache hits are served without touching the network and refresh the
    /// entry's timestamp. Misses go to the network; only status 200 is
    /// stored. Network errors propagate to the caller unchanged.
    pub async fn handle_fetch(&self, request: &AssetRequest) -> Result<FetchOutcome> {
        if !self.intercepts(request) {
            return Ok(FetchOutcome::Passthrough);
        }

        let url = request.url.as_str();
        let cache = match self.storage.open(&self.config.cache_name) {
            Ok(cache) => Some(cache),
            Err(e) => {
                log::warn!("Opening cache {} failed: {}", self.config.cache_name, e);
                None
            }
        };

        if let Some(cache) = &cache {
            match cache.get(url) {
                Ok(Some(response)) => {
                    log::debug!("Cache hit: {}", url);
                    let upkeep = self.touch(url);
                    return Ok(FetchOutcome::Cached { response, upkeep });
                }
                Ok(None) => {}
                Err(e) => log::warn!("Reading cached {} failed: {}", url, e),
            }
        }

        log::debug!("Cache miss: {}", url);
        let response = self.fetcher.fetch(&request.url).await?;

        let upkeep = match (&cache, response.status) {
            (Some(cache), 200) => {
                Maintenance::from_result("Caching response", cache.put(url, &response))
                    .and(self.touch(url))
            }
            (None, 200) => Maintenance::Failed("cache unavailable".to_string()),
            _ => Maintenance::Skipped,
        };

        Ok(FetchOutcome::Network { response, upkeep })
    }

    /// Remove every entry whose last access is older than the retention
    /// period as of `now`, from both the cache and the timestamp store.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let cutoff = TimeDelta::from_std(self.config.retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut report = SweepReport {
            cutoff,
            examined: 0,
            removed: Vec::new(),
            failures: Vec::new(),
        };

        let records = match self.timestamps.all() {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Reading timestamps failed: {}", e);
                report.failures.push(e.to_string());
                return report;
            }
        };
        report.examined = records.len();

        let cutoff_ms = cutoff.timestamp_millis();
        let expired: Vec<_> = records.into_iter().filter(|r| r.ts < cutoff_ms).collect();
        if expired.is_empty() {
            return report;
        }

        let cache = match self.storage.open(&self.config.cache_name) {
            Ok(cache) => cache,
            Err(e) => {
                log::warn!("Opening cache {} failed: {}", self.config.cache_name, e);
                report.failures.push(e.to_string());
                return report;
            }
        };

        for record in expired {
            // Each removal stands alone; a failure does not stop the others.
            let mut ok = true;
            if let Err(e) = cache.delete(&record.url) {
                log::warn!("Expiring cached {} failed: {}", record.url, e);
                report.failures.push(format!("{}: {}", record.url, e));
                ok = false;
            }
            if let Err(e) = self.timestamps.delete(&record.url) {
                log::warn!("Expiring timestamp of {} failed: {}", record.url, e);
                report.failures.push(format!("{}: {}", record.url, e));
                ok = false;
            }
            if ok {
                log::debug!("Expired {}", record.url);
                report.removed.push(record.url);
            }
        }

        report
    }
}

/// Run `sweep` once now and then every `every` until the task is aborted.
pub fn spawn_sweeper<F>(worker: Arc<AssetWorker<F>>, every: Duration) -> JoinHandle<()>
where
    F: Fetch + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let report = worker.sweep(Utc::now());
            log::info!(
                "Cache sweep: {} examined, {} expired, {} failures",
                report.examined,
                report.removed.len(),
                report.failures.len()
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;
    use async_trait::async_trait;
    use reqwest::Url;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const CACHE: &str = "tele-schocken-static-v1";

    struct StubFetcher {
        status: u16,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubFetcher {
        fn ok() -> Self {
            Self::with_status(200)
        }

        fn with_status(status: u16) -> Self {
            Self {
                status,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn offline() -> Self {
            Self {
                fail: true,
                ..Self::ok()
            }
        }
    }

    #[async_trait]
    impl Fetch for Arc<StubFetcher> {
        async fn fetch(&self, url: &Url) -> Result<AssetResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PanelError::Other("network down".to_string()));
            }
            Ok(AssetResponse {
                status: self.status,
                content_type: Some("text/css".to_string()),
                body: format!("from network: {}", url.path()).into_bytes(),
            })
        }
    }

    fn worker(temp_dir: &TempDir, fetcher: &Arc<StubFetcher>) -> AssetWorker<Arc<StubFetcher>> {
        let config = WorkerConfig {
            cache_name: CACHE.to_string(),
            retention: Duration::from_secs(60 * 24 * 60 * 60),
        };
        AssetWorker::new(
            config,
            CacheStorage::new(temp_dir.path().join("caches")),
            TimestampStore::open(&temp_dir.path().join("sw-cache-meta")),
            fetcher.clone(),
        )
    }

    fn active_worker(temp_dir: &TempDir, fetcher: &Arc<StubFetcher>) -> AssetWorker<Arc<StubFetcher>> {
        let mut worker = worker(temp_dir, fetcher);
        worker.start(Utc::now()).unwrap();
        worker
    }

    fn get(url: &str) -> AssetRequest {
        AssetRequest::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_activate_deletes_other_versions() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let storage = CacheStorage::new(temp_dir.path().join("caches"));
        storage.open("tele-schocken-static-v0").unwrap();
        storage.open(CACHE).unwrap();

        let mut worker = worker(&temp_dir, &fetcher);
        assert_eq!(worker.state(), WorkerState::Installing);
        let report = worker.start(Utc::now()).unwrap();

        assert_eq!(report.activation.deleted, vec!["tele-schocken-static-v0"]);
        assert_eq!(storage.keys().unwrap(), vec![CACHE]);
        assert_eq!(worker.state(), WorkerState::Active);
        assert!(worker.is_claimed());
    }

    #[test]
    fn test_activate_requires_install() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let mut worker = worker(&temp_dir, &fetcher);

        assert!(worker.activate().is_err());
        assert_eq!(worker.state(), WorkerState::Installing);
        assert!(!worker.is_claimed());

        worker.install();
        assert_eq!(worker.state(), WorkerState::Installed);
        worker.activate().unwrap();
        assert_eq!(worker.state(), WorkerState::Active);
    }

    #[tokio::test]
    async fn test_start_sweeps_expired_entries() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let stale = get("http://host/static/stale.css");
        {
            let worker = active_worker(&temp_dir, &fetcher);
            worker.handle_fetch(&stale).await.unwrap();
            worker
                .timestamps
                .put(stale.url.as_str(), Utc::now() - TimeDelta::days(90))
                .unwrap();
        }

        let mut worker = worker(&temp_dir, &fetcher);
        let report = worker.start(Utc::now()).unwrap();
        assert_eq!(report.sweep.removed, vec![stale.url.to_string()]);

        worker
            .handle_fetch(&get("http://host/static/other.js"))
            .await
            .unwrap();
        let cache = worker.storage.open(CACHE).unwrap();
        assert!(cache.get(stale.url.as_str()).unwrap().is_none());
        assert!(worker.timestamps.get(stale.url.as_str()).unwrap().is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entries_list_last_access() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = active_worker(&temp_dir, &fetcher);
        let request = get("http://host/static/app.css");
        worker.handle_fetch(&request).await.unwrap();
        let accessed = Utc::now() - TimeDelta::days(3);
        worker.timestamps.put(request.url.as_str(), accessed).unwrap();

        let entries = worker.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, request.url.as_str());
        assert_eq!(
            entries[0].last_access.unwrap().timestamp_millis(),
            accessed.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = active_worker(&temp_dir, &fetcher);
        let request = get("http://host/static/app.css");

        let first = worker.handle_fetch(&request).await.unwrap();
        assert!(!first.from_cache());
        assert!(matches!(first, FetchOutcome::Network { upkeep: Maintenance::Done, .. }));
        assert!(worker.timestamps.get(request.url.as_str()).unwrap().is_some());

        let month_ago = Utc::now() - TimeDelta::days(30);
        worker
            .timestamps
            .put(request.url.as_str(), month_ago)
            .unwrap();

        let second = worker.handle_fetch(&request).await.unwrap();
        assert!(second.from_cache());
        assert!(matches!(second, FetchOutcome::Cached { upkeep: Maintenance::Done, .. }));
        assert_eq!(second.response(), first.response());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let restamped = worker.timestamps.get(request.url.as_str()).unwrap().unwrap();
        assert!(restamped.ts > month_ago.timestamp_millis() + TimeDelta::days(29).num_milliseconds());
    }

    #[tokio::test]
    async fn test_non_static_and_non_get_pass_through() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = active_worker(&temp_dir, &fetcher);

        let api = worker.handle_fetch(&get("http://host/api/game/abc")).await.unwrap();
        assert_eq!(api, FetchOutcome::Passthrough);

        let post = AssetRequest::new(Method::POST, Url::parse("http://host/static/app.js").unwrap());
        assert_eq!(worker.handle_fetch(&post).await.unwrap(), FetchOutcome::Passthrough);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inactive_worker_passes_through() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = worker(&temp_dir, &fetcher);

        let outcome = worker.handle_fetch(&get("http://host/static/app.css")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Passthrough);
    }

    #[tokio::test]
    async fn test_non_200_not_stored() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::with_status(206));
        let worker = active_worker(&temp_dir, &fetcher);
        let request = get("http://host/sound/wurf.mp3");

        let outcome = worker.handle_fetch(&request).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Network { upkeep: Maintenance::Skipped, .. }));
        assert_eq!(outcome.response().unwrap().status, 206);

        worker.handle_fetch(&request).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(worker.timestamps.get(request.url.as_str()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::offline());
        let worker = active_worker(&temp_dir, &fetcher);

        let result = worker.handle_fetch(&get("http://host/static/app.js")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = active_worker(&temp_dir, &fetcher);
        let old = get("http://host/static/old.png");
        let fresh = get("http://host/static/fresh.png");
        worker.handle_fetch(&old).await.unwrap();
        worker.handle_fetch(&fresh).await.unwrap();

        let now = Utc::now();
        worker
            .timestamps
            .put(old.url.as_str(), now - TimeDelta::days(61))
            .unwrap();
        worker
            .timestamps
            .put(fresh.url.as_str(), now - TimeDelta::days(59))
            .unwrap();

        let report = worker.sweep(now);
        assert_eq!(report.examined, 2);
        assert_eq!(report.removed, vec![old.url.to_string()]);
        assert!(report.failures.is_empty());
        assert_eq!(report.cutoff, now - TimeDelta::days(60));

        let cache = worker.storage.open(CACHE).unwrap();
        assert!(cache.get(old.url.as_str()).unwrap().is_none());
        assert!(cache.get(fresh.url.as_str()).unwrap().is_some());
        assert!(worker.timestamps.get(old.url.as_str()).unwrap().is_none());
        assert!(worker.timestamps.get(fresh.url.as_str()).unwrap().is_some());
    }

    #[test]
    fn test_sweep_on_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = active_worker(&temp_dir, &fetcher);

        let report = worker.sweep(Utc::now());
        assert_eq!(report.examined, 0);
        assert!(report.removed.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_runs_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StubFetcher::ok());
        let worker = active_worker(&temp_dir, &fetcher);
        let url = "http://host/static/stale.js";
        worker
            .timestamps
            .put(url, Utc::now() - TimeDelta::days(90))
            .unwrap();

        let worker = Arc::new(worker);
        let handle = spawn_sweeper(worker.clone(), Duration::from_secs(24 * 60 * 60));

        let mut swept = false;
        for _ in 0..100 {
            if worker.timestamps.get(url).unwrap().is_none() {
                swept = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(swept);
    }
}
