//! Generation lifecycle and per-request fetch strategies.
//!
//! One manager serves one deployed version tag. `install` pulls the minimal
//! shell set into that generation; `activate` evicts every other generation
//! carrying the application prefix, so at most one generation is ever live
//! and storage does not grow across deployments.
//!
//! Request dispatch:
//! - cross-origin: passthrough, never cached
//! - documents: network-first, cached copy under the canonical document key
//! - everything else: cache-first with network fallback

use std::collections::HashMap;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::config::{Config, BUILD_VERSION};

use super::fetch::{Fetch, FetchedResource, HttpFetcher, RequestMode, ResourceRequest};
use super::store::{CacheStore, CachedResource};
use super::CacheError;

// ============================================================================
// Constants
// ============================================================================

/// Application namespace prefix for cache generation identifiers. Activation
/// matches on this prefix and compares the version suffix.
pub const CACHE_PREFIX: &str = "craftcache-static-";

/// The minimal shell resource set fetched at install time.
const CORE_PATHS: [&str; 2] = ["/", "/index.html"];

/// Canonical key a fetched document is stored under, whatever path it was
/// requested at.
const DOCUMENT_KEY: &str = "/index.html";

/// Lifecycle of one cache generation. A manager drives its own generation
/// from `Installing` to `Active`; during activation every other generation
/// carrying the application prefix becomes `Superseded` and then `Evicted`
/// once its file is gone. A generation stuck at `Superseded` had its
/// eviction fail and will be retried by the next activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Installing,
    Active,
    Superseded,
    Evicted,
}

/// Versioned resource cache bound to one build.
#[derive(Debug)]
pub struct ResourceCacheManager<F: Fetch> {
    store: CacheStore,
    fetcher: F,
    origin: Url,
    generation: String,
    state: GenerationState,
    /// States of the generations this manager has displaced.
    previous: HashMap<String, GenerationState>,
}

impl ResourceCacheManager<HttpFetcher> {
    /// Production manager: configured origin, per-user cache directory and
    /// the reqwest-backed fetcher, bound to the current build version.
    pub fn from_config(config: &Config) -> Result<Self, CacheError> {
        let origin = config
            .app_origin()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let cache_dir = config
            .cache_dir()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let store = CacheStore::new(cache_dir)?;
        let fetcher = HttpFetcher::new()?;
        Ok(Self::new(store, fetcher, origin, BUILD_VERSION))
    }
}

impl<F: Fetch> ResourceCacheManager<F> {
    pub fn new(store: CacheStore, fetcher: F, origin: Url, version: &str) -> Self {
        Self {
            store,
            fetcher,
            origin,
            generation: format!("{CACHE_PREFIX}{version}"),
            state: GenerationState::Installing,
            previous: HashMap::new(),
        }
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// State of a generation by identifier: this manager's own, or one it
    /// displaced during activation.
    pub fn generation_state(&self, generation: &str) -> Option<GenerationState> {
        if generation == self.generation {
            return Some(self.state);
        }
        self.previous.get(generation).copied()
    }

    /// Fetch and store the shell resource set into this generation.
    pub async fn install(&self) -> Result<(), CacheError> {
        for path in CORE_PATHS {
            let url = self
                .origin
                .join(path)
                .map_err(|e| CacheError::Unavailable(format!("{path}: {e}")))?;
            let request = ResourceRequest::asset(url);
            let fetched = self.fetcher.fetch(&request).await?;
            self.store.insert(&self.generation, path, to_cached(fetched))?;
        }
        info!(generation = %self.generation, "shell resources installed");
        Ok(())
    }

    /// Take over as the live generation: every cache carrying the
    /// application prefix but a different version tag is deleted. Afterwards
    /// no entry of another generation remains retrievable.
    pub async fn activate(&mut self) -> Result<(), CacheError> {
        for generation in self.store.list_generations()? {
            if generation.starts_with(CACHE_PREFIX) && generation != self.generation {
                self.previous
                    .insert(generation.clone(), GenerationState::Superseded);
                self.store.remove_generation(&generation)?;
                self.previous
                    .insert(generation.clone(), GenerationState::Evicted);
                info!(superseded = %generation, "previous generation evicted");
            }
        }
        self.state = GenerationState::Active;
        info!(generation = %self.generation, "generation active");
        Ok(())
    }

    /// Dispatch one incoming request through the fetch strategies.
    pub async fn handle_request(
        &self,
        request: &ResourceRequest,
    ) -> Result<FetchedResource, CacheError> {
        if !self.same_origin(&request.url) {
            // Freshness of third-party responses cannot be reasoned about
            // here; pass through untouched.
            debug!(url = %request.url, "cross-origin passthrough");
            return Ok(self.fetcher.fetch(request).await?);
        }

        match request.mode {
            RequestMode::Document => self.network_first(request).await,
            RequestMode::Asset => self.cache_first(request).await,
        }
    }

    /// Network-first keeps documents fresh across deploys; the cached copy
    /// is the offline fallback.
    async fn network_first(
        &self,
        request: &ResourceRequest,
    ) -> Result<FetchedResource, CacheError> {
        match self.fetcher.fetch(request).await {
            Ok(fetched) => {
                if let Err(err) =
                    self.store
                        .insert(&self.generation, DOCUMENT_KEY, to_cached(fetched.clone()))
                {
                    warn!(error = %err, "failed to cache document copy");
                }
                Ok(fetched)
            }
            Err(fetch_err) => match self.store.lookup(&self.generation, DOCUMENT_KEY) {
                Ok(Some(cached)) => {
                    debug!("network unreachable, serving cached document");
                    Ok(to_fetched(cached))
                }
                Ok(None) => Err(fetch_err.into()),
                Err(cache_err) => {
                    warn!(error = %cache_err, "cache lookup failed after fetch failure");
                    Err(fetch_err.into())
                }
            },
        }
    }

    async fn cache_first(&self, request: &ResourceRequest) -> Result<FetchedResource, CacheError> {
        let key = request_key(&request.url);

        match self.store.lookup(&self.generation, &key) {
            Ok(Some(cached)) => return Ok(to_fetched(cached)),
            Ok(None) => {}
            Err(err) => warn!(error = %err, key, "cache lookup failed, falling back to network"),
        }

        let fetched = self.fetcher.fetch(request).await?;
        if let Err(err) = self
            .store
            .insert(&self.generation, &key, to_cached(fetched.clone()))
        {
            warn!(error = %err, key, "failed to cache fetched resource");
        }
        Ok(fetched)
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
    }
}

/// Cache key identifying a request: path plus query string. Requests that
/// differ only in query are distinct resources and must not collide.
fn request_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn to_cached(fetched: FetchedResource) -> CachedResource {
    CachedResource {
        content_type: fetched.content_type,
        body: fetched.body,
    }
}

fn to_fetched(cached: CachedResource) -> FetchedResource {
    FetchedResource {
        content_type: cached.content_type,
        body: cached.body,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fetch::FetchError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves canned bodies by path while online; every call is counted.
    struct MockFetch {
        responses: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
        online: AtomicBool,
    }

    impl MockFetch {
        fn new(responses: &[(&str, &str)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(path, body)| (path.to_string(), body.as_bytes().to_vec()))
                    .collect(),
                calls: AtomicUsize::new(0),
                online: AtomicBool::new(true),
            }
        }

        fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for &MockFetch {
        async fn fetch(&self, request: &ResourceRequest) -> Result<FetchedResource, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.online.load(Ordering::SeqCst) {
                return Err(FetchError::Status(503));
            }
            match self.responses.get(&request_key(&request.url)) {
                Some(body) => Ok(FetchedResource {
                    content_type: Some("text/html".to_string()),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn origin() -> Url {
        Url::parse("https://craft.example").unwrap()
    }

    fn manager<'a>(
        tmp: &TempDir,
        fetch: &'a MockFetch,
        version: &str,
    ) -> ResourceCacheManager<&'a MockFetch> {
        let store = CacheStore::new(tmp.path().to_path_buf()).unwrap();
        ResourceCacheManager::new(store, fetch, origin(), version)
    }

    fn doc_request(path: &str) -> ResourceRequest {
        ResourceRequest::document(origin().join(path).unwrap())
    }

    fn asset_request(path: &str) -> ResourceRequest {
        ResourceRequest::asset(origin().join(path).unwrap())
    }

    #[test]
    fn test_from_config_requires_an_origin() {
        // Origin is validated before any directory gets created.
        let err = ResourceCacheManager::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, CacheError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_install_stores_shell_set() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[("/", "<root>"), ("/index.html", "<app>")]);
        let mgr = manager(&tmp, &fetch, "v1");

        mgr.install().await.unwrap();

        assert_eq!(mgr.state(), GenerationState::Installing);
        let store = CacheStore::new(tmp.path().to_path_buf()).unwrap();
        assert!(store.lookup(mgr.generation(), "/").unwrap().is_some());
        assert!(store.lookup(mgr.generation(), "/index.html").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_activate_evicts_other_generations_only() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[("/", "<root>"), ("/index.html", "<app>")]);

        let old = manager(&tmp, &fetch, "v1");
        old.install().await.unwrap();

        let mut new = manager(&tmp, &fetch, "v2");
        new.install().await.unwrap();

        // A foreign cache that does not carry our prefix must survive.
        let store = CacheStore::new(tmp.path().to_path_buf()).unwrap();
        store
            .insert(
                "other-app-v1",
                "/x",
                CachedResource {
                    content_type: None,
                    body: vec![1],
                },
            )
            .unwrap();

        new.activate().await.unwrap();

        assert_eq!(new.state(), GenerationState::Active);
        assert_eq!(
            new.generation_state("craftcache-static-v1"),
            Some(GenerationState::Evicted)
        );
        assert_eq!(
            new.generation_state("craftcache-static-v2"),
            Some(GenerationState::Active)
        );
        assert_eq!(new.generation_state("other-app-v1"), None);
        assert!(store.lookup("craftcache-static-v1", "/").unwrap().is_none());
        assert!(store.lookup("craftcache-static-v2", "/").unwrap().is_some());
        assert!(store.lookup("other-app-v1", "/x").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_document_network_first_updates_cache() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[("/", "<live>"), ("/index.html", "<live>")]);
        let mgr = manager(&tmp, &fetch, "v1");

        let got = mgr.handle_request(&doc_request("/")).await.unwrap();
        assert_eq!(got.body, b"<live>");

        let store = CacheStore::new(tmp.path().to_path_buf()).unwrap();
        let cached = store.lookup(mgr.generation(), "/index.html").unwrap().unwrap();
        assert_eq!(cached.body, b"<live>");
    }

    #[tokio::test]
    async fn test_document_falls_back_to_cache_when_offline() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[("/", "<v1>"), ("/index.html", "<v1>")]);
        let mgr = manager(&tmp, &fetch, "v1");
        mgr.install().await.unwrap();

        fetch.set_online(false);
        let got = mgr.handle_request(&doc_request("/")).await.unwrap();
        assert_eq!(got.body, b"<v1>");
    }

    #[tokio::test]
    async fn test_document_offline_without_cache_fails() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[]);
        let mgr = manager(&tmp, &fetch, "v1");

        fetch.set_online(false);
        let err = mgr.handle_request(&doc_request("/")).await.unwrap_err();
        assert!(matches!(err, CacheError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_cached_asset_skips_network() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[("/app.js", "let x = 1;")]);
        let mgr = manager(&tmp, &fetch, "v1");

        let first = mgr.handle_request(&asset_request("/app.js")).await.unwrap();
        assert_eq!(first.body, b"let x = 1;");
        assert_eq!(fetch.calls(), 1);

        let second = mgr.handle_request(&asset_request("/app.js")).await.unwrap();
        assert_eq!(second.body, first.body);
        assert_eq!(fetch.calls(), 1, "cached asset must not hit the network");
    }

    #[tokio::test]
    async fn test_assets_differing_only_in_query_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[
            ("/style.css?v=1", "v1-bytes"),
            ("/style.css?v=2", "v2-bytes"),
        ]);
        let mgr = manager(&tmp, &fetch, "v1");

        let first = mgr
            .handle_request(&asset_request("/style.css?v=1"))
            .await
            .unwrap();
        assert_eq!(first.body, b"v1-bytes");

        let second = mgr
            .handle_request(&asset_request("/style.css?v=2"))
            .await
            .unwrap();
        assert_eq!(second.body, b"v2-bytes");
        assert_eq!(fetch.calls(), 2, "a different query is a different resource");

        // Both stay cached under their own keys.
        let again = mgr
            .handle_request(&asset_request("/style.css?v=1"))
            .await
            .unwrap();
        assert_eq!(again.body, b"v1-bytes");
        assert_eq!(fetch.calls(), 2);
    }

    #[tokio::test]
    async fn test_asset_miss_offline_fails() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[]);
        let mgr = manager(&tmp, &fetch, "v1");

        fetch.set_online(false);
        let err = mgr.handle_request(&asset_request("/app.js")).await.unwrap_err();
        assert!(matches!(err, CacheError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_cross_origin_passthrough_is_never_cached() {
        let tmp = TempDir::new().unwrap();
        let fetch = MockFetch::new(&[("/widget.js", "external")]);
        let mgr = manager(&tmp, &fetch, "v1");

        let url = Url::parse("https://third-party.example/widget.js").unwrap();
        let got = mgr
            .handle_request(&ResourceRequest::asset(url))
            .await
            .unwrap();
        assert_eq!(got.body, b"external");

        let store = CacheStore::new(tmp.path().to_path_buf()).unwrap();
        assert!(store.lookup(mgr.generation(), "/widget.js").unwrap().is_none());
        // Same request again goes back to the network.
        let url = Url::parse("https://third-party.example/widget.js").unwrap();
        mgr.handle_request(&ResourceRequest::asset(url)).await.unwrap();
        assert_eq!(fetch.calls(), 2);
    }
}
