//! CRL repository: memoizes parsed CRLs per (URI, issuer) with singleflight
//! fetching

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use url::Url;

use super::fetch::{scheme_supported, CrlFetcher};
use super::types::{CrlCacheEntry, CrlCacheKey, CrlInfo};
use crate::cert::Certificate;
use crate::error::{CrlParseError, TrustError};

const DEFAULT_MAX_ENTRIES: usize = 64;

/// Caching CRL repository.
///
/// Readers run concurrently; a per-key guard serializes fetches so a burst of
/// identical validations incurs a single network call. Entries outside their
/// `[thisUpdate, nextUpdate]` window for the queried time are never returned.
pub struct CrlRepository {
    fetcher: Arc<dyn CrlFetcher>,
    cache: RwLock<HashMap<CrlCacheKey, CrlCacheEntry>>,
    inflight: Mutex<HashMap<CrlCacheKey, Arc<Mutex<()>>>>,
    max_entries: usize,
    /// Cache hit statistics
    cache_hits: AtomicUsize,
    /// Cache miss statistics
    cache_misses: AtomicUsize,
}

impl std::fmt::Debug for CrlRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache_size = match self.cache.read() {
            Ok(cache) => cache.len(),
            Err(_) => 0,
        };
        f.debug_struct("CrlRepository")
            .field("cache_size", &cache_size)
            .field("cache_hits", &self.cache_hits.load(Ordering::Relaxed))
            .field("cache_misses", &self.cache_misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CrlRepository {
    pub fn new(fetcher: Arc<dyn CrlFetcher>) -> Self {
        Self::with_capacity(fetcher, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(fetcher: Arc<dyn CrlFetcher>, max_entries: usize) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(HashMap::with_capacity(max_entries.min(64))),
            inflight: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            cache_hits: AtomicUsize::new(0),
            cache_misses: AtomicUsize::new(0),
        }
    }

    /// Get cache statistics (hits, misses)
    pub fn stats(&self) -> (usize, usize) {
        (
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Get current cache size (number of entries)
    pub fn len(&self) -> usize {
        match self.cache.read() {
            Ok(cache) => cache.len(),
            Err(poisoned) => {
                tracing::warn!("CRL cache read lock poisoned during size check, recovering");
                poisoned.into_inner().len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the CRL published at `uri` for `issuer`, valid at
    /// `validation_time`.
    ///
    /// `Ok(None)` covers every transient miss: malformed or unsupported URI,
    /// fetch failure, structural parse failure, or a CRL whose window does
    /// not cover the queried time. Malformed CRL extensions are a fatal
    /// internal fault and propagate as `Err`.
    pub fn find(
        &self,
        uri: &str,
        issuer: &Certificate,
        validation_time: SystemTime,
    ) -> Result<Option<Arc<CrlInfo>>, TrustError> {
        let key = CrlCacheKey {
            uri: uri.to_string(),
            issuer: issuer.subject().as_raw().to_vec(),
        };

        if let Some(crl) = self.lookup(&key, validation_time) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("CRL cache hit for URI: {}", uri);
            return Ok(Some(crl));
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        // Singleflight: one fetch per key, racing callers wait then re-read.
        let guard = {
            let mut inflight = match self.inflight.lock() {
                Ok(inflight) => inflight,
                Err(poisoned) => {
                    tracing::warn!("CRL inflight lock poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _flight = match guard.lock() {
            Ok(flight) => flight,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(crl) = self.lookup(&key, validation_time) {
            return Ok(Some(crl));
        }

        let fetched = self.fetch_and_parse(uri);
        self.finish_flight(&key);
        let Some(crl) = fetched? else {
            return Ok(None);
        };

        let crl = Arc::new(crl);
        self.insert(key, crl.clone());
        if crl.covers(validation_time) {
            Ok(Some(crl))
        } else {
            tracing::warn!(
                "CRL from {} does not cover the validation time (thisUpdate {:?}, nextUpdate {:?})",
                uri,
                crl.this_update(),
                crl.next_update()
            );
            Ok(None)
        }
    }

    /// Drop every entry no longer valid at `now`.
    pub fn cleanup(&self, now: SystemTime) {
        let mut cache = self.write_cache();
        cache.retain(|_, entry| entry.crl.covers(now));
        tracing::debug!("CRL cache cleanup completed, {} CRLs remaining", cache.len());
    }

    fn lookup(&self, key: &CrlCacheKey, validation_time: SystemTime) -> Option<Arc<CrlInfo>> {
        let cache = match self.cache.read() {
            Ok(cache) => cache,
            Err(poisoned) => {
                tracing::warn!("CRL cache read lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        cache
            .get(key)
            .filter(|entry| entry.crl.covers(validation_time))
            .map(|entry| entry.crl.clone())
    }

    fn fetch_and_parse(&self, uri: &str) -> Result<Option<CrlInfo>, TrustError> {
        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("malformed CRL distribution URI {}: {}", uri, e);
                return Ok(None);
            }
        };
        if !scheme_supported(url.scheme()) {
            tracing::warn!("unsupported CRL URI scheme: {}", url.scheme());
            return Ok(None);
        }

        let bytes = match self.fetcher.fetch(&url) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("CRL fetch failed for {}: {}", uri, e);
                return Ok(None);
            }
        };

        let der_bytes = if bytes.starts_with(b"-----BEGIN") {
            match pem::parse(&bytes) {
                Ok(block) if block.tag().contains("CRL") => block.contents().to_vec(),
                Ok(block) => {
                    tracing::warn!("unexpected PEM tag {} from {}", block.tag(), uri);
                    return Ok(None);
                }
                Err(e) => {
                    tracing::warn!("PEM decoding failed for {}: {}", uri, e);
                    return Ok(None);
                }
            }
        } else {
            bytes
        };

        match CrlInfo::from_der(&der_bytes) {
            Ok(crl) => {
                tracing::info!(
                    "parsed CRL from {} with {} revoked certificates, next update: {:?}",
                    uri,
                    crl.revoked_count(),
                    crl.next_update()
                );
                Ok(Some(crl))
            }
            Err(CrlParseError::Structure(e)) => {
                tracing::warn!("CRL parsing failed for {}: {}", uri, e);
                Ok(None)
            }
            Err(CrlParseError::Extension(e)) => Err(TrustError::Internal(format!(
                "CRL extension parsing failed for {uri}: {e}"
            ))),
        }
    }

    fn insert(&self, key: CrlCacheKey, crl: Arc<CrlInfo>) {
        let mut cache = self.write_cache();
        if cache.len() >= self.max_entries && !cache.contains_key(&key) {
            let now = SystemTime::now();
            cache.retain(|_, entry| entry.crl.covers(now));
            if cache.len() >= self.max_entries {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, entry)| entry.fetched_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    cache.remove(&oldest);
                }
            }
        }
        cache.insert(
            key,
            CrlCacheEntry {
                crl,
                fetched_at: SystemTime::now(),
            },
        );
    }

    fn finish_flight(&self, key: &CrlCacheKey) {
        let mut inflight = match self.inflight.lock() {
            Ok(inflight) => inflight,
            Err(poisoned) => poisoned.into_inner(),
        };
        inflight.remove(key);
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CrlCacheKey, CrlCacheEntry>> {
        match self.cache.write() {
            Ok(cache) => cache,
            Err(poisoned) => {
                tracing::warn!("CRL cache write lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
