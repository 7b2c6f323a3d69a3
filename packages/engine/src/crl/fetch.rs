//! CRL retrieval seam
//!
//! The engine never talks to the network itself; a [`CrlFetcher`] value is
//! plugged in at configuration time. Fetch failures are transient by design:
//! they surface as an abstain from the CRL linker, never as a trust verdict.

use std::collections::HashMap;
use std::sync::RwLock;

use url::Url;

/// URI schemes a fetcher is expected to serve, per the distribution points
/// found in real certificates.
pub const SUPPORTED_SCHEMES: [&str; 3] = ["http", "https", "ldap"];

/// Whether a URI scheme is one the CRL machinery will attempt at all.
pub fn scheme_supported(scheme: &str) -> bool {
    SUPPORTED_SCHEMES.contains(&scheme)
}

/// CRL retrieval failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("URI scheme {0} is not supported")]
    UnsupportedScheme(String),
    #[error("no CRL available at {0}")]
    NotFound(String),
    #[error("fetch cancelled before completion")]
    Cancelled,
    #[error("CRL response exceeds the configured size limit")]
    TooLarge,
    #[error("I/O failure during CRL fetch: {0}")]
    Io(String),
}

/// Retrieves raw CRL bytes (DER or PEM) by URI.
///
/// Implementations enforce their own deadlines; a cancelled or timed-out
/// fetch returns [`FetchError::Cancelled`] and leaves the cache untouched.
pub trait CrlFetcher: Send + Sync {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError>;
}

/// In-memory fetcher serving pre-loaded CRLs, for offline validation and
/// tests. Keys are the exact URI strings found in distribution points.
#[derive(Debug, Default)]
pub struct StaticCrlFetcher {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl StaticCrlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register CRL bytes under a distribution URI.
    pub fn insert(&self, uri: impl Into<String>, crl_bytes: Vec<u8>) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => {
                tracing::warn!("static CRL store write lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        entries.insert(uri.into(), crl_bytes);
    }
}

impl CrlFetcher for StaticCrlFetcher {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError> {
        if !scheme_supported(uri.scheme()) {
            return Err(FetchError::UnsupportedScheme(uri.scheme().to_string()));
        }
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(poisoned) => {
                tracing::warn!("static CRL store read lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        entries
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(uri.to_string()))
    }
}
