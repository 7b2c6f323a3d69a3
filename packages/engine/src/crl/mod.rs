//! CRL model, fetching seam and caching repository

pub mod fetch;
pub(crate) mod parser;
pub mod repository;
pub mod types;

pub use fetch::{CrlFetcher, FetchError, StaticCrlFetcher};
pub use repository::CrlRepository;
pub use types::{CrlCacheEntry, CrlCacheKey, CrlInfo, RevokedEntry};
