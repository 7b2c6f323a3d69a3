//! Owned CRL types

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::cert::DistinguishedName;
use crate::error::CrlParseError;

/// One revoked-certificate entry from a CRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokedEntry {
    pub revocation_date: SystemTime,
    /// CRLReason code when the entry carries one.
    pub reason: Option<u8>,
}

/// Parsed X.509 v2 CRL, owning its encoding and the fields revocation
/// linking consumes.
#[derive(Clone)]
pub struct CrlInfo {
    pub(crate) raw: Vec<u8>,
    pub(crate) tbs_raw: Vec<u8>,
    pub(crate) signature: Vec<u8>,
    pub(crate) signature_algorithm: String,
    pub(crate) issuer: DistinguishedName,
    pub(crate) this_update: SystemTime,
    pub(crate) next_update: Option<SystemTime>,
    pub(crate) revoked: HashMap<Vec<u8>, RevokedEntry>,
    pub(crate) crl_number: Option<Vec<u8>>,
    pub(crate) delta_base: Option<Vec<u8>>,
    pub(crate) indirect: bool,
    pub(crate) freshest_uris: Vec<String>,
}

impl CrlInfo {
    /// Parse a DER-encoded CRL. Structural and extension failures are kept
    /// apart: the former mean unusable input, the latter mean a fault in data
    /// a trusted issuer published.
    pub fn from_der(der: &[u8]) -> Result<Self, CrlParseError> {
        super::parser::parse_crl(der)
    }

    pub fn as_der(&self) -> &[u8] {
        &self.raw
    }

    pub fn tbs_der(&self) -> &[u8] {
        &self.tbs_raw
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    pub fn this_update(&self) -> SystemTime {
        self.this_update
    }

    pub fn next_update(&self) -> Option<SystemTime> {
        self.next_update
    }

    /// Freshness predicate: `thisUpdate <= at <= nextUpdate`. A CRL without
    /// `nextUpdate` never covers any time (fail closed).
    pub fn covers(&self, at: SystemTime) -> bool {
        match self.next_update {
            Some(next_update) => self.this_update <= at && at <= next_update,
            None => false,
        }
    }

    /// Revocation entry for a serial number, if listed.
    pub fn revoked_entry(&self, serial: &[u8]) -> Option<&RevokedEntry> {
        self.revoked.get(serial)
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// CRLNumber extension value, big-endian with no leading zeroes.
    pub fn crl_number(&self) -> Option<&[u8]> {
        self.crl_number.as_deref()
    }

    /// DeltaCRLIndicator extension value; present on delta CRLs only.
    pub fn delta_base(&self) -> Option<&[u8]> {
        self.delta_base.as_deref()
    }

    pub fn is_delta(&self) -> bool {
        self.delta_base.is_some()
    }

    /// IssuingDistributionPoint indirectCRL flag.
    pub fn is_indirect(&self) -> bool {
        self.indirect
    }

    /// Delta CRL locations from the FreshestCRL extension.
    pub fn freshest_uris(&self) -> &[String] {
        &self.freshest_uris
    }
}

impl fmt::Debug for CrlInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrlInfo")
            .field("issuer", &self.issuer)
            .field("this_update", &self.this_update)
            .field("next_update", &self.next_update)
            .field("revoked_count", &self.revoked.len())
            .field("is_delta", &self.is_delta())
            .finish_non_exhaustive()
    }
}

/// Cache lookup key: distribution URI plus the issuer subject DN the CRL
/// must have been signed for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrlCacheKey {
    pub uri: String,
    pub issuer: Vec<u8>,
}

/// Cached parse result plus the time it was fetched, used for eviction
/// ordering.
#[derive(Debug, Clone)]
pub struct CrlCacheEntry {
    pub crl: Arc<CrlInfo>,
    pub fetched_at: SystemTime,
}
