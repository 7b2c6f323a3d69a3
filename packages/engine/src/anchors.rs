//! Trust anchor store

use crate::cert::Certificate;
use crate::error::CertificateError;

/// Set of certificates accepted as terminal authority.
///
/// Anchors are matched against the final chain element by exact DER
/// equality. The store is read-only during validation; populate it before
/// building the validator.
#[derive(Debug, Default, Clone)]
pub struct TrustAnchorStore {
    anchors: Vec<Certificate>,
}

impl TrustAnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, anchor: Certificate) {
        if !self.contains(&anchor) {
            self.anchors.push(anchor);
        }
    }

    pub fn add_der(&mut self, der: &[u8]) -> Result<(), CertificateError> {
        self.add(Certificate::from_der(der)?);
        Ok(())
    }

    pub fn add_pem(&mut self, pem_data: &[u8]) -> Result<(), CertificateError> {
        self.add(Certificate::from_pem(pem_data)?);
        Ok(())
    }

    /// Whether `certificate` is one of the configured anchors.
    pub fn contains(&self, certificate: &Certificate) -> bool {
        self.anchors
            .iter()
            .any(|anchor| anchor.as_der() == certificate.as_der())
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.anchors.iter()
    }
}
