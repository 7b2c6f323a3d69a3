//! Ordered certificate chains

use crate::error::CertificateError;

use super::types::Certificate;

/// Ordered certificate chain: index 0 is the leaf, the last element is the
/// anchor candidate. Chains arrive pre-ordered; the validator verifies the
/// issuer/subject adjacency rather than building paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    pub fn new(certs: Vec<Certificate>) -> Self {
        Self { certs }
    }

    /// Build a chain from DER-encoded certificates, leaf first.
    pub fn from_der_chain<'a, I>(ders: I) -> Result<Self, CertificateError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let certs = ders
            .into_iter()
            .map(Certificate::from_der)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { certs })
    }

    /// Build a chain from a concatenated PEM bundle, leaf first.
    pub fn from_pem_bundle(pem_data: &[u8]) -> Result<Self, CertificateError> {
        let blocks = pem::parse_many(pem_data).map_err(|e| CertificateError::Pem(e.to_string()))?;
        let mut certs = Vec::new();
        for block in blocks {
            if block.tag() != "CERTIFICATE" {
                continue;
            }
            certs.push(Certificate::from_der(block.contents())?);
        }
        if certs.is_empty() {
            return Err(CertificateError::Pem(
                "no certificates found in PEM bundle".to_string(),
            ));
        }
        Ok(Self { certs })
    }

    pub fn leaf(&self) -> Option<&Certificate> {
        self.certs.first()
    }

    /// Final chain element, the certificate that must match a trust anchor.
    pub fn anchor_candidate(&self) -> Option<&Certificate> {
        self.certs.last()
    }

    pub fn get(&self, index: usize) -> Option<&Certificate> {
        self.certs.get(index)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certs.iter()
    }

    /// Adjacent (child, issuer) pairs, leaf pair first. The anchor candidate
    /// only ever appears on the issuer side.
    pub fn pairs(&self) -> impl Iterator<Item = (&Certificate, &Certificate)> + '_ {
        self.certs.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certs.iter()
    }
}
