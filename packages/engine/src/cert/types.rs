//! Owned certificate types extracted from X.509 input

use std::fmt;
use std::time::SystemTime;

use crate::error::CertificateError;

/// X.501 distinguished name, kept both as the raw DER it was encoded with
/// (used for equality) and a printable form (used for diagnostics).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DistinguishedName {
    raw: Vec<u8>,
    display: String,
}

impl DistinguishedName {
    pub(crate) fn new(raw: Vec<u8>, display: String) -> Self {
        Self { raw, display }
    }

    /// Raw DER encoding of the name. Name matching in this crate is exact
    /// byte equality, never string comparison.
    pub fn as_raw(&self) -> &[u8] {
        &self.raw
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl fmt::Debug for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DistinguishedName({})", self.display)
    }
}

/// Subject public key material in the form verification backends consume:
/// key algorithm OID, optional named-curve OID, and the raw key bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPublicKey {
    pub algorithm: String,
    pub curve: Option<String>,
    pub key: Vec<u8>,
}

/// KeyUsage bits this crate acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsageFlags {
    pub digital_signature: bool,
    pub key_cert_sign: bool,
    pub crl_sign: bool,
}

/// BasicConstraints as used during chain walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
}

/// Parsed X.509 certificate, owning its encoding and the fields the
/// validation engine consumes.
#[derive(Clone)]
pub struct Certificate {
    pub(crate) raw: Vec<u8>,
    pub(crate) tbs_raw: Vec<u8>,
    pub(crate) signature: Vec<u8>,
    pub(crate) signature_algorithm: String,
    pub(crate) subject: DistinguishedName,
    pub(crate) issuer: DistinguishedName,
    pub(crate) serial: Vec<u8>,
    pub(crate) not_before: SystemTime,
    pub(crate) not_after: SystemTime,
    pub(crate) public_key: SubjectPublicKey,
    pub(crate) key_usage: Option<KeyUsageFlags>,
    pub(crate) basic_constraints: Option<BasicConstraints>,
    pub(crate) crl_uris: Vec<String>,
    pub(crate) ocsp_uris: Vec<String>,
    pub(crate) extended_key_usage: Vec<String>,
}

impl Certificate {
    /// Parse a DER-encoded certificate. Structural failures and malformed
    /// extensions are errors here, before any validation begins.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        super::parser::parse_certificate(der)
    }

    /// Parse a single PEM-wrapped certificate.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, CertificateError> {
        let block = pem::parse(pem_data).map_err(|e| CertificateError::Pem(e.to_string()))?;
        if block.tag() != "CERTIFICATE" {
            return Err(CertificateError::Pem(format!(
                "unexpected PEM tag {}",
                block.tag()
            )));
        }
        Self::from_der(block.contents())
    }

    /// Raw DER encoding.
    pub fn as_der(&self) -> &[u8] {
        &self.raw
    }

    /// Raw TBS (to-be-signed) bytes, the message covered by the signature.
    pub fn tbs_der(&self) -> &[u8] {
        &self.tbs_raw
    }

    /// Signature bytes over the TBS encoding.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Signature algorithm OID in dotted-decimal form.
    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    /// Serial number, big-endian with no leading zero bytes.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Whether `at` falls inside the certificate validity window.
    pub fn valid_at(&self, at: SystemTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    pub fn public_key(&self) -> &SubjectPublicKey {
        &self.public_key
    }

    pub fn key_usage(&self) -> Option<&KeyUsageFlags> {
        self.key_usage.as_ref()
    }

    pub fn basic_constraints(&self) -> Option<&BasicConstraints> {
        self.basic_constraints.as_ref()
    }

    /// CRL distribution URIs, one per DistributionPoint carrying a URI
    /// general name (first URI of each point).
    pub fn crl_uris(&self) -> &[String] {
        &self.crl_uris
    }

    /// OCSP responder URIs from AuthorityInformationAccess.
    pub fn ocsp_uris(&self) -> &[String] {
        &self.ocsp_uris
    }

    /// ExtendedKeyUsage OIDs in dotted-decimal form.
    pub fn extended_key_usage(&self) -> &[String] {
        &self.extended_key_usage
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("serial", &hex::encode(&self.serial))
            .finish_non_exhaustive()
    }
}
