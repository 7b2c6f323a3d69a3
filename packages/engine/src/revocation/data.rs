//! Revocation evidence collected during one validation

/// Raw encoded CRL actually consulted for a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlEvidence {
    der: Vec<u8>,
}

impl CrlEvidence {
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

/// Raw encoded OCSP response actually consulted for a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspEvidence {
    der: Vec<u8>,
}

impl OcspEvidence {
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

/// Append-only collection of the revocation material linkers consulted.
///
/// Owned by the caller; its lifecycle spans a single validation call. Linkers
/// record one entry per CRL or OCSP response they actually used, so a caller
/// can archive the exact evidence behind a verdict.
#[derive(Debug, Default, Clone)]
pub struct RevocationData {
    crls: Vec<CrlEvidence>,
    ocsp_responses: Vec<OcspEvidence>,
}

impl RevocationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a consulted CRL by its raw encoding.
    pub fn record_crl(&mut self, der: &[u8]) {
        self.crls.push(CrlEvidence { der: der.to_vec() });
    }

    /// Record a consulted OCSP response by its raw encoding.
    pub fn record_ocsp_response(&mut self, der: &[u8]) {
        self.ocsp_responses.push(OcspEvidence { der: der.to_vec() });
    }

    pub fn crls(&self) -> &[CrlEvidence] {
        &self.crls
    }

    pub fn ocsp_responses(&self) -> &[OcspEvidence] {
        &self.ocsp_responses
    }

    pub fn is_empty(&self) -> bool {
        self.crls.is_empty() && self.ocsp_responses.is_empty()
    }
}
