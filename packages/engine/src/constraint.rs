//! Optional predicates over the leaf certificate

use crate::cert::Certificate;

/// Violation detail reported back to the validator, which maps it to an
/// INVALID_KEY_USAGE verdict naming the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub detail: String,
}

impl ConstraintViolation {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Additional acceptance predicate over the leaf certificate, evaluated
/// after the chain itself is established.
pub trait CertificateConstraint: Send + Sync {
    fn check(&self, leaf: &Certificate) -> Result<(), ConstraintViolation>;
}

/// Requires the leaf to carry a given ExtendedKeyUsage purpose (dotted OID).
/// The anyExtendedKeyUsage purpose satisfies every requirement.
#[derive(Debug, Clone)]
pub struct ExtendedKeyUsageConstraint {
    required: String,
}

impl ExtendedKeyUsageConstraint {
    pub fn new(required_oid: impl Into<String>) -> Self {
        Self {
            required: required_oid.into(),
        }
    }

    /// TLS server authentication (1.3.6.1.5.5.7.3.1).
    pub fn server_auth() -> Self {
        Self::new("1.3.6.1.5.5.7.3.1")
    }

    /// TLS client authentication (1.3.6.1.5.5.7.3.2).
    pub fn client_auth() -> Self {
        Self::new("1.3.6.1.5.5.7.3.2")
    }
}

const ANY_EXTENDED_KEY_USAGE: &str = "2.5.29.37.0";

impl CertificateConstraint for ExtendedKeyUsageConstraint {
    fn check(&self, leaf: &Certificate) -> Result<(), ConstraintViolation> {
        let purposes = leaf.extended_key_usage();
        let satisfied = purposes
            .iter()
            .any(|oid| oid == &self.required || oid == ANY_EXTENDED_KEY_USAGE);
        if satisfied {
            Ok(())
        } else {
            Err(ConstraintViolation::new(format!(
                "extended key usage {} required but not asserted",
                self.required
            )))
        }
    }
}
