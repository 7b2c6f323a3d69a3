//! Error and verdict types for trust validation

use std::fmt;

/// Machine-readable reason code attached to a negative trust verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustReason {
    /// A signature in the chain does not verify under the issuer key
    InvalidSignature,
    /// A certificate is revoked, or revocation status could not be established
    InvalidRevocationStatus,
    /// The validation time falls outside a certificate validity window
    InvalidValidityInterval,
    /// Key usage or certificate constraints forbid the attempted use
    InvalidKeyUsage,
    /// The chain structure itself is not trustworthy (broken adjacency,
    /// missing CA bit, path length exceeded)
    InvalidTrust,
    /// A signature algorithm is rejected by the algorithm policy
    InvalidAlgorithm,
    /// The final chain element is not a configured trust anchor
    RootNotTrusted,
}

impl fmt::Display for TrustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidRevocationStatus => "INVALID_REVOCATION_STATUS",
            Self::InvalidValidityInterval => "INVALID_VALIDITY_INTERVAL",
            Self::InvalidKeyUsage => "INVALID_KEY_USAGE",
            Self::InvalidTrust => "INVALID_TRUST",
            Self::InvalidAlgorithm => "INVALID_ALGORITHM",
            Self::RootNotTrusted => "ROOT_NOT_TRUSTED",
        };
        f.write_str(code)
    }
}

/// Outcome of a failed validation.
///
/// `Untrusted` is a semantic PKI decision; `Internal` signals a fault in data
/// that should have passed earlier parsing (malformed CRL extensions and the
/// like) and is deliberately distinct from a trust decision.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TrustError {
    #[error("{reason}: {message}")]
    Untrusted {
        reason: TrustReason,
        message: String,
    },
    #[error("internal validation fault: {0}")]
    Internal(String),
}

impl TrustError {
    pub fn untrusted(reason: TrustReason, message: impl Into<String>) -> Self {
        Self::Untrusted {
            reason,
            message: message.into(),
        }
    }

    /// Reason code when the error is a trust decision.
    pub fn reason(&self) -> Option<TrustReason> {
        match self {
            Self::Untrusted { reason, .. } => Some(*reason),
            Self::Internal(_) => None,
        }
    }
}

/// Certificate ingestion failures.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate parsing failed: {0}")]
    Structure(String),
    #[error("certificate extension parsing failed: {0}")]
    Extension(String),
    #[error("PEM decoding failed: {0}")]
    Pem(String),
}

/// CRL ingestion failures.
///
/// `Structure` means the bytes are not a usable CRL (the repository treats
/// this as a miss); `Extension` means a CRL from a trusted issuer carries
/// malformed extensions, which is a fatal internal fault rather than a trust
/// decision.
#[derive(Debug, thiserror::Error)]
pub enum CrlParseError {
    #[error("CRL parsing failed: {0}")]
    Structure(String),
    #[error("CRL extension parsing failed: {0}")]
    Extension(String),
}

/// Setup-time configuration failures. These are raised when the validator is
/// built, never during validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one trust anchor is required")]
    NoTrustAnchors,
    #[error("trust anchor could not be loaded: {0}")]
    InvalidAnchor(String),
}
