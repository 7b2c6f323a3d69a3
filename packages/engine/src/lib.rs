//! # veryfy trust validation engine
//!
//! Validates pre-ordered X.509 certificate chains against a configured set of
//! trust anchors and produces a trust decision together with the revocation
//! evidence that justifies it.
//!
//! ## Features
//!
//! - **Ordered trust-linker pipeline** - pluggable revocation checks per
//!   (child, issuer) pair; the first definitive verdict wins
//! - **CRL revocation linking** with base + delta CRLs, freshness windows,
//!   and signature verification of every CRL consulted
//! - **Singleflight CRL cache** keyed by (URI, issuer) so bursts of identical
//!   validations incur one fetch
//! - **Injected cryptography** - signature verification is a value passed in,
//!   never process-wide provider state
//! - **Typed verdicts** - machine-readable reason codes with human-readable
//!   diagnostics

#![deny(unsafe_code)]
#![warn(clippy::all)]

// Core modules
pub mod anchors;
pub mod cert;
pub mod constraint;
pub mod crl;
pub mod crypto;
pub mod error;
pub mod linker;
pub mod policy;
pub mod revocation;
pub mod validator;

// Essential public API
pub use anchors::TrustAnchorStore;
pub use cert::{
    BasicConstraints, Certificate, CertificateChain, DistinguishedName, KeyUsageFlags,
    SubjectPublicKey,
};
pub use constraint::{CertificateConstraint, ConstraintViolation, ExtendedKeyUsageConstraint};
pub use crl::{CrlFetcher, CrlInfo, CrlRepository, FetchError, RevokedEntry, StaticCrlFetcher};
pub use crypto::{RingVerifier, SignatureVerifier, VerifyError};
pub use error::{CertificateError, ConfigError, CrlParseError, TrustError, TrustReason};
pub use linker::{LinkVerdict, TrustLinker};
pub use policy::AlgorithmPolicy;
pub use revocation::{CrlEvidence, CrlTrustLinker, OcspEvidence, RevocationData};
pub use validator::{RevocationPolicy, TrustValidator};
