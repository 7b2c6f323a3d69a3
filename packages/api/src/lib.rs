//! # veryfy
//!
//! X.509 chain trust validation: walk a pre-ordered certificate chain,
//! anchor it in a configured trust store, and decide revocation through an
//! ordered pipeline of trust linkers, collecting the CRL/OCSP evidence that
//! justifies the verdict.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use veryfy::{CertificateChain, StaticCrlFetcher, Veryfy};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let (root_pem, chain_pem): (&[u8], &[u8]) = (&[], &[]);
//! let fetcher = Arc::new(StaticCrlFetcher::new());
//! let validator = Veryfy::validator()
//!     .anchor_pem(root_pem)
//!     .crl_checks(fetcher)
//!     .build()?;
//!
//! let chain = CertificateChain::from_pem_bundle(chain_pem)?;
//! match validator.is_trusted(&chain) {
//!     Ok(()) => println!("chain accepted"),
//!     Err(verdict) => println!("chain rejected: {verdict}"),
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;

pub use builder::ValidatorBuilder;

// Re-export the engine's public API
pub use veryfy_engine::{
    AlgorithmPolicy, BasicConstraints, Certificate, CertificateChain, CertificateConstraint,
    CertificateError, ConfigError, ConstraintViolation, CrlEvidence, CrlFetcher, CrlInfo,
    CrlParseError, CrlRepository, CrlTrustLinker, DistinguishedName, ExtendedKeyUsageConstraint,
    FetchError, KeyUsageFlags, LinkVerdict, OcspEvidence, RevocationData, RevocationPolicy,
    RevokedEntry, RingVerifier, SignatureVerifier, StaticCrlFetcher, SubjectPublicKey,
    TrustAnchorStore, TrustError, TrustLinker, TrustReason, TrustValidator, VerifyError,
};

/// Main entry point providing static builder constructors.
pub struct Veryfy;

impl Veryfy {
    /// Start configuring a trust validator.
    ///
    /// Shorthand for `ValidatorBuilder::new()`
    pub fn validator() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }
}

/// Start configuring a trust validator.
///
/// Shorthand for `ValidatorBuilder::new()`
pub fn validator() -> ValidatorBuilder {
    ValidatorBuilder::new()
}
