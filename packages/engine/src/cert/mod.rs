//! Certificate model and parsing

pub mod chain;
pub(crate) mod parser;
pub mod types;

pub use chain::CertificateChain;
pub use types::{BasicConstraints, Certificate, DistinguishedName, KeyUsageFlags, SubjectPublicKey};
