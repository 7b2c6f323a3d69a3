//! Revocation evidence and the CRL trust linker

pub mod crl_linker;
pub mod data;

pub use crl_linker::CrlTrustLinker;
pub use data::{CrlEvidence, OcspEvidence, RevocationData};
