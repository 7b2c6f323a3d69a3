//! Signature verification backends
//!
//! Cryptography is an explicit dependency of the validator and the linkers:
//! a [`SignatureVerifier`] value is injected at construction, never looked up
//! through process-wide provider state.

use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, SECP_256_R_1, SECP_384_R_1};
use const_oid::db::rfc8410::ID_ED_25519;
use ring::signature;

use crate::cert::SubjectPublicKey;

const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";

/// Signature verification failures.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("signature does not verify under the given public key")]
    BadSignature,
    #[error("signature algorithm {0} is not supported by this backend")]
    UnsupportedAlgorithm(String),
    #[error("public key is incompatible with signature algorithm {0}")]
    KeyMismatch(String),
}

/// Verification backend over raw TBS bytes and signature bytes.
///
/// `signature_algorithm` is the dotted-decimal OID taken from the signed
/// structure; `signer` is the public key of the asserted signer.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        signature_algorithm: &str,
        signer: &SubjectPublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError>;
}

/// `ring`-backed verifier covering the RSA PKCS#1, ECDSA P-256/P-384 and
/// Ed25519 algorithms found in practice.
#[derive(Debug, Default, Clone, Copy)]
pub struct RingVerifier;

impl RingVerifier {
    pub fn new() -> Self {
        Self
    }

    fn algorithm(
        signature_algorithm: &str,
        signer: &SubjectPublicKey,
    ) -> Result<&'static dyn signature::VerificationAlgorithm, VerifyError> {
        match signature_algorithm {
            SHA1_WITH_RSA => Ok(&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY),
            SHA256_WITH_RSA => Ok(&signature::RSA_PKCS1_2048_8192_SHA256),
            SHA384_WITH_RSA => Ok(&signature::RSA_PKCS1_2048_8192_SHA384),
            SHA512_WITH_RSA => Ok(&signature::RSA_PKCS1_2048_8192_SHA512),
            ECDSA_WITH_SHA256 | ECDSA_WITH_SHA384 => {
                if signer.algorithm != ID_EC_PUBLIC_KEY.to_string() {
                    return Err(VerifyError::KeyMismatch(signature_algorithm.to_string()));
                }
                let curve = signer
                    .curve
                    .as_deref()
                    .ok_or_else(|| VerifyError::KeyMismatch(signature_algorithm.to_string()))?;
                let p256 = curve == SECP_256_R_1.to_string();
                let p384 = curve == SECP_384_R_1.to_string();
                match (signature_algorithm, p256, p384) {
                    (ECDSA_WITH_SHA256, true, _) => Ok(&signature::ECDSA_P256_SHA256_ASN1),
                    (ECDSA_WITH_SHA256, _, true) => Ok(&signature::ECDSA_P384_SHA256_ASN1),
                    (ECDSA_WITH_SHA384, true, _) => Ok(&signature::ECDSA_P256_SHA384_ASN1),
                    (ECDSA_WITH_SHA384, _, true) => Ok(&signature::ECDSA_P384_SHA384_ASN1),
                    _ => Err(VerifyError::UnsupportedAlgorithm(format!(
                        "{signature_algorithm} over curve {curve}"
                    ))),
                }
            }
            oid if oid == ID_ED_25519.to_string() => Ok(&signature::ED25519),
            other => Err(VerifyError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl SignatureVerifier for RingVerifier {
    fn verify(
        &self,
        signature_algorithm: &str,
        signer: &SubjectPublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError> {
        let algorithm = Self::algorithm(signature_algorithm, signer)?;
        signature::UnparsedPublicKey::new(algorithm, &signer.key)
            .verify(message, signature)
            .map_err(|_| VerifyError::BadSignature)
    }
}
