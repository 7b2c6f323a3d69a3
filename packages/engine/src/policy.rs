//! Signature algorithm policy

use std::collections::HashSet;

use once_cell::sync::Lazy;

// RSA PKCS#1 v1.5
const MD2_WITH_RSA: &str = "1.2.840.113549.1.1.2";
const MD4_WITH_RSA: &str = "1.2.840.113549.1.1.3";
const MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";
const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
const SHA224_WITH_RSA: &str = "1.2.840.113549.1.1.14";
const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
// ECDSA
const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
const ECDSA_WITH_SHA224: &str = "1.2.840.10045.4.3.1";
const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
// DSA
const DSA_WITH_SHA1: &str = "1.2.840.10040.4.3";
const DSA_WITH_SHA256: &str = "2.16.840.1.101.3.4.3.2";
// EdDSA
const ED25519: &str = "1.3.101.112";
const ED448: &str = "1.3.101.113";

/// Algorithms accepted by the default policy. SHA-1 variants remain on the
/// list because legacy CRL issuers still sign with them; MD2/MD4/MD5 and any
/// unrecognized identifier are rejected.
static DEFAULT_ALLOWLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        SHA1_WITH_RSA,
        SHA224_WITH_RSA,
        SHA256_WITH_RSA,
        SHA384_WITH_RSA,
        SHA512_WITH_RSA,
        ECDSA_WITH_SHA1,
        ECDSA_WITH_SHA224,
        ECDSA_WITH_SHA256,
        ECDSA_WITH_SHA384,
        ECDSA_WITH_SHA512,
        DSA_WITH_SHA1,
        DSA_WITH_SHA256,
        ED25519,
        ED448,
    ])
});

/// Allowlist policy over signature-algorithm OIDs (dotted-decimal form).
///
/// The default set accepts the RSA PKCS#1, ECDSA, DSA and EdDSA variants
/// listed on [`AlgorithmPolicy::default`]; everything else - notably the
/// MD2/MD4/MD5 digests - is weak and rejected.
#[derive(Debug, Clone)]
pub struct AlgorithmPolicy {
    allowed: HashSet<String>,
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWLIST.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl AlgorithmPolicy {
    /// Default policy extended with additional acceptable OIDs.
    pub fn permitting<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::default();
        policy.allowed.extend(extra.into_iter().map(Into::into));
        policy
    }

    /// Default policy with the given OIDs removed.
    pub fn rejecting<'a, I>(oids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut policy = Self::default();
        for oid in oids {
            policy.allowed.remove(oid);
        }
        policy
    }

    /// Whether the given signature-algorithm OID is acceptable.
    pub fn permits(&self, oid: &str) -> bool {
        self.allowed.contains(oid)
    }
}
