//! Shared test fixtures: certificates and CRLs assembled as real DER and
//! signed with ECDSA P-256 keys, so every signature the engine verifies in
//! tests is a genuine signature.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use veryfy_engine::{CrlFetcher, FetchError, StaticCrlFetcher};

pub const ECDSA_SHA256: &str = "1.2.840.10045.4.3.2";
pub const MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";

pub const OID_CN: &str = "2.5.4.3";
pub const OID_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const OID_KEY_USAGE: &str = "2.5.29.15";
pub const OID_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const OID_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
pub const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";
pub const OID_EXTENDED_KEY_USAGE: &str = "2.5.29.37";
pub const OID_CRL_NUMBER: &str = "2.5.29.20";
pub const OID_CRL_REASON: &str = "2.5.29.21";
pub const OID_DELTA_CRL_INDICATOR: &str = "2.5.29.27";
pub const OID_ISSUING_DISTRIBUTION_POINT: &str = "2.5.29.28";
pub const OID_FRESHEST_CRL: &str = "2.5.29.46";

pub const EKU_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";

/// Fixed validation epoch so every test is deterministic.
pub fn t0() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

pub fn days(n: u64) -> Duration {
    Duration::from_secs(n * 86_400)
}

pub fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3_600)
}

// ---------------------------------------------------------------------------
// Minimal DER writer
// ---------------------------------------------------------------------------

fn encode_len(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let mut bytes = Vec::new();
    let mut value = len;
    while value > 0 {
        bytes.push((value & 0xFF) as u8);
        value >>= 8;
    }
    bytes.reverse();
    let mut out = vec![0x80 | bytes.len() as u8];
    out.extend(bytes);
    out
}

pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(encode_len(content.len()));
    out.extend_from_slice(content);
    out
}

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

pub fn der_seq(parts: &[&[u8]]) -> Vec<u8> {
    tlv(0x30, &concat(parts))
}

pub fn der_set(parts: &[&[u8]]) -> Vec<u8> {
    tlv(0x31, &concat(parts))
}

/// Context-specific tag, constructed or primitive.
pub fn der_ctx(number: u8, constructed: bool, content: &[u8]) -> Vec<u8> {
    let tag = 0x80 | number | if constructed { 0x20 } else { 0x00 };
    tlv(tag, content)
}

pub fn der_oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted
        .split('.')
        .map(|arc| arc.parse().expect("numeric OID arc"))
        .collect();
    let mut body = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for &arc in &arcs[2..] {
        body.extend(base128(arc));
    }
    tlv(0x06, &body)
}

fn base128(mut value: u64) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    bytes.reverse();
    bytes
}

/// DER INTEGER from unsigned big-endian bytes, adding sign padding.
pub fn der_integer(unsigned_be: &[u8]) -> Vec<u8> {
    let first_nonzero = unsigned_be
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(unsigned_be.len().saturating_sub(1));
    let mut body = unsigned_be[first_nonzero..].to_vec();
    if body.is_empty() {
        body.push(0);
    }
    if body[0] & 0x80 != 0 {
        body.insert(0, 0);
    }
    tlv(0x02, &body)
}

pub fn der_uint(value: u64) -> Vec<u8> {
    der_integer(&value.to_be_bytes())
}

pub fn der_utf8(value: &str) -> Vec<u8> {
    tlv(0x0C, value.as_bytes())
}

pub fn der_octet_string(content: &[u8]) -> Vec<u8> {
    tlv(0x04, content)
}

pub fn der_bit_string(content: &[u8]) -> Vec<u8> {
    let mut body = vec![0x00];
    body.extend_from_slice(content);
    tlv(0x03, &body)
}

pub fn der_bool_true() -> Vec<u8> {
    vec![0x01, 0x01, 0xFF]
}

/// GeneralizedTime with seconds precision (YYYYMMDDHHMMSSZ).
pub fn der_generalized_time(at: SystemTime) -> Vec<u8> {
    let secs = at
        .duration_since(UNIX_EPOCH)
        .expect("fixture times are after the epoch")
        .as_secs() as i64;
    let (year, month, day) = civil_from_days(secs.div_euclid(86_400));
    let tod = secs.rem_euclid(86_400);
    let formatted = format!(
        "{year:04}{month:02}{day:02}{:02}{:02}{:02}Z",
        tod / 3600,
        (tod % 3600) / 60,
        tod % 60
    );
    tlv(0x18, formatted.as_bytes())
}

fn civil_from_days(days_since_epoch: i64) -> (i64, u32, u32) {
    let z = days_since_epoch + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

/// Single-RDN distinguished name: CN=<value>.
pub fn dn(common_name: &str) -> Vec<u8> {
    der_seq(&[&der_set(&[&der_seq(&[
        &der_oid(OID_CN),
        &der_utf8(common_name),
    ])])])
}

fn alg_ecdsa_sha256() -> Vec<u8> {
    der_seq(&[&der_oid(ECDSA_SHA256)])
}

fn alg_md5_rsa() -> Vec<u8> {
    // MD5-with-RSA carries an explicit NULL parameter
    der_seq(&[&der_oid(MD5_WITH_RSA), &[0x05, 0x00]])
}

fn extension(oid: &str, critical: bool, value: &[u8]) -> Vec<u8> {
    let oid_der = der_oid(oid);
    let value_der = der_octet_string(value);
    if critical {
        der_seq(&[&oid_der, &der_bool_true(), &value_der])
    } else {
        der_seq(&[&oid_der, &value_der])
    }
}

/// CRLDistributionPoints / FreshestCRL body: one DistributionPoint per URI.
pub fn distribution_points_value(uris: &[&str]) -> Vec<u8> {
    let points: Vec<Vec<u8>> = uris
        .iter()
        .map(|uri| {
            let general_name = tlv(0x86, uri.as_bytes());
            let full_name = der_ctx(0, true, &general_name);
            let dp_name = der_ctx(0, true, &full_name);
            der_seq(&[&dp_name])
        })
        .collect();
    let refs: Vec<&[u8]> = points.iter().map(Vec::as_slice).collect();
    der_seq(&refs)
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// ECDSA P-256 signing key with its SubjectPublicKeyInfo encoding.
pub struct TestKey {
    keypair: EcdsaKeyPair,
    rng: SystemRandom,
    spki: Vec<u8>,
}

impl TestKey {
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .expect("P-256 key generation");
        let keypair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .expect("P-256 key load");
        let algorithm = der_seq(&[
            &der_oid("1.2.840.10045.2.1"),
            &der_oid("1.2.840.10045.3.1.7"),
        ]);
        let spki = der_seq(&[&algorithm, &der_bit_string(keypair.public_key().as_ref())]);
        Self {
            keypair,
            rng,
            spki,
        }
    }

    pub fn spki(&self) -> &[u8] {
        &self.spki
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair
            .sign(&self.rng, message)
            .expect("ECDSA signing")
            .as_ref()
            .to_vec()
    }
}

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum KeyUsageSpec {
    /// keyCertSign + cRLSign
    Ca,
    /// keyCertSign only - cannot sign CRLs
    CaWithoutCrlSign,
    /// digitalSignature
    Leaf,
    Absent,
}

pub struct CertParams {
    pub subject_cn: String,
    pub issuer_cn: String,
    pub serial: u64,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
    pub is_ca: bool,
    pub path_len: Option<u64>,
    pub key_usage: KeyUsageSpec,
    pub crl_uris: Vec<String>,
    pub ocsp_uris: Vec<String>,
    pub eku: Vec<String>,
    pub weak_algorithm: bool,
}

impl CertParams {
    pub fn ca(cn: &str, issuer_cn: &str, serial: u64) -> Self {
        Self {
            subject_cn: cn.to_string(),
            issuer_cn: issuer_cn.to_string(),
            serial,
            not_before: t0() - days(30),
            not_after: t0() + days(30),
            is_ca: true,
            path_len: None,
            key_usage: KeyUsageSpec::Ca,
            crl_uris: Vec::new(),
            ocsp_uris: Vec::new(),
            eku: Vec::new(),
            weak_algorithm: false,
        }
    }

    pub fn leaf(cn: &str, issuer_cn: &str, serial: u64) -> Self {
        Self {
            subject_cn: cn.to_string(),
            issuer_cn: issuer_cn.to_string(),
            serial,
            not_before: t0() - days(30),
            not_after: t0() + days(30),
            is_ca: false,
            path_len: None,
            key_usage: KeyUsageSpec::Leaf,
            crl_uris: Vec::new(),
            ocsp_uris: Vec::new(),
            eku: Vec::new(),
            weak_algorithm: false,
        }
    }
}

/// DER certificate for `params`, holding `subject_key`'s public key and
/// signed by `issuer_key`.
pub fn issue_cert(params: &CertParams, subject_key: &TestKey, issuer_key: &TestKey) -> Vec<u8> {
    let mut extensions: Vec<Vec<u8>> = Vec::new();

    if params.is_ca {
        let bc_value = match params.path_len {
            Some(path_len) => der_seq(&[&der_bool_true(), &der_uint(path_len)]),
            None => der_seq(&[&der_bool_true()]),
        };
        extensions.push(extension(OID_BASIC_CONSTRAINTS, true, &bc_value));
    }

    let key_usage_bits: Option<&[u8]> = match params.key_usage {
        // bits 5 (keyCertSign) and 6 (cRLSign), one unused trailing bit
        KeyUsageSpec::Ca => Some(&[0x01, 0x06]),
        // bit 5 only
        KeyUsageSpec::CaWithoutCrlSign => Some(&[0x02, 0x04]),
        // bit 0 (digitalSignature)
        KeyUsageSpec::Leaf => Some(&[0x07, 0x80]),
        KeyUsageSpec::Absent => None,
    };
    if let Some(bits) = key_usage_bits {
        extensions.push(extension(OID_KEY_USAGE, true, &tlv(0x03, bits)));
    }

    if !params.crl_uris.is_empty() {
        let uris: Vec<&str> = params.crl_uris.iter().map(String::as_str).collect();
        extensions.push(extension(
            OID_CRL_DISTRIBUTION_POINTS,
            false,
            &distribution_points_value(&uris),
        ));
    }

    if !params.ocsp_uris.is_empty() {
        let descs: Vec<Vec<u8>> = params
            .ocsp_uris
            .iter()
            .map(|uri| der_seq(&[&der_oid(OID_AD_OCSP), &tlv(0x86, uri.as_bytes())]))
            .collect();
        let refs: Vec<&[u8]> = descs.iter().map(Vec::as_slice).collect();
        extensions.push(extension(OID_AUTHORITY_INFO_ACCESS, false, &der_seq(&refs)));
    }

    if !params.eku.is_empty() {
        let oids: Vec<Vec<u8>> = params.eku.iter().map(|oid| der_oid(oid)).collect();
        let refs: Vec<&[u8]> = oids.iter().map(Vec::as_slice).collect();
        extensions.push(extension(OID_EXTENDED_KEY_USAGE, false, &der_seq(&refs)));
    }

    let ext_refs: Vec<&[u8]> = extensions.iter().map(Vec::as_slice).collect();
    let algorithm = if params.weak_algorithm {
        alg_md5_rsa()
    } else {
        alg_ecdsa_sha256()
    };

    let tbs = der_seq(&[
        &der_ctx(0, true, &der_integer(&[2])),
        &der_uint(params.serial),
        &algorithm,
        &dn(&params.issuer_cn),
        &der_seq(&[
            &der_generalized_time(params.not_before),
            &der_generalized_time(params.not_after),
        ]),
        &dn(&params.subject_cn),
        subject_key.spki(),
        &der_ctx(3, true, &der_seq(&ext_refs)),
    ]);

    let signature = if params.weak_algorithm {
        vec![0u8; 64]
    } else {
        issuer_key.sign(&tbs)
    };
    der_seq(&[&tbs, &algorithm, &der_bit_string(&signature)])
}

// ---------------------------------------------------------------------------
// CRLs
// ---------------------------------------------------------------------------

pub struct CrlParams {
    pub issuer_cn: String,
    pub this_update: SystemTime,
    pub next_update: Option<SystemTime>,
    /// (serial, revocation date, optional CRLReason code)
    pub revoked: Vec<(u64, SystemTime, Option<u8>)>,
    pub crl_number: Option<u64>,
    pub delta_base: Option<u64>,
    pub indirect: bool,
    pub freshest_uris: Vec<String>,
    /// (oid, critical, raw value) appended verbatim
    pub extra_extensions: Vec<(String, bool, Vec<u8>)>,
    pub weak_algorithm: bool,
}

impl CrlParams {
    pub fn base(issuer_cn: &str, crl_number: u64) -> Self {
        Self {
            issuer_cn: issuer_cn.to_string(),
            this_update: t0() - days(1),
            next_update: Some(t0() + days(1)),
            revoked: Vec::new(),
            crl_number: Some(crl_number),
            delta_base: None,
            indirect: false,
            freshest_uris: Vec::new(),
            extra_extensions: Vec::new(),
            weak_algorithm: false,
        }
    }

    pub fn delta(issuer_cn: &str, crl_number: u64, base_number: u64) -> Self {
        let mut params = Self::base(issuer_cn, crl_number);
        params.delta_base = Some(base_number);
        params
    }
}

/// DER X.509 v2 CRL for `params`, signed by `issuer_key`.
pub fn issue_crl(params: &CrlParams, issuer_key: &TestKey) -> Vec<u8> {
    let algorithm = if params.weak_algorithm {
        alg_md5_rsa()
    } else {
        alg_ecdsa_sha256()
    };

    let mut tbs_parts: Vec<Vec<u8>> = vec![
        der_integer(&[1]),
        algorithm.clone(),
        dn(&params.issuer_cn),
        der_generalized_time(params.this_update),
    ];
    if let Some(next_update) = params.next_update {
        tbs_parts.push(der_generalized_time(next_update));
    }

    if !params.revoked.is_empty() {
        let entries: Vec<Vec<u8>> = params
            .revoked
            .iter()
            .map(|(serial, date, reason)| {
                let mut entry_parts = vec![der_uint(*serial), der_generalized_time(*date)];
                if let Some(reason) = reason {
                    let reason_ext =
                        extension(OID_CRL_REASON, false, &[0x0A, 0x01, *reason]);
                    entry_parts.push(der_seq(&[&reason_ext]));
                }
                let refs: Vec<&[u8]> = entry_parts.iter().map(Vec::as_slice).collect();
                der_seq(&refs)
            })
            .collect();
        let refs: Vec<&[u8]> = entries.iter().map(Vec::as_slice).collect();
        tbs_parts.push(der_seq(&refs));
    }

    let mut extensions: Vec<Vec<u8>> = Vec::new();
    if let Some(number) = params.crl_number {
        extensions.push(extension(OID_CRL_NUMBER, false, &der_uint(number)));
    }
    if let Some(base) = params.delta_base {
        extensions.push(extension(OID_DELTA_CRL_INDICATOR, true, &der_uint(base)));
    }
    if params.indirect {
        let idp_value = der_seq(&[&der_ctx(4, false, &[0xFF])]);
        extensions.push(extension(OID_ISSUING_DISTRIBUTION_POINT, true, &idp_value));
    }
    if !params.freshest_uris.is_empty() {
        let uris: Vec<&str> = params.freshest_uris.iter().map(String::as_str).collect();
        extensions.push(extension(
            OID_FRESHEST_CRL,
            false,
            &distribution_points_value(&uris),
        ));
    }
    for (oid, critical, value) in &params.extra_extensions {
        extensions.push(extension(oid, *critical, value));
    }
    if !extensions.is_empty() {
        let refs: Vec<&[u8]> = extensions.iter().map(Vec::as_slice).collect();
        tbs_parts.push(der_ctx(0, true, &der_seq(&refs)));
    }

    let tbs_refs: Vec<&[u8]> = tbs_parts.iter().map(Vec::as_slice).collect();
    let tbs = der_seq(&tbs_refs);

    let signature = if params.weak_algorithm {
        vec![0u8; 64]
    } else {
        issuer_key.sign(&tbs)
    };
    der_seq(&[&tbs, &algorithm, &der_bit_string(&signature)])
}

/// Wraps a [`StaticCrlFetcher`] with an invocation counter and an optional
/// artificial delay, for cache and singleflight assertions.
pub struct CountingFetcher {
    pub inner: StaticCrlFetcher,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self {
            inner: StaticCrlFetcher::new(),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        let mut fetcher = Self::new();
        fetcher.delay = Some(delay);
        fetcher
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CrlFetcher for CountingFetcher {
    fn fetch(&self, uri: &url::Url) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.inner.fetch(uri)
    }
}

// ---------------------------------------------------------------------------
// Ready-made PKI
// ---------------------------------------------------------------------------

pub const ROOT_CN: &str = "Veryfy Test Root CA";
pub const ISSUING_CN: &str = "Veryfy Test Issuing CA";
pub const LEAF_CN: &str = "server.example.com";

pub const LEAF_CRL_URI: &str = "http://crl.example.com/issuing-ca.crl";
pub const ISSUING_CRL_URI: &str = "http://crl.example.com/root-ca.crl";
pub const DELTA_CRL_URI: &str = "http://crl.example.com/issuing-ca-delta.crl";

pub const LEAF_SERIAL: u64 = 0x20;

/// Three-tier PKI: self-signed root, issuing CA, TLS leaf. The leaf points
/// at [`LEAF_CRL_URI`], the issuing CA at [`ISSUING_CRL_URI`].
pub struct TestPki {
    pub root_key: TestKey,
    pub issuing_key: TestKey,
    pub leaf_key: TestKey,
    pub root_der: Vec<u8>,
    pub issuing_der: Vec<u8>,
    pub leaf_der: Vec<u8>,
}

impl TestPki {
    pub fn new() -> Self {
        Self::with_leaf_tweak(|_| {})
    }

    pub fn with_leaf_tweak(tweak: impl FnOnce(&mut CertParams)) -> Self {
        let root_key = TestKey::generate();
        let issuing_key = TestKey::generate();
        let leaf_key = TestKey::generate();

        let root_params = CertParams::ca(ROOT_CN, ROOT_CN, 1);
        let root_der = issue_cert(&root_params, &root_key, &root_key);

        let mut issuing_params = CertParams::ca(ISSUING_CN, ROOT_CN, 2);
        issuing_params.crl_uris = vec![ISSUING_CRL_URI.to_string()];
        let issuing_der = issue_cert(&issuing_params, &issuing_key, &root_key);

        let mut leaf_params = CertParams::leaf(LEAF_CN, ISSUING_CN, LEAF_SERIAL);
        leaf_params.crl_uris = vec![LEAF_CRL_URI.to_string()];
        leaf_params.eku = vec![EKU_SERVER_AUTH.to_string()];
        tweak(&mut leaf_params);
        let leaf_der = issue_cert(&leaf_params, &leaf_key, &issuing_key);

        Self {
            root_key,
            issuing_key,
            leaf_key,
            root_der,
            issuing_der,
            leaf_der,
        }
    }

    /// CRL published by the issuing CA covering the leaf, listing `revoked`.
    pub fn leaf_crl(&self, params: &CrlParams) -> Vec<u8> {
        issue_crl(params, &self.issuing_key)
    }

    /// CRL published by the root covering the issuing CA.
    pub fn root_crl(&self) -> Vec<u8> {
        issue_crl(&CrlParams::base(ROOT_CN, 7), &self.root_key)
    }
}
