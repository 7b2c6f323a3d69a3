//! Internal certificate parsing built on `x509-parser`

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use x509_parser::extensions::{
    CRLDistributionPoints, DistributionPointName, ExtendedKeyUsage, GeneralName, ParsedExtension,
};
use x509_parser::parse_x509_certificate;
use x509_parser::time::ASN1Time;

use super::types::{
    BasicConstraints, Certificate, DistinguishedName, KeyUsageFlags, SubjectPublicKey,
};
use crate::error::CertificateError;

// Access method inside AuthorityInformationAccess naming an OCSP responder
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

// ExtendedKeyUsage purposes surfaced as dotted OIDs
const OID_EKU_ANY: &str = "2.5.29.37.0";
const OID_EKU_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
const OID_EKU_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
const OID_EKU_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
const OID_EKU_EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
const OID_EKU_TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
const OID_EKU_OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";

pub(crate) fn parse_certificate(der: &[u8]) -> Result<Certificate, CertificateError> {
    let (rem, cert) =
        parse_x509_certificate(der).map_err(|e| CertificateError::Structure(e.to_string()))?;
    if !rem.is_empty() {
        return Err(CertificateError::Structure(
            "trailing data after certificate".to_string(),
        ));
    }

    let tbs = &cert.tbs_certificate;
    let subject = DistinguishedName::new(tbs.subject.as_raw().to_vec(), tbs.subject.to_string());
    let issuer = DistinguishedName::new(tbs.issuer.as_raw().to_vec(), tbs.issuer.to_string());

    let spki = &tbs.subject_pki;
    // Raw BIT STRING contents: the uncompressed point for EC keys, the
    // RSAPublicKey encoding for RSA keys - exactly what ring consumes.
    let key_bits: &[u8] = spki.subject_public_key.as_ref();
    let public_key = SubjectPublicKey {
        algorithm: spki.algorithm.algorithm.to_id_string(),
        curve: spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| params.as_oid().ok())
            .map(|oid| oid.to_id_string()),
        key: key_bits.to_vec(),
    };

    let mut key_usage = None;
    let mut basic_constraints = None;
    let mut crl_uris = Vec::new();
    let mut ocsp_uris = Vec::new();
    let mut extended_key_usage = Vec::new();

    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::KeyUsage(usage) => {
                key_usage = Some(KeyUsageFlags {
                    digital_signature: usage.digital_signature(),
                    key_cert_sign: usage.key_cert_sign(),
                    crl_sign: usage.crl_sign(),
                });
            }
            ParsedExtension::BasicConstraints(bc) => {
                basic_constraints = Some(BasicConstraints {
                    ca: bc.ca,
                    path_len: bc.path_len_constraint,
                });
            }
            ParsedExtension::CRLDistributionPoints(points) => {
                crl_uris = uris_from_distribution_points(points);
            }
            ParsedExtension::AuthorityInfoAccess(aia) => {
                for desc in &aia.accessdescs {
                    if desc.access_method.to_id_string() == OID_AD_OCSP {
                        if let GeneralName::URI(uri) = &desc.access_location {
                            ocsp_uris.push((*uri).to_string());
                        }
                    }
                }
            }
            ParsedExtension::ExtendedKeyUsage(eku) => {
                extended_key_usage = eku_oids(eku);
            }
            _ => {}
        }
    }

    let signature: &[u8] = cert.signature_value.as_ref();
    Ok(Certificate {
        raw: der.to_vec(),
        tbs_raw: tbs.as_ref().to_vec(),
        signature: signature.to_vec(),
        signature_algorithm: cert.signature_algorithm.algorithm.to_id_string(),
        subject,
        issuer,
        serial: tbs.serial.to_bytes_be(),
        not_before: asn1_to_system_time(&tbs.validity.not_before),
        not_after: asn1_to_system_time(&tbs.validity.not_after),
        public_key,
        key_usage,
        basic_constraints,
        crl_uris,
        ocsp_uris,
        extended_key_usage,
    })
}

/// First URI general name of each DistributionPoint FullName. Non-URI name
/// forms (directory names, email addresses) are skipped.
pub(crate) fn uris_from_distribution_points(points: &CRLDistributionPoints<'_>) -> Vec<String> {
    let mut uris = Vec::new();
    for point in &points.points {
        if let Some(DistributionPointName::FullName(names)) = &point.distribution_point {
            let first_uri = names.iter().find_map(|name| match name {
                GeneralName::URI(uri) => Some((*uri).to_string()),
                _ => None,
            });
            if let Some(uri) = first_uri {
                uris.push(uri);
            }
        }
    }
    uris
}

fn eku_oids(eku: &ExtendedKeyUsage<'_>) -> Vec<String> {
    let mut oids = Vec::new();
    if eku.any {
        oids.push(OID_EKU_ANY.to_string());
    }
    if eku.server_auth {
        oids.push(OID_EKU_SERVER_AUTH.to_string());
    }
    if eku.client_auth {
        oids.push(OID_EKU_CLIENT_AUTH.to_string());
    }
    if eku.code_signing {
        oids.push(OID_EKU_CODE_SIGNING.to_string());
    }
    if eku.email_protection {
        oids.push(OID_EKU_EMAIL_PROTECTION.to_string());
    }
    if eku.time_stamping {
        oids.push(OID_EKU_TIME_STAMPING.to_string());
    }
    if eku.ocsp_signing {
        oids.push(OID_EKU_OCSP_SIGNING.to_string());
    }
    for other in &eku.other {
        oids.push(other.to_id_string());
    }
    oids
}

pub(crate) fn asn1_to_system_time(time: &ASN1Time) -> SystemTime {
    let ts = time.timestamp();
    if ts >= 0 {
        UNIX_EPOCH + Duration::from_secs(ts as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(ts.unsigned_abs())
    }
}
