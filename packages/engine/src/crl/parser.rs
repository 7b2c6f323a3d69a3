//! Internal CRL parsing built on `x509-parser`, with manual DER walks for
//! the CRL-specific extensions it leaves unparsed

use std::collections::HashMap;

use der::{Decode, Header, Reader, SliceReader, Tag, TagNumber};
use x509_parser::extensions::CRLDistributionPoints;
use x509_parser::parse_x509_crl;
use x509_parser::prelude::FromDer;

use super::types::{CrlInfo, RevokedEntry};
use crate::cert::parser::{asn1_to_system_time, uris_from_distribution_points};
use crate::cert::DistinguishedName;
use crate::error::CrlParseError;

const OID_CRL_NUMBER: &str = "2.5.29.20";
const OID_DELTA_CRL_INDICATOR: &str = "2.5.29.27";
const OID_ISSUING_DISTRIBUTION_POINT: &str = "2.5.29.28";
const OID_FRESHEST_CRL: &str = "2.5.29.46";

pub(crate) fn parse_crl(der_bytes: &[u8]) -> Result<CrlInfo, CrlParseError> {
    let (rem, crl) =
        parse_x509_crl(der_bytes).map_err(|e| CrlParseError::Structure(e.to_string()))?;
    if !rem.is_empty() {
        return Err(CrlParseError::Structure(
            "trailing data after CRL".to_string(),
        ));
    }

    let tbs = &crl.tbs_cert_list;
    let issuer = DistinguishedName::new(tbs.issuer.as_raw().to_vec(), tbs.issuer.to_string());

    let mut revoked = HashMap::new();
    for entry in crl.iter_revoked_certificates() {
        let reason = entry.reason_code().map(|(_, code)| code.0);
        revoked.insert(
            entry.user_certificate.to_bytes_be(),
            RevokedEntry {
                revocation_date: asn1_to_system_time(&entry.revocation_date),
                reason,
            },
        );
    }

    let mut crl_number = None;
    let mut delta_base = None;
    let mut indirect = false;
    let mut freshest_uris = Vec::new();

    for ext in crl.extensions() {
        match ext.oid.to_id_string().as_str() {
            OID_CRL_NUMBER => crl_number = Some(parse_uint(ext.value)?),
            OID_DELTA_CRL_INDICATOR => delta_base = Some(parse_uint(ext.value)?),
            OID_ISSUING_DISTRIBUTION_POINT => indirect = parse_indirect_flag(ext.value)?,
            OID_FRESHEST_CRL => freshest_uris = parse_freshest_crl(ext.value)?,
            _ => {}
        }
    }

    let signature: &[u8] = crl.signature_value.as_ref();
    Ok(CrlInfo {
        raw: der_bytes.to_vec(),
        tbs_raw: tbs.as_ref().to_vec(),
        signature: signature.to_vec(),
        signature_algorithm: crl.signature_algorithm.algorithm.to_id_string(),
        issuer,
        this_update: asn1_to_system_time(&tbs.this_update),
        next_update: tbs.next_update.as_ref().map(asn1_to_system_time),
        revoked,
        crl_number,
        delta_base,
        indirect,
        freshest_uris,
    })
}

/// INTEGER extension body (CRLNumber, DeltaCRLIndicator) as big-endian bytes
/// with leading zeroes stripped, so values compare by byte equality.
fn parse_uint(value: &[u8]) -> Result<Vec<u8>, CrlParseError> {
    let number = der::asn1::Uint::from_der(value)
        .map_err(|e| CrlParseError::Extension(format!("CRL number is not an INTEGER: {e}")))?;
    let bytes = number.as_bytes();
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    Ok(bytes[first_nonzero..].to_vec())
}

/// indirectCRL flag ([4] BOOLEAN) from an IssuingDistributionPoint body.
fn parse_indirect_flag(value: &[u8]) -> Result<bool, CrlParseError> {
    let ext_err =
        |e: der::Error| CrlParseError::Extension(format!("IssuingDistributionPoint: {e}"));

    let mut outer = SliceReader::new(value).map_err(ext_err)?;
    let header = Header::decode(&mut outer).map_err(ext_err)?;
    if header.tag != Tag::Sequence {
        return Err(CrlParseError::Extension(
            "IssuingDistributionPoint is not a SEQUENCE".to_string(),
        ));
    }
    let body = outer.read_slice(header.length).map_err(ext_err)?;

    let mut reader = SliceReader::new(body).map_err(ext_err)?;
    let mut indirect = false;
    while !reader.is_finished() {
        let field = Header::decode(&mut reader).map_err(ext_err)?;
        let content = reader.read_slice(field.length).map_err(ext_err)?;
        if let Tag::ContextSpecific {
            constructed: false,
            number,
        } = field.tag
        {
            if number == TagNumber::N4 {
                indirect = content.first().copied().unwrap_or(0) != 0;
            }
        }
    }
    Ok(indirect)
}

/// FreshestCRL shares the CRLDistributionPoints syntax; URI extraction
/// follows the same first-URI-per-point rule as the certificate extension.
fn parse_freshest_crl(value: &[u8]) -> Result<Vec<String>, CrlParseError> {
    let (_, points) = CRLDistributionPoints::from_der(value)
        .map_err(|e| CrlParseError::Extension(format!("FreshestCRL: {e}")))?;
    Ok(uris_from_distribution_points(&points))
}
