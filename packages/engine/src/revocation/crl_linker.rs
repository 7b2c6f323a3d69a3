//! CRL-based trust linker with delta-CRL handling

use std::sync::Arc;
use std::time::SystemTime;

use crate::cert::Certificate;
use crate::crl::{CrlInfo, CrlRepository};
use crate::crypto::SignatureVerifier;
use crate::error::{TrustError, TrustReason};
use crate::linker::{LinkVerdict, TrustLinker};
use crate::policy::AlgorithmPolicy;
use crate::revocation::RevocationData;

/// Decides revocation for a (child, issuer) pair from the CRLs named in the
/// child's CRLDistributionPoints, following FreshestCRL pointers into delta
/// CRLs.
///
/// Everything the linker cannot establish (no distribution point, fetch
/// failure, stale CRL, unverifiable signature, indirect CRL) is an abstain so
/// the next linker may still decide. Two things are definitive: a listed
/// serial with a revocation date at or before the validation time, and a CRL
/// signed with an algorithm the policy rejects.
pub struct CrlTrustLinker {
    repository: Arc<CrlRepository>,
    policy: AlgorithmPolicy,
    verifier: Arc<dyn SignatureVerifier>,
}

impl CrlTrustLinker {
    pub fn new(
        repository: Arc<CrlRepository>,
        policy: AlgorithmPolicy,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            repository,
            policy,
            verifier,
        }
    }

    pub fn repository(&self) -> &Arc<CrlRepository> {
        &self.repository
    }

    fn process_crl(
        &self,
        uri: &str,
        child: &Certificate,
        issuer: &Certificate,
        validation_time: SystemTime,
        evidence: &mut RevocationData,
        base_number: Option<&[u8]>,
    ) -> Result<LinkVerdict, TrustError> {
        let Some(crl) = self.repository.find(uri, issuer, validation_time)? else {
            return Ok(LinkVerdict::Abstain);
        };

        if let Some(verdict) = self.check_integrity(&crl, uri, issuer, validation_time) {
            return Ok(verdict);
        }

        if crl.is_indirect() {
            tracing::warn!("indirect CRL at {} is not supported, abstaining", uri);
            return Ok(LinkVerdict::Abstain);
        }

        if let Some(base_number) = base_number {
            match crl.delta_base() {
                Some(indicator) if indicator == base_number => {}
                _ => {
                    tracing::warn!(
                        "delta CRL at {} does not extend the base CRL it was reached from",
                        uri
                    );
                    return Ok(LinkVerdict::Abstain);
                }
            }
        }

        evidence.record_crl(crl.as_der());

        let revoked = crl
            .revoked_entry(child.serial())
            .filter(|entry| entry.revocation_date <= validation_time)
            .is_some();

        if crl.is_delta() {
            // The base CRL decides for serials a delta does not list.
            if !revoked {
                return Ok(LinkVerdict::Abstain);
            }
        } else if let Some(crl_number) = crl.crl_number() {
            for delta_uri in crl.freshest_uris() {
                let verdict = self.process_crl(
                    delta_uri,
                    child,
                    issuer,
                    validation_time,
                    evidence,
                    Some(crl_number),
                )?;
                if !verdict.is_abstain() {
                    return Ok(verdict);
                }
            }
        }

        if revoked {
            tracing::info!(
                "certificate serial 0x{} listed as revoked by CRL from {}",
                hex::encode(child.serial()),
                uri
            );
            Ok(LinkVerdict::untrusted(
                TrustReason::InvalidRevocationStatus,
                format!(
                    "certificate 0x{} ({}) is revoked",
                    hex::encode(child.serial()),
                    child.subject()
                ),
            ))
        } else {
            Ok(LinkVerdict::Trusted)
        }
    }

    /// Integrity gate over a CRL before its contents are believed. Returns
    /// `Some(verdict)` to stop processing this CRL: abstain for anything
    /// unverifiable, untrusted for a weak signature algorithm.
    fn check_integrity(
        &self,
        crl: &CrlInfo,
        uri: &str,
        issuer: &Certificate,
        validation_time: SystemTime,
    ) -> Option<LinkVerdict> {
        if crl.issuer().as_raw() != issuer.subject().as_raw() {
            tracing::warn!(
                "CRL from {} was issued by {} rather than {}",
                uri,
                crl.issuer(),
                issuer.subject()
            );
            return Some(LinkVerdict::Abstain);
        }

        if !crl.covers(validation_time) {
            tracing::warn!("CRL from {} is stale at the validation time", uri);
            return Some(LinkVerdict::Abstain);
        }

        let crl_sign = issuer.key_usage().map(|usage| usage.crl_sign);
        if crl_sign != Some(true) {
            tracing::warn!(
                "issuer {} lacks the cRLSign key usage bit",
                issuer.subject()
            );
            return Some(LinkVerdict::Abstain);
        }

        // Weak algorithms are fatal, not transient, and must be rejected
        // before any verification is attempted with them.
        if !self.policy.permits(crl.signature_algorithm()) {
            return Some(LinkVerdict::untrusted(
                TrustReason::InvalidAlgorithm,
                format!(
                    "CRL from {} is signed with rejected algorithm {}",
                    uri,
                    crl.signature_algorithm()
                ),
            ));
        }

        if let Err(e) = self.verifier.verify(
            crl.signature_algorithm(),
            issuer.public_key(),
            crl.tbs_der(),
            crl.signature(),
        ) {
            tracing::warn!(
                "CRL signature from {} does not verify under {}: {}",
                uri,
                issuer.subject(),
                e
            );
            return Some(LinkVerdict::Abstain);
        }

        None
    }
}

impl TrustLinker for CrlTrustLinker {
    fn name(&self) -> &'static str {
        "crl"
    }

    fn has_trust_link(
        &self,
        child: &Certificate,
        issuer: &Certificate,
        validation_time: SystemTime,
        evidence: &mut RevocationData,
    ) -> Result<LinkVerdict, TrustError> {
        let Some(uri) = child.crl_uris().first() else {
            tracing::debug!(
                "no CRL distribution point on {}, abstaining",
                child.subject()
            );
            return Ok(LinkVerdict::Abstain);
        };
        self.process_crl(uri, child, issuer, validation_time, evidence, None)
    }
}
