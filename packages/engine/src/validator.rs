//! Chain walker and trust validator

use std::sync::Arc;
use std::time::SystemTime;

use crate::anchors::TrustAnchorStore;
use crate::cert::{Certificate, CertificateChain};
use crate::constraint::CertificateConstraint;
use crate::crypto::{RingVerifier, SignatureVerifier};
use crate::error::{ConfigError, TrustError, TrustReason};
use crate::linker::{LinkVerdict, TrustLinker};
use crate::policy::AlgorithmPolicy;
use crate::revocation::RevocationData;

/// Outcome when every linker abstains for a (child, issuer) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationPolicy {
    /// Missing revocation evidence is a denial.
    #[default]
    FailClosed,
    /// Accept the pair, logging that it went revocation-unchecked.
    FailOpen,
}

/// Validates pre-ordered certificate chains against trust anchors.
///
/// The walker enforces validity windows, the algorithm policy, basic
/// constraints, chain signatures and anchor membership, then consults the
/// ordered trust-linker pipeline for revocation on every adjacent pair. The
/// first non-abstaining linker decides a pair; a definitive negative verdict
/// short-circuits the whole chain.
pub struct TrustValidator {
    anchors: TrustAnchorStore,
    verifier: Arc<dyn SignatureVerifier>,
    policy: AlgorithmPolicy,
    linkers: Vec<Box<dyn TrustLinker>>,
    constraints: Vec<Box<dyn CertificateConstraint>>,
    revocation_policy: RevocationPolicy,
}

impl TrustValidator {
    /// Validator over the given anchors with the `ring` verification
    /// backend. Fails at setup when no anchors are configured.
    pub fn new(anchors: TrustAnchorStore) -> Result<Self, ConfigError> {
        Self::with_verifier(anchors, Arc::new(RingVerifier::new()))
    }

    /// Validator with an explicit verification backend.
    pub fn with_verifier(
        anchors: TrustAnchorStore,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Self, ConfigError> {
        if anchors.is_empty() {
            return Err(ConfigError::NoTrustAnchors);
        }
        Ok(Self {
            anchors,
            verifier,
            policy: AlgorithmPolicy::default(),
            linkers: Vec::new(),
            constraints: Vec::new(),
            revocation_policy: RevocationPolicy::default(),
        })
    }

    /// Append a linker to the ordered revocation pipeline.
    pub fn add_trust_linker(&mut self, linker: Box<dyn TrustLinker>) {
        self.linkers.push(linker);
    }

    /// Append an acceptance predicate over the leaf certificate.
    pub fn add_certificate_constraint(&mut self, constraint: Box<dyn CertificateConstraint>) {
        self.constraints.push(constraint);
    }

    pub fn set_algorithm_policy(&mut self, policy: AlgorithmPolicy) {
        self.policy = policy;
    }

    pub fn set_revocation_policy(&mut self, policy: RevocationPolicy) {
        self.revocation_policy = policy;
    }

    pub fn revocation_policy(&self) -> RevocationPolicy {
        self.revocation_policy
    }

    /// Validate `chain` at the current time.
    pub fn is_trusted(&self, chain: &CertificateChain) -> Result<(), TrustError> {
        self.is_trusted_at(chain, SystemTime::now())
    }

    /// Validate `chain` at `validation_time`, discarding the evidence.
    pub fn is_trusted_at(
        &self,
        chain: &CertificateChain,
        validation_time: SystemTime,
    ) -> Result<(), TrustError> {
        let mut evidence = RevocationData::new();
        self.is_trusted_with(chain, validation_time, &mut evidence)
    }

    /// Validate `chain` at `validation_time`, collecting the revocation
    /// material consulted into `evidence`.
    pub fn is_trusted_with(
        &self,
        chain: &CertificateChain,
        validation_time: SystemTime,
        evidence: &mut RevocationData,
    ) -> Result<(), TrustError> {
        if chain.is_empty() {
            return Err(TrustError::untrusted(
                TrustReason::InvalidTrust,
                "empty certificate chain",
            ));
        }

        self.check_adjacency(chain)?;
        self.check_certificates(chain, validation_time)?;
        self.check_signatures(chain)?;
        self.check_anchor(chain)?;
        self.check_leaf_constraints(chain)?;
        self.check_revocation(chain, validation_time, evidence)?;

        if let Some(leaf) = chain.leaf() {
            tracing::info!("chain for {} validated successfully", leaf.subject());
        }
        Ok(())
    }

    fn check_adjacency(&self, chain: &CertificateChain) -> Result<(), TrustError> {
        for (child, issuer) in chain.pairs() {
            if child.issuer().as_raw() != issuer.subject().as_raw() {
                return Err(TrustError::untrusted(
                    TrustReason::InvalidTrust,
                    format!(
                        "chain broken: {} was not issued by {}",
                        child.subject(),
                        issuer.subject()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_certificates(
        &self,
        chain: &CertificateChain,
        validation_time: SystemTime,
    ) -> Result<(), TrustError> {
        for (index, cert) in chain.iter().enumerate() {
            if !cert.valid_at(validation_time) {
                return Err(TrustError::untrusted(
                    TrustReason::InvalidValidityInterval,
                    format!(
                        "{} is not valid at the validation time",
                        cert.subject()
                    ),
                ));
            }

            if !self.policy.permits(cert.signature_algorithm()) {
                return Err(TrustError::untrusted(
                    TrustReason::InvalidAlgorithm,
                    format!(
                        "{} is signed with rejected algorithm {}",
                        cert.subject(),
                        cert.signature_algorithm()
                    ),
                ));
            }

            // Every non-leaf certificate acts as a CA for the ones below it.
            if index > 0 {
                let constraints = cert.basic_constraints();
                if constraints.map(|bc| bc.ca) != Some(true) {
                    return Err(TrustError::untrusted(
                        TrustReason::InvalidTrust,
                        format!("{} is not a CA certificate", cert.subject()),
                    ));
                }
                let issued_intermediates = (index - 1) as u32;
                if let Some(path_len) = constraints.and_then(|bc| bc.path_len) {
                    if issued_intermediates > path_len {
                        return Err(TrustError::untrusted(
                            TrustReason::InvalidTrust,
                            format!(
                                "{} exceeds its path length constraint of {}",
                                cert.subject(),
                                path_len
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_signatures(&self, chain: &CertificateChain) -> Result<(), TrustError> {
        for (child, issuer) in chain.pairs() {
            self.verify_signed_by(child, issuer)?;
        }
        // The anchor candidate must be self-signed.
        if let Some(root) = chain.anchor_candidate() {
            self.verify_signed_by(root, root)?;
        }
        Ok(())
    }

    fn verify_signed_by(
        &self,
        child: &Certificate,
        issuer: &Certificate,
    ) -> Result<(), TrustError> {
        self.verifier
            .verify(
                child.signature_algorithm(),
                issuer.public_key(),
                child.tbs_der(),
                child.signature(),
            )
            .map_err(|e| {
                TrustError::untrusted(
                    TrustReason::InvalidSignature,
                    format!(
                        "signature on {} does not verify under {}: {}",
                        child.subject(),
                        issuer.subject(),
                        e
                    ),
                )
            })
    }

    fn check_anchor(&self, chain: &CertificateChain) -> Result<(), TrustError> {
        let root = chain.anchor_candidate().ok_or_else(|| {
            TrustError::untrusted(TrustReason::InvalidTrust, "empty certificate chain")
        })?;
        if !self.anchors.contains(root) {
            return Err(TrustError::untrusted(
                TrustReason::RootNotTrusted,
                format!("{} is not a configured trust anchor", root.subject()),
            ));
        }
        Ok(())
    }

    fn check_leaf_constraints(&self, chain: &CertificateChain) -> Result<(), TrustError> {
        let Some(leaf) = chain.leaf() else {
            return Ok(());
        };
        for constraint in &self.constraints {
            if let Err(violation) = constraint.check(leaf) {
                return Err(TrustError::untrusted(
                    TrustReason::InvalidKeyUsage,
                    format!("{}: {}", leaf.subject(), violation.detail),
                ));
            }
        }
        Ok(())
    }

    fn check_revocation(
        &self,
        chain: &CertificateChain,
        validation_time: SystemTime,
        evidence: &mut RevocationData,
    ) -> Result<(), TrustError> {
        // No configured linkers is the trivial all-abstain case and falls to
        // the revocation policy like any other undecided pair.
        for (child, issuer) in chain.pairs() {
            let mut decided = false;
            for linker in &self.linkers {
                match linker.has_trust_link(child, issuer, validation_time, evidence)? {
                    LinkVerdict::Trusted => {
                        tracing::debug!(
                            "linker {} established trust for {}",
                            linker.name(),
                            child.subject()
                        );
                        decided = true;
                        break;
                    }
                    LinkVerdict::Untrusted { reason, detail } => {
                        return Err(TrustError::untrusted(reason, detail));
                    }
                    LinkVerdict::Abstain => {
                        tracing::debug!(
                            "linker {} abstained for {}",
                            linker.name(),
                            child.subject()
                        );
                    }
                }
            }

            if !decided {
                match self.revocation_policy {
                    RevocationPolicy::FailClosed => {
                        return Err(TrustError::untrusted(
                            TrustReason::InvalidRevocationStatus,
                            format!(
                                "revocation status of {} could not be established",
                                child.subject()
                            ),
                        ));
                    }
                    RevocationPolicy::FailOpen => {
                        tracing::warn!(
                            "accepting {} without a revocation decision (fail-open policy)",
                            child.subject()
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
