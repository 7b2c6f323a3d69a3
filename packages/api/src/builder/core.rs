//! Validator builder implementation

use std::sync::Arc;

use veryfy_engine::{
    AlgorithmPolicy, Certificate, CertificateConstraint, ConfigError, CrlFetcher, CrlRepository,
    CrlTrustLinker, RevocationPolicy, RingVerifier, SignatureVerifier, TrustAnchorStore,
    TrustLinker, TrustValidator,
};

enum AnchorSource {
    Der(Vec<u8>),
    Pem(Vec<u8>),
    Parsed(Box<Certificate>),
}

/// Pipeline steps are kept as specs so linker order follows builder call
/// order exactly, including the position of the built-in CRL linker.
enum LinkerSpec {
    Custom(Box<dyn TrustLinker>),
    Crl { fetcher: Arc<dyn CrlFetcher> },
}

/// Fluent configuration for a [`TrustValidator`].
///
/// ```no_run
/// use std::sync::Arc;
/// use veryfy::{StaticCrlFetcher, Veryfy};
///
/// # fn main() -> Result<(), veryfy::ConfigError> {
/// # let root_der: &[u8] = &[];
/// let validator = Veryfy::validator()
///     .anchor_der(root_der)
///     .crl_checks(Arc::new(StaticCrlFetcher::new()))
///     .fail_closed()
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ValidatorBuilder {
    anchors: Vec<AnchorSource>,
    linkers: Vec<LinkerSpec>,
    constraints: Vec<Box<dyn CertificateConstraint>>,
    policy: AlgorithmPolicy,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    revocation_policy: RevocationPolicy,
    crl_cache_capacity: Option<usize>,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            anchors: Vec::new(),
            linkers: Vec::new(),
            constraints: Vec::new(),
            policy: AlgorithmPolicy::default(),
            verifier: None,
            revocation_policy: RevocationPolicy::default(),
            crl_cache_capacity: None,
        }
    }

    /// Add a DER-encoded trust anchor.
    pub fn anchor_der(mut self, der: &[u8]) -> Self {
        self.anchors.push(AnchorSource::Der(der.to_vec()));
        self
    }

    /// Add a PEM-encoded trust anchor.
    pub fn anchor_pem(mut self, pem_data: &[u8]) -> Self {
        self.anchors.push(AnchorSource::Pem(pem_data.to_vec()));
        self
    }

    /// Add an already-parsed trust anchor.
    pub fn anchor(mut self, certificate: Certificate) -> Self {
        self.anchors.push(AnchorSource::Parsed(Box::new(certificate)));
        self
    }

    /// Install CRL-based revocation checking at this position in the linker
    /// pipeline, fetching CRLs through `fetcher`.
    pub fn crl_checks(mut self, fetcher: Arc<dyn CrlFetcher>) -> Self {
        self.linkers.push(LinkerSpec::Crl { fetcher });
        self
    }

    /// Bound the CRL cache to `capacity` entries.
    pub fn crl_cache_capacity(mut self, capacity: usize) -> Self {
        self.crl_cache_capacity = Some(capacity);
        self
    }

    /// Append a custom trust linker (an OCSP client, a local revocation
    /// list) at this position in the pipeline.
    pub fn trust_linker(mut self, linker: Box<dyn TrustLinker>) -> Self {
        self.linkers.push(LinkerSpec::Custom(linker));
        self
    }

    /// Append an acceptance predicate over the leaf certificate.
    pub fn constraint(mut self, constraint: Box<dyn CertificateConstraint>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Replace the default signature-algorithm policy.
    pub fn algorithm_policy(mut self, policy: AlgorithmPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the default `ring` verification backend.
    pub fn signature_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Reject a pair when every linker abstains (the default).
    pub fn fail_closed(mut self) -> Self {
        self.revocation_policy = RevocationPolicy::FailClosed;
        self
    }

    /// Accept a pair when every linker abstains.
    pub fn fail_open(mut self) -> Self {
        self.revocation_policy = RevocationPolicy::FailOpen;
        self
    }

    /// Resolve the configuration into a validator. All setup failures - no
    /// anchors, unparseable anchor material - surface here, never during
    /// validation.
    pub fn build(self) -> Result<TrustValidator, ConfigError> {
        let mut store = TrustAnchorStore::new();
        for source in self.anchors {
            let result = match source {
                AnchorSource::Der(der) => store.add_der(&der),
                AnchorSource::Pem(pem_data) => store.add_pem(&pem_data),
                AnchorSource::Parsed(certificate) => {
                    store.add(*certificate);
                    Ok(())
                }
            };
            result.map_err(|e| ConfigError::InvalidAnchor(e.to_string()))?;
        }

        let verifier: Arc<dyn SignatureVerifier> = self
            .verifier
            .unwrap_or_else(|| Arc::new(RingVerifier::new()));

        let anchor_count = store.len();
        let mut validator = TrustValidator::with_verifier(store, verifier.clone())?;
        validator.set_algorithm_policy(self.policy.clone());
        validator.set_revocation_policy(self.revocation_policy);

        for spec in self.linkers {
            match spec {
                LinkerSpec::Custom(linker) => validator.add_trust_linker(linker),
                LinkerSpec::Crl { fetcher } => {
                    let repository = match self.crl_cache_capacity {
                        Some(capacity) => CrlRepository::with_capacity(fetcher, capacity),
                        None => CrlRepository::new(fetcher),
                    };
                    validator.add_trust_linker(Box::new(CrlTrustLinker::new(
                        Arc::new(repository),
                        self.policy.clone(),
                        verifier.clone(),
                    )));
                }
            }
        }

        for constraint in self.constraints {
            validator.add_certificate_constraint(constraint);
        }

        tracing::debug!("trust validator configured with {} anchors", anchor_count);
        Ok(validator)
    }
}
