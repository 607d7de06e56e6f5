//! TLS server trust evaluation with certificate or public-key pinning.
//!
//! # Design
//! Standard chain validation (issuer, expiry, hostname) is never
//! re-implemented here. `TrustValidator::evaluate` takes the verdict of the
//! platform or library evaluator and adds the pinning step on the leaf
//! certificate. For Rust transports, `PinnedServerCertVerifier` wires the
//! same step behind rustls' webpki verifier.
//!
//! Every extraction failure (empty chain, unparseable leaf) rejects.

use std::collections::BTreeSet;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::{VerifierBuilderError, WebPkiServerVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, RootCertStore, SignatureScheme};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Pinning mode of a trust validator. Exactly one mode is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PinningConfig {
    /// Accept whatever passes standard trust evaluation.
    #[default]
    None,
    /// DER encodings of the accepted leaf certificates.
    CertificateFiles(BTreeSet<Vec<u8>>),
    /// Base64 SHA-256 digests of accepted SubjectPublicKeyInfo structures.
    PublicKeyHashes(BTreeSet<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustDecision {
    Accept,
    Reject,
}

impl TrustDecision {
    pub fn is_accept(self) -> bool {
        self == TrustDecision::Accept
    }
}

/// Evaluates presented certificate chains against a fixed pinning mode.
#[derive(Debug, Clone, Default)]
pub struct TrustValidator {
    config: PinningConfig,
}

impl TrustValidator {
    pub fn new(config: PinningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PinningConfig {
        &self.config
    }

    /// Accepts only when standard trust evaluation passed and the leaf
    /// (first certificate of `chain`) satisfies the pinning mode.
    pub fn evaluate(&self, chain: &[CertificateDer<'_>], system_trusted: bool) -> TrustDecision {
        if !system_trusted {
            tracing::debug!("standard trust evaluation failed; rejecting");
            return TrustDecision::Reject;
        }
        if self.leaf_is_pinned(chain) {
            TrustDecision::Accept
        } else {
            TrustDecision::Reject
        }
    }

    fn leaf_is_pinned(&self, chain: &[CertificateDer<'_>]) -> bool {
        let leaf = chain.first();
        match &self.config {
            PinningConfig::None => true,
            PinningConfig::CertificateFiles(pinned) => leaf.is_some_and(|leaf| {
                let der: &[u8] = leaf;
                pinned.contains(der)
            }),
            PinningConfig::PublicKeyHashes(hashes) => {
                match leaf.and_then(|leaf| spki_sha256_base64(leaf)) {
                    Some(hash) => hashes.contains(&hash),
                    None => {
                        tracing::warn!("could not extract the leaf public key; rejecting");
                        false
                    }
                }
            }
        }
    }
}

/// Base64 of the SHA-256 digest over the certificate's DER-encoded
/// SubjectPublicKeyInfo, i.e. the public key wrapped in its algorithm
/// identifier header. Returns `None` if `der` is not a certificate.
pub fn spki_sha256_base64(der: &[u8]) -> Option<String> {
    let (_, certificate) = x509_parser::parse_x509_certificate(der).ok()?;
    let digest = Sha256::digest(certificate.public_key().raw);
    Some(STANDARD.encode(digest))
}

#[derive(Debug, Error)]
pub enum TrustSetupError {
    #[error("could not build the webpki verifier: {0}")]
    Verifier(#[from] VerifierBuilderError),
}

/// rustls verifier: webpki chain validation followed by the pinning step.
#[derive(Debug)]
pub struct PinnedServerCertVerifier {
    webpki: Arc<WebPkiServerVerifier>,
    validator: TrustValidator,
}

impl PinnedServerCertVerifier {
    pub fn new(roots: RootCertStore, validator: TrustValidator) -> Result<Self, TrustSetupError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let webpki =
            WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider).build()?;
        Ok(Self { webpki, validator })
    }
}

impl ServerCertVerifier for PinnedServerCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verified = self
            .webpki
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
            .inspect_err(|err| tracing::debug!(%err, "webpki rejected the server chain"))?;

        match self
            .validator
            .evaluate(std::slice::from_ref(end_entity), true)
        {
            TrustDecision::Accept => Ok(verified),
            TrustDecision::Reject => Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            )),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.webpki.supported_verify_schemes()
    }
}
