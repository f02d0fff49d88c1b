//! Code signing configuration and manifest signature validation.
//!
//! # Validation Steps
//!
//! 1. No signature header: skip if unsigned manifests are allowed, else fail
//! 2. Parse the signature header
//! 3. Assemble the certificate chain (embedded certificate is always last)
//! 4. Resolve the code signing leaf and its public key
//! 5. Decode the base64 signature
//! 6. Verify the signature over the body
//! 7. Attach the leaf's project information to the result

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::algorithm::SigningAlgorithm;
use crate::certificate::{pem_certificates, CertificateChain, ProjectInformation};
use crate::error::{CodeSigningError, CodeSigningResult};
use crate::signature_header::{SignatureHeaderInfo, DEFAULT_KEY_ID};
use crate::structured_header::quote_string;
use crate::verify::verify_signature;

/// Metadata key for the expected key id.
pub const CODE_SIGNING_METADATA_KEY_ID_KEY: &str = "keyid";

/// Metadata key for the expected algorithm.
pub const CODE_SIGNING_METADATA_ALGORITHM_KEY: &str = "alg";

/// Outcome of a signature check that could be carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Signature matches.
    Valid(Option<ProjectInformation>),
    /// Signature was checked and does not match.
    Invalid(Option<ProjectInformation>),
    /// No signature and unsigned manifests are allowed.
    Skipped,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Project information of the signing certificate, if any.
    pub fn project_information(&self) -> Option<&ProjectInformation> {
        match self {
            Self::Valid(info) | Self::Invalid(info) => info.as_ref(),
            Self::Skipped => None,
        }
    }
}

/// Trust material and policy for verifying signed manifests.
///
/// Immutable after construction; share it freely between threads. Each call
/// to [`validate_signature`](Self::validate_signature) builds its own chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSigningConfiguration {
    embedded_certificate: String,
    key_id_from_metadata: String,
    algorithm_from_metadata: SigningAlgorithm,
    include_manifest_response_certificate_chain: bool,
    allow_unsigned_manifests: bool,
}

impl CodeSigningConfiguration {
    /// Create a configuration from the embedded certificate and its metadata.
    ///
    /// `metadata` may carry `keyid` (default `"root"`) and `alg` (default
    /// `rsa-v1_5-sha256`). An unknown `alg` is rejected, as is a `keyid`
    /// with characters outside printable ASCII.
    pub fn new(
        embedded_certificate: impl Into<String>,
        metadata: &HashMap<String, String>,
        include_manifest_response_certificate_chain: bool,
        allow_unsigned_manifests: bool,
    ) -> CodeSigningResult<Self> {
        let key_id_from_metadata = metadata
            .get(CODE_SIGNING_METADATA_KEY_ID_KEY)
            .cloned()
            .unwrap_or_else(|| DEFAULT_KEY_ID.to_string());
        // The key id is sent back in an sf-string, which only holds printable ASCII.
        if !key_id_from_metadata.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            return Err(CodeSigningError::Config {
                message: format!(
                    "key id {key_id_from_metadata:?} must only contain printable ASCII characters"
                ),
            });
        }
        let algorithm_from_metadata = SigningAlgorithm::parse(
            metadata
                .get(CODE_SIGNING_METADATA_ALGORITHM_KEY)
                .map(String::as_str),
        )?;

        Ok(Self {
            embedded_certificate: embedded_certificate.into(),
            key_id_from_metadata,
            algorithm_from_metadata,
            include_manifest_response_certificate_chain,
            allow_unsigned_manifests,
        })
    }

    pub fn embedded_certificate(&self) -> &str {
        &self.embedded_certificate
    }

    pub fn key_id_from_metadata(&self) -> &str {
        &self.key_id_from_metadata
    }

    pub fn algorithm_from_metadata(&self) -> SigningAlgorithm {
        self.algorithm_from_metadata
    }

    pub fn include_manifest_response_certificate_chain(&self) -> bool {
        self.include_manifest_response_certificate_chain
    }

    pub fn allow_unsigned_manifests(&self) -> bool {
        self.allow_unsigned_manifests
    }

    /// Request header value telling the server which key and algorithm to
    /// sign with, e.g. `sig, keyid="root", alg="rsa-v1_5-sha256"`.
    pub fn create_accept_signature_header(&self) -> String {
        format!(
            "sig, keyid={}, alg={}",
            quote_string(&self.key_id_from_metadata),
            quote_string(self.algorithm_from_metadata.as_str())
        )
    }

    /// Check the signature header of a manifest response against `body`.
    ///
    /// `manifest_response_certificate_chain` is the PEM bundle sent with the
    /// response; it is only consulted when the configuration includes
    /// manifest response certificate chains.
    pub fn validate_signature(
        &self,
        signature: Option<&str>,
        body: &[u8],
        manifest_response_certificate_chain: Option<&str>,
    ) -> CodeSigningResult<ValidationResult> {
        let Some(signature) = signature else {
            if self.allow_unsigned_manifests {
                tracing::debug!("no signature header, unsigned manifests allowed");
                return Ok(ValidationResult::Skipped);
            }
            return Err(CodeSigningError::SignatureHeaderMissing);
        };

        let header = SignatureHeaderInfo::parse(signature)?;

        let (chain, algorithm) = if self.include_manifest_response_certificate_chain {
            let pems: Vec<&str> = pem_certificates(manifest_response_certificate_chain.unwrap_or(""))
                .chain(std::iter::once(self.embedded_certificate.as_str()))
                .collect();
            tracing::debug!(
                certificates = pems.len(),
                "using manifest response certificate chain"
            );
            (CertificateChain::build(pems)?, header.algorithm())
        } else {
            if header.key_id() != self.key_id_from_metadata {
                return Err(CodeSigningError::KeyIdMismatch {
                    header: header.key_id().to_string(),
                    expected: self.key_id_from_metadata.clone(),
                });
            }
            if header.algorithm() != self.algorithm_from_metadata {
                tracing::warn!(
                    header = %header.algorithm(),
                    configured = %self.algorithm_from_metadata,
                    "signature header algorithm differs from configured algorithm, using configured"
                );
            }
            (
                CertificateChain::build([self.embedded_certificate.as_str()])?,
                self.algorithm_from_metadata,
            )
        };

        let signing = chain.code_signing_certificate()?;

        let signature_bytes = BASE64.decode(header.signature().trim()).map_err(|e| {
            CodeSigningError::SignatureEncoding {
                message: e.to_string(),
            }
        })?;

        let valid = verify_signature(body, &signature_bytes, &signing.public_key, algorithm)?;
        let project_information = signing.project_information;

        if valid {
            tracing::info!(
                key_id = %header.key_id(),
                subject = %signing.certificate.subject(),
                "manifest signature verified"
            );
            Ok(ValidationResult::Valid(project_information))
        } else {
            tracing::warn!(
                key_id = %header.key_id(),
                subject = %signing.certificate.subject(),
                "manifest signature does not match"
            );
            Ok(ValidationResult::Invalid(project_information))
        }
    }
}
