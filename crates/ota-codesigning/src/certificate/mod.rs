//! X.509 certificates used for code signing.
//!
//! A [`Certificate`] is decoded once from PEM into the handful of facts the
//! chain rules need (names, validity, key usage, basic constraints, project
//! information, signed bytes). Nothing borrows from the DER afterwards, so
//! certificates can be moved freely into a [`CertificateChain`].

mod chain;
mod pem;
mod project_information;

pub use chain::{CertificateChain, CodeSigningCertificate};
pub use pem::{
    pem_certificates, separate_certificate_chain, PemCertificates, BEGIN_CERTIFICATE,
    END_CERTIFICATE,
};
pub use project_information::{ProjectInformation, PROJECT_INFORMATION_OID};

use chrono::{DateTime, Utc};
use rsa::pkcs1v15;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::RsaPublicKey;
use sha2::{Sha256, Sha384, Sha512};
use signature::Verifier as _;
use x509_parser::error::X509Error;

use crate::error::{CodeSigningError, CodeSigningResult};

const OID_SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const OID_SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
const OID_SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";

/// Key usage and constraint bits relevant to chain rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CertificateUsage {
    pub digital_signature: bool,
    pub key_cert_sign: bool,
    pub code_signing: bool,
    pub ca: bool,
    pub path_len_constraint: Option<u32>,
}

/// A decoded X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    pem: String,
    der: Vec<u8>,
    subject: String,
    issuer: String,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    usage: CertificateUsage,
    project_information: Option<ProjectInformation>,
    spki_der: Vec<u8>,
    tbs_der: Vec<u8>,
    signature_oid: String,
    signature: Vec<u8>,
}

impl Certificate {
    /// Decode a single PEM certificate block.
    pub fn from_pem(pem: &str) -> CodeSigningResult<Self> {
        let (_, block) = x509_parser::pem::parse_x509_pem(pem.trim().as_bytes())
            .map_err(|e| CodeSigningError::certificate_parse(format!("invalid PEM: {e}")))?;
        if block.label != "CERTIFICATE" {
            return Err(CodeSigningError::certificate_parse(format!(
                "expected CERTIFICATE PEM block, found {}",
                block.label
            )));
        }
        Self::from_der(pem.to_string(), block.contents)
    }

    fn from_der(pem: String, der: Vec<u8>) -> CodeSigningResult<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| CodeSigningError::certificate_parse(format!("invalid DER: {e}")))?;

        let extension_error = |e: X509Error| {
            CodeSigningError::certificate_parse(format!("invalid extension: {e}"))
        };

        let mut usage = CertificateUsage::default();
        if let Some(key_usage) = cert.key_usage().map_err(extension_error)? {
            usage.digital_signature = key_usage.value.digital_signature();
            usage.key_cert_sign = key_usage.value.key_cert_sign();
        }
        if let Some(extended) = cert.extended_key_usage().map_err(extension_error)? {
            usage.code_signing = extended.value.code_signing;
        }
        if let Some(constraints) = cert.basic_constraints().map_err(extension_error)? {
            usage.ca = constraints.value.ca;
            usage.path_len_constraint = constraints.value.path_len_constraint;
        }

        let project_information = cert
            .extensions()
            .iter()
            .find(|ext| ext.oid.to_id_string() == PROJECT_INFORMATION_OID)
            .map(|ext| ProjectInformation::from_extension_value(ext.value))
            .transpose()?;

        let validity = cert.validity();
        let not_before = timestamp(validity.not_before.timestamp())?;
        let not_after = timestamp(validity.not_after.timestamp())?;
        let subject = cert.subject().to_string();
        let issuer = cert.issuer().to_string();
        let subject_raw = cert.subject().as_raw().to_vec();
        let issuer_raw = cert.issuer().as_raw().to_vec();
        let spki_der = cert.tbs_certificate.subject_pki.raw.to_vec();
        let tbs_der = cert.tbs_certificate.as_ref().to_vec();
        let signature_oid = cert.signature_algorithm.algorithm.to_id_string();
        let signature = cert.signature_value.data.to_vec();
        drop(cert);

        Ok(Self {
            pem,
            der,
            subject,
            issuer,
            subject_raw,
            issuer_raw,
            not_before,
            not_after,
            usage,
            project_information,
            spki_der,
            tbs_der,
            signature_oid,
            signature,
        })
    }

    /// PEM text the certificate was loaded from.
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn usage(&self) -> CertificateUsage {
        self.usage
    }

    pub fn project_information(&self) -> Option<&ProjectInformation> {
        self.project_information.as_ref()
    }

    /// Whether `now` falls within the validity period (inclusive).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Subject name equals issuer name.
    pub fn is_self_issued(&self) -> bool {
        self.subject_raw == self.issuer_raw
    }

    /// RSA public key from the subject public key info.
    pub fn public_key(&self) -> CodeSigningResult<RsaPublicKey> {
        RsaPublicKey::from_public_key_der(&self.spki_der).map_err(|e| {
            CodeSigningError::CertificateMissingPublicKey {
                message: format!("{}: {e}", self.subject),
            }
        })
    }

    /// Check that `issuer` issued and signed this certificate.
    pub fn verify_issued_by(&self, issuer: &Certificate) -> CodeSigningResult<()> {
        if self.issuer_raw != issuer.subject_raw {
            return Err(CodeSigningError::chain(format!(
                "certificate {} was issued by {}, not {}",
                self.subject, self.issuer, issuer.subject
            )));
        }

        let key = issuer.public_key().map_err(|_| {
            CodeSigningError::chain(format!("issuer {} has no RSA public key", issuer.subject))
        })?;
        let signature = pkcs1v15::Signature::try_from(self.signature.as_slice())
            .map_err(|e| CodeSigningError::chain(format!("bad certificate signature: {e}")))?;

        let verified = match self.signature_oid.as_str() {
            OID_SHA256_WITH_RSA => {
                pkcs1v15::VerifyingKey::<Sha256>::new(key).verify(&self.tbs_der, &signature)
            }
            OID_SHA384_WITH_RSA => {
                pkcs1v15::VerifyingKey::<Sha384>::new(key).verify(&self.tbs_der, &signature)
            }
            OID_SHA512_WITH_RSA => {
                pkcs1v15::VerifyingKey::<Sha512>::new(key).verify(&self.tbs_der, &signature)
            }
            other => {
                return Err(CodeSigningError::chain(format!(
                    "unsupported certificate signature algorithm {other} on {}",
                    self.subject
                )))
            }
        };

        verified.map_err(|_| {
            CodeSigningError::chain(format!(
                "signature on {} does not verify with the key of {}",
                self.subject, issuer.subject
            ))
        })
    }
}

fn timestamp(secs: i64) -> CodeSigningResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| CodeSigningError::certificate_parse(format!("validity out of range: {secs}")))
}

/// Leaf capability check: usable now for signing code.
///
/// Requires the `digitalSignature` key usage and the `codeSigning` extended
/// key usage.
pub fn is_code_signing_certificate(certificate: &Certificate, now: DateTime<Utc>) -> bool {
    let usage = certificate.usage();
    certificate.is_valid_at(now) && usage.digital_signature && usage.code_signing
}

/// Issuer capability check: usable now for signing certificates.
pub fn is_ca_certificate(certificate: &Certificate, now: DateTime<Utc>) -> bool {
    let usage = certificate.usage();
    certificate.is_valid_at(now) && usage.ca && usage.key_cert_sign
}
