//! Certificate chain assembly and validation.
//!
//! Chains are ordered leaf first. The first certificate must be a code
//! signing certificate; the last is the trust anchor embedded in the app.
//! With more than one certificate every link is checked:
//!
//! - the anchor is a CA and signed itself
//! - each certificate is issued and signed by the next one, which is a CA
//! - `pathLenConstraint` of each issuer is honoured
//! - an issuer restricted to a project only issues for that same project

use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;

use super::{is_ca_certificate, is_code_signing_certificate, Certificate, ProjectInformation};
use crate::error::{CodeSigningError, CodeSigningResult};

/// Ordered, non-empty sequence of certificates, leaf first.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certificates: Vec<Certificate>,
}

/// The leaf that signed the payload, with its key and project identity.
#[derive(Debug, Clone)]
pub struct CodeSigningCertificate<'a> {
    pub certificate: &'a Certificate,
    pub public_key: RsaPublicKey,
    pub project_information: Option<ProjectInformation>,
}

impl CertificateChain {
    /// Decode each PEM certificate, preserving order.
    pub fn build<I, S>(pem_certificates: I) -> CodeSigningResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let certificates = pem_certificates
            .into_iter()
            .map(|pem| Certificate::from_pem(pem.as_ref()))
            .collect::<CodeSigningResult<Vec<_>>>()?;

        if certificates.is_empty() {
            return Err(CodeSigningError::certificate_parse(
                "no certificates provided",
            ));
        }

        Ok(Self { certificates })
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Validate the chain now and return its code signing leaf.
    pub fn code_signing_certificate(&self) -> CodeSigningResult<CodeSigningCertificate<'_>> {
        self.code_signing_certificate_at(Utc::now())
    }

    /// Validate the chain at `now` and return its code signing leaf.
    pub fn code_signing_certificate_at(
        &self,
        now: DateTime<Utc>,
    ) -> CodeSigningResult<CodeSigningCertificate<'_>> {
        let leaf = &self.certificates[0];
        if !is_code_signing_certificate(leaf, now) {
            return Err(CodeSigningError::NoCodeSigningCertificate {
                reason: format!(
                    "{} must be within its validity period and have digitalSignature key usage and codeSigning extended key usage",
                    leaf.subject()
                ),
            });
        }

        if self.certificates.len() > 1 {
            self.validate_links(now)?;
        }

        tracing::debug!(
            subject = %leaf.subject(),
            chain_length = self.certificates.len(),
            "resolved code signing certificate"
        );

        Ok(CodeSigningCertificate {
            certificate: leaf,
            public_key: leaf.public_key()?,
            project_information: leaf.project_information().cloned(),
        })
    }

    fn validate_links(&self, now: DateTime<Utc>) -> CodeSigningResult<()> {
        let anchor = &self.certificates[self.certificates.len() - 1];
        if !is_ca_certificate(anchor, now) {
            return Err(CodeSigningError::chain(format!(
                "root certificate {} is not a valid CA certificate",
                anchor.subject()
            )));
        }
        anchor.verify_issued_by(anchor)?;

        for (index, pair) in self.certificates.windows(2).enumerate() {
            let (subject, issuer) = (&pair[0], &pair[1]);
            if !is_ca_certificate(issuer, now) {
                return Err(CodeSigningError::chain(format!(
                    "issuer {} is not a valid CA certificate",
                    issuer.subject()
                )));
            }
            subject.verify_issued_by(issuer)?;

            // CA certificates strictly between the leaf and this issuer.
            // Self-issued certificates do not count towards the limit.
            let intermediates_below = self.certificates[1..=index]
                .iter()
                .filter(|certificate| !certificate.is_self_issued())
                .count();
            if let Some(limit) = issuer.usage().path_len_constraint {
                if intermediates_below > limit as usize {
                    return Err(CodeSigningError::chain(format!(
                        "path length constraint of {} exceeded",
                        issuer.subject()
                    )));
                }
            }

            if let Some(issuer_project) = issuer.project_information() {
                if subject.project_information() != Some(issuer_project) {
                    return Err(CodeSigningError::chain(format!(
                        "project information of {} must match that of its issuer {}",
                        subject.subject(),
                        issuer.subject()
                    )));
                }
            }
        }

        Ok(())
    }
}
