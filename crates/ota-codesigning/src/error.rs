//! Error types for code signing verification.

use crate::structured_header::HeaderParseError;

/// Code signing errors.
///
/// Every variant is fatal: the caller must treat the update as untrusted.
/// A signature that was checked and simply did not match is not an error,
/// see [`crate::ValidationResult::Invalid`].
#[derive(Debug, thiserror::Error)]
pub enum CodeSigningError {
    /// Algorithm token in a header or metadata field is not supported.
    #[error("invalid code signing algorithm: {value}")]
    AlgorithmParse { value: String },

    /// No signature header and unsigned manifests are not allowed.
    #[error("no signature header specified")]
    SignatureHeaderMissing,

    /// Signature header is not a structured field dictionary.
    #[error("signature header is not a valid structured field dictionary: {message}")]
    SignatureHeaderStructuredFieldParse { message: String },

    /// Dictionary parsed but has no `sig` member.
    #[error("structured field sig not found in signature header")]
    SignatureMissing,

    /// Header key id does not match the configured key id.
    #[error("key with keyid={header} from signature not found in client configuration (expected {expected})")]
    KeyIdMismatch { header: String, expected: String },

    /// A PEM block could not be decoded into a certificate.
    #[error("invalid certificate: {message}")]
    CertificateParse { message: String },

    /// The chain does not start with a usable code signing certificate.
    #[error("no code signing certificate found: {reason}")]
    NoCodeSigningCertificate { reason: String },

    /// The code signing certificate has no usable RSA public key.
    #[error("code signing certificate has no usable public key: {message}")]
    CertificateMissingPublicKey { message: String },

    /// Issuer linkage, CA, self-signature or validity failure in a chain.
    #[error("certificate chain is not valid: {reason}")]
    CertificateChain { reason: String },

    /// Project information extension present but malformed.
    #[error("invalid project information in certificate: {value}")]
    InvalidProjectInformation { value: String },

    /// Signature value is not valid base64.
    #[error("signature in header is not valid base64: {message}")]
    SignatureEncoding { message: String },

    /// Verification backend failed for a reason other than a mismatch.
    #[error("crypto backend error: {message}")]
    CryptoBackend { message: String },

    /// Settings could not be loaded.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl CodeSigningError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Configuration issues
            Self::Config { .. } => 2,
            Self::AlgorithmParse { .. } => 2,

            // Response could not be checked
            Self::SignatureHeaderMissing => 3,
            Self::SignatureHeaderStructuredFieldParse { .. } => 3,
            Self::SignatureMissing => 3,
            Self::SignatureEncoding { .. } => 3,

            // Trust material rejected
            Self::KeyIdMismatch { .. } => 4,
            Self::CertificateParse { .. } => 4,
            Self::NoCodeSigningCertificate { .. } => 4,
            Self::CertificateMissingPublicKey { .. } => 4,
            Self::CertificateChain { .. } => 4,
            Self::InvalidProjectInformation { .. } => 4,

            // Backend
            Self::CryptoBackend { .. } => 5,
        }
    }

    pub(crate) fn chain(reason: impl Into<String>) -> Self {
        Self::CertificateChain {
            reason: reason.into(),
        }
    }

    pub(crate) fn certificate_parse(message: impl Into<String>) -> Self {
        Self::CertificateParse {
            message: message.into(),
        }
    }
}

impl From<HeaderParseError> for CodeSigningError {
    fn from(err: HeaderParseError) -> Self {
        Self::SignatureHeaderStructuredFieldParse {
            message: err.to_string(),
        }
    }
}

/// Result type for code signing operations.
pub type CodeSigningResult<T> = Result<T, CodeSigningError>;
