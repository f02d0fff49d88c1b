//! Code signing verification for over-the-air update manifests.
//!
//! An update server signs each manifest body with a code signing key and
//! sends the signature in an RFC 8941 structured header:
//!
//! ```text
//! expo-signature: sig="<base64>", keyid="root", alg="rsa-v1_5-sha256"
//! ```
//!
//! The client checks that signature against a certificate embedded in the
//! app. Optionally the response also carries the leaf and intermediate
//! certificates, in which case the whole chain is validated up to the
//! embedded certificate.
//!
//! # Quick Start
//!
//! ```no_run
//! use ota_codesigning::{CodeSigningSettings, ValidationResult};
//!
//! # fn example(header: Option<&str>, body: &[u8]) -> Result<(), ota_codesigning::CodeSigningError> {
//! let Some(config) = CodeSigningSettings::from_env()?.into_configuration()? else {
//!     return Ok(()); // code signing disabled
//! };
//!
//! match config.validate_signature(header, body, None)? {
//!     ValidationResult::Valid(project) => println!("verified, project: {project:?}"),
//!     ValidationResult::Invalid(_) => println!("manifest signature does not match"),
//!     ValidationResult::Skipped => println!("unsigned manifest accepted"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `OTA_CODE_SIGNING_CERTIFICATE` | Path to the embedded PEM certificate |
//! | `OTA_CODE_SIGNING_KEY_ID` | Expected key id (default: `root`) |
//! | `OTA_CODE_SIGNING_ALG` | Expected algorithm (default: `rsa-v1_5-sha256`) |
//! | `OTA_CODE_SIGNING_INCLUDE_CERTIFICATE_CHAIN` | Responses carry a certificate chain |
//! | `OTA_CODE_SIGNING_ALLOW_UNSIGNED` | Allow unsigned manifests (dev only) |

pub mod algorithm;
pub mod certificate;
pub mod configuration;
pub mod error;
pub mod settings;
pub mod signature_header;
pub mod structured_header;
pub mod verify;

// Re-export main types
pub use algorithm::SigningAlgorithm;
pub use certificate::{
    is_ca_certificate, is_code_signing_certificate, separate_certificate_chain, Certificate,
    CertificateChain, CodeSigningCertificate, ProjectInformation,
};
pub use configuration::{
    CodeSigningConfiguration, ValidationResult, CODE_SIGNING_METADATA_ALGORITHM_KEY,
    CODE_SIGNING_METADATA_KEY_ID_KEY,
};
pub use error::{CodeSigningError, CodeSigningResult};
pub use settings::CodeSigningSettings;
pub use signature_header::SignatureHeaderInfo;
pub use structured_header::{parse_dictionary, quote_string, HeaderParseError};
pub use verify::verify_signature;
