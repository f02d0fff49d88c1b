//! Code signing settings as they appear in app configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::configuration::{
    CodeSigningConfiguration, CODE_SIGNING_METADATA_ALGORITHM_KEY,
    CODE_SIGNING_METADATA_KEY_ID_KEY,
};
use crate::error::{CodeSigningError, CodeSigningResult};

/// Code signing settings.
///
/// Code signing is disabled when no certificate is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSigningSettings {
    /// Embedded PEM certificate (trust anchor).
    #[serde(default)]
    pub code_signing_certificate: Option<String>,

    /// Expected `keyid` and `alg`.
    #[serde(default)]
    pub code_signing_metadata: HashMap<String, String>,

    /// Whether manifest responses carry the leaf and intermediate certificates.
    #[serde(default)]
    pub code_signing_include_manifest_response_certificate_chain: bool,

    /// Whether to accept responses without a signature (dev only).
    #[serde(default)]
    pub code_signing_allow_unsigned_manifests: bool,
}

impl CodeSigningSettings {
    /// Parse settings from a JSON object.
    pub fn from_json(json: &str) -> CodeSigningResult<Self> {
        serde_json::from_str(json).map_err(|e| CodeSigningError::Config {
            message: format!("invalid code signing settings: {e}"),
        })
    }

    /// Create settings from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `OTA_CODE_SIGNING_CERTIFICATE` | Path to the embedded PEM certificate |
    /// | `OTA_CODE_SIGNING_KEY_ID` | Expected key id |
    /// | `OTA_CODE_SIGNING_ALG` | Expected algorithm |
    /// | `OTA_CODE_SIGNING_INCLUDE_CERTIFICATE_CHAIN` | Responses carry a certificate chain |
    /// | `OTA_CODE_SIGNING_ALLOW_UNSIGNED` | Allow unsigned manifests (dev only) |
    pub fn from_env() -> CodeSigningResult<Self> {
        let code_signing_certificate = match std::env::var("OTA_CODE_SIGNING_CERTIFICATE") {
            Ok(path) => Some(std::fs::read_to_string(&path).map_err(|e| {
                CodeSigningError::Config {
                    message: format!("failed to read certificate {path}: {e}"),
                }
            })?),
            Err(_) => None,
        };

        let mut code_signing_metadata = HashMap::new();
        if let Ok(key_id) = std::env::var("OTA_CODE_SIGNING_KEY_ID") {
            code_signing_metadata.insert(CODE_SIGNING_METADATA_KEY_ID_KEY.to_string(), key_id);
        }
        if let Ok(alg) = std::env::var("OTA_CODE_SIGNING_ALG") {
            code_signing_metadata.insert(CODE_SIGNING_METADATA_ALGORITHM_KEY.to_string(), alg);
        }

        Ok(Self {
            code_signing_certificate,
            code_signing_metadata,
            code_signing_include_manifest_response_certificate_chain: env_flag(
                "OTA_CODE_SIGNING_INCLUDE_CERTIFICATE_CHAIN",
            ),
            code_signing_allow_unsigned_manifests: env_flag("OTA_CODE_SIGNING_ALLOW_UNSIGNED"),
        })
    }

    /// Set the embedded certificate.
    pub fn with_certificate(mut self, pem: impl Into<String>) -> Self {
        self.code_signing_certificate = Some(pem.into());
        self
    }

    /// Set the expected key id.
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.code_signing_metadata
            .insert(CODE_SIGNING_METADATA_KEY_ID_KEY.to_string(), key_id.into());
        self
    }

    /// Set the expected algorithm.
    pub fn with_algorithm(mut self, alg: impl Into<String>) -> Self {
        self.code_signing_metadata
            .insert(CODE_SIGNING_METADATA_ALGORITHM_KEY.to_string(), alg.into());
        self
    }

    pub fn with_include_certificate_chain(mut self, include: bool) -> Self {
        self.code_signing_include_manifest_response_certificate_chain = include;
        self
    }

    /// Allow unsigned manifests.
    pub fn with_allow_unsigned(mut self, allow: bool) -> Self {
        self.code_signing_allow_unsigned_manifests = allow;
        self
    }

    /// Build the configuration, or `None` when code signing is disabled.
    pub fn into_configuration(self) -> CodeSigningResult<Option<CodeSigningConfiguration>> {
        let Some(certificate) = self.code_signing_certificate else {
            return Ok(None);
        };
        CodeSigningConfiguration::new(
            certificate,
            &self.code_signing_metadata,
            self.code_signing_include_manifest_response_certificate_chain,
            self.code_signing_allow_unsigned_manifests,
        )
        .map(Some)
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
