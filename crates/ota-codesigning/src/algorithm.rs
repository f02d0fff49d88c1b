//! Supported code signing algorithms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodeSigningError, CodeSigningResult};

/// Signing algorithm, as carried in the `alg` header field and in metadata.
///
/// Received values that are not listed here are rejected rather than mapped
/// to a default, so adding a variant never changes how old values parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 over a SHA-256 digest.
    #[default]
    #[serde(rename = "rsa-v1_5-sha256")]
    RsaSha256,
}

impl SigningAlgorithm {
    /// Wire string for this algorithm.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-v1_5-sha256",
        }
    }

    /// Parse an optional wire string. `None` selects the default algorithm.
    pub fn parse(value: Option<&str>) -> CodeSigningResult<Self> {
        match value {
            None => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = CodeSigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsa-v1_5-sha256" => Ok(Self::RsaSha256),
            other => Err(CodeSigningError::AlgorithmParse {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
