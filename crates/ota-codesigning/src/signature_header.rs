//! Typed view of the signature response header.

use crate::algorithm::SigningAlgorithm;
use crate::error::{CodeSigningError, CodeSigningResult};
use crate::structured_header::parse_dictionary;

/// Dictionary key holding the base64 signature.
pub const SIGNATURE_FIELD: &str = "sig";

/// Dictionary key holding the signing key id.
pub const KEY_ID_FIELD: &str = "keyid";

/// Dictionary key holding the algorithm.
pub const ALGORITHM_FIELD: &str = "alg";

/// Key id assumed when the header does not name one.
pub const DEFAULT_KEY_ID: &str = "root";

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaderInfo {
    signature: String,
    key_id: String,
    algorithm: SigningAlgorithm,
}

impl SignatureHeaderInfo {
    /// Parse a signature header value.
    ///
    /// `sig` is required. `keyid` defaults to [`DEFAULT_KEY_ID`] and `alg`
    /// to [`SigningAlgorithm::RsaSha256`]; an `alg` that is present but
    /// unknown is an error. Other members are ignored.
    pub fn parse(header_value: &str) -> CodeSigningResult<Self> {
        let mut dictionary = parse_dictionary(header_value, true)?;

        let signature = dictionary
            .remove(SIGNATURE_FIELD)
            .ok_or(CodeSigningError::SignatureMissing)?;
        let key_id = dictionary
            .remove(KEY_ID_FIELD)
            .unwrap_or_else(|| DEFAULT_KEY_ID.to_string());
        let algorithm = SigningAlgorithm::parse(dictionary.get(ALGORITHM_FIELD).map(String::as_str))?;

        Ok(Self {
            signature,
            key_id,
            algorithm,
        })
    }

    /// Base64 signature, not yet decoded.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }
}
