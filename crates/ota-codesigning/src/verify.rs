//! Raw signature verification.
//!
//! A signature that does not match is an ordinary outcome (`Ok(false)`).
//! Only failures of the backend itself, such as a malformed key, are errors.

use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::algorithm::SigningAlgorithm;
use crate::error::{CodeSigningError, CodeSigningResult};

/// Verify `signature` over `payload` with `public_key`.
pub fn verify_signature(
    payload: &[u8],
    signature: &[u8],
    public_key: &RsaPublicKey,
    algorithm: SigningAlgorithm,
) -> CodeSigningResult<bool> {
    match algorithm {
        SigningAlgorithm::RsaSha256 => {
            let digest = Sha256::digest(payload);
            match public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature) {
                Ok(()) => Ok(true),
                Err(rsa::Error::Verification) => Ok(false),
                Err(e) => Err(CodeSigningError::CryptoBackend {
                    message: format!("rsa-v1_5-sha256 verification failed: {e}"),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    use super::*;
    use crate::certificate::Certificate;

    const CERT: &str = include_str!("../tests/fixtures/selfsigned.pem");
    const OTHER_CERT: &str = include_str!("../tests/fixtures/noproject.pem");
    const MANIFEST: &[u8] = include_bytes!("../tests/fixtures/manifest.json");
    const SIGNATURE: &str = include_str!("../tests/fixtures/selfsigned.sig");

    fn key(pem: &str) -> RsaPublicKey {
        Certificate::from_pem(pem).unwrap().public_key().unwrap()
    }

    fn signature() -> Vec<u8> {
        BASE64.decode(SIGNATURE.trim()).unwrap()
    }

    #[test]
    fn test_valid_signature() {
        let ok = verify_signature(MANIFEST, &signature(), &key(CERT), SigningAlgorithm::RsaSha256)
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_modified_payload() {
        let mut payload = MANIFEST.to_vec();
        payload[10] ^= 0x01;
        let ok = verify_signature(&payload, &signature(), &key(CERT), SigningAlgorithm::RsaSha256)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_modified_signature() {
        let mut sig = signature();
        let last = sig.len() - 1;
        sig[last] ^= 0x80;
        let ok =
            verify_signature(MANIFEST, &sig, &key(CERT), SigningAlgorithm::RsaSha256).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_wrong_key() {
        let ok = verify_signature(
            MANIFEST,
            &signature(),
            &key(OTHER_CERT),
            SigningAlgorithm::RsaSha256,
        )
        .unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_truncated_signature_is_a_mismatch() {
        let sig = signature();
        let ok = verify_signature(MANIFEST, &sig[..sig.len() / 2], &key(CERT), SigningAlgorithm::RsaSha256)
            .unwrap();
        assert!(!ok);
        let ok = verify_signature(MANIFEST, &[], &key(CERT), SigningAlgorithm::RsaSha256).unwrap();
        assert!(!ok);
    }
}
