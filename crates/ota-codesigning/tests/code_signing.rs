//! Integration tests for manifest signature validation.
//!
//! Fixtures in `tests/fixtures/` were generated with openssl and are valid
//! from 2000 to 2100. `*.sig` files hold the base64 RSA-SHA256 signature of
//! `manifest.json` made with the key of the certificate of the same name.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ota_codesigning::{
    parse_dictionary, CodeSigningConfiguration, CodeSigningError, CodeSigningSettings,
    ProjectInformation, ValidationResult,
};
use proptest::prelude::*;

const SELF_SIGNED: &str = include_str!("fixtures/selfsigned.pem");
const NO_PROJECT: &str = include_str!("fixtures/noproject.pem");
const ROOT: &str = include_str!("fixtures/root.pem");
const INTERMEDIATE: &str = include_str!("fixtures/intermediate.pem");
const LEAF: &str = include_str!("fixtures/leaf.pem");
const PLAIN: &str = include_str!("fixtures/plain.pem");
const MANIFEST: &[u8] = include_bytes!("fixtures/manifest.json");
const SELF_SIGNED_SIG: &str = include_str!("fixtures/selfsigned.sig");
const NO_PROJECT_SIG: &str = include_str!("fixtures/noproject.sig");
const LEAF_SIG: &str = include_str!("fixtures/leaf.sig");
const PATHLEN_ROOT: &str = include_str!("fixtures/root_pathlen.pem");
const PATHLEN_INTERMEDIATE: &str = include_str!("fixtures/pathlen_intermediate.pem");
const PATHLEN_LEAF: &str = include_str!("fixtures/pathlen_leaf.pem");
const PATHLEN_LEAF_SIG: &str = include_str!("fixtures/pathlen_leaf.sig");

fn project() -> ProjectInformation {
    ProjectInformation::new("@test/app", "285dc9ca-a25d-4f60-93be-36dc312266d7")
}

fn config(certificate: &str, include_chain: bool, allow_unsigned: bool) -> CodeSigningConfiguration {
    CodeSigningConfiguration::new(certificate, &HashMap::new(), include_chain, allow_unsigned)
        .expect("valid configuration")
}

fn header(sig: &str, key_id: &str) -> String {
    format!(
        "sig=\"{}\", keyid=\"{key_id}\", alg=\"rsa-v1_5-sha256\"",
        sig.trim()
    )
}

fn chain_bundle() -> String {
    format!("{LEAF}\n{INTERMEDIATE}")
}

#[test]
fn test_valid_signature_embedded_certificate() {
    let result = config(SELF_SIGNED, false, false)
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "root")), MANIFEST, None)
        .unwrap();
    assert_eq!(result, ValidationResult::Valid(Some(project())));
    assert!(result
        .project_information()
        .unwrap()
        .matches("285dc9ca-a25d-4f60-93be-36dc312266d7", "@test/app"));
}

#[test]
fn test_valid_signature_without_project_information() {
    let result = config(NO_PROJECT, false, false)
        .validate_signature(Some(&header(NO_PROJECT_SIG, "root")), MANIFEST, None)
        .unwrap();
    assert_eq!(result, ValidationResult::Valid(None));
}

#[test]
fn test_header_defaults_key_id_and_algorithm() {
    let value = format!("sig=\"{}\"", SELF_SIGNED_SIG.trim());
    let result = config(SELF_SIGNED, false, false)
        .validate_signature(Some(&value), MANIFEST, None)
        .unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_modified_body_is_invalid() {
    let mut body = MANIFEST.to_vec();
    body[0] = b' ';
    let result = config(SELF_SIGNED, false, false)
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "root")), &body, None)
        .unwrap();
    assert_eq!(result, ValidationResult::Invalid(Some(project())));
}

#[test]
fn test_flipped_signature_byte_is_invalid() {
    let signature = BASE64.decode(SELF_SIGNED_SIG.trim()).unwrap();
    let config = config(SELF_SIGNED, false, false);
    for index in [0, signature.len() / 2, signature.len() - 1] {
        let mut flipped = signature.clone();
        flipped[index] ^= 0xff;
        let value = header(&BASE64.encode(&flipped), "root");
        let result = config
            .validate_signature(Some(&value), MANIFEST, None)
            .unwrap();
        assert_eq!(result, ValidationResult::Invalid(Some(project())), "byte {index}");
    }
}

#[test]
fn test_signature_from_other_key_is_invalid() {
    let result = config(SELF_SIGNED, false, false)
        .validate_signature(Some(&header(NO_PROJECT_SIG, "root")), MANIFEST, None)
        .unwrap();
    assert!(!result.is_valid());
    assert!(matches!(result, ValidationResult::Invalid(_)));
}

#[test]
fn test_unsigned_rejected() {
    let err = config(SELF_SIGNED, false, false)
        .validate_signature(None, MANIFEST, None)
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::SignatureHeaderMissing));
}

#[test]
fn test_unsigned_allowed_is_skipped() {
    let result = config(SELF_SIGNED, false, true)
        .validate_signature(None, MANIFEST, None)
        .unwrap();
    assert_eq!(result, ValidationResult::Skipped);
    assert_eq!(result.project_information(), None);
}

#[test]
fn test_allow_unsigned_still_checks_present_signature() {
    let mut body = MANIFEST.to_vec();
    body.push(b'\n');
    let result = config(SELF_SIGNED, false, true)
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "root")), &body, None)
        .unwrap();
    assert!(matches!(result, ValidationResult::Invalid(_)));
}

#[test]
fn test_key_id_mismatch() {
    let err = config(SELF_SIGNED, false, false)
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "other")), MANIFEST, None)
        .unwrap_err();
    match err {
        CodeSigningError::KeyIdMismatch { header, expected } => {
            assert_eq!(header, "other");
            assert_eq!(expected, "root");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_key_id_mismatch_checked_before_certificate_and_signature() {
    // Neither the certificate nor the signature would survive decoding.
    let err = config("not a certificate", false, false)
        .validate_signature(Some("sig=\"not*base64!\", keyid=\"other\""), MANIFEST, None)
        .unwrap_err();
    assert!(
        matches!(&err, CodeSigningError::KeyIdMismatch { header, .. } if header == "other"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_certificate_chain_with_root_pathlen_and_repeated_root() {
    let bundle = format!("{PATHLEN_LEAF}{PATHLEN_INTERMEDIATE}{PATHLEN_ROOT}");
    let result = config(PATHLEN_ROOT, true, false)
        .validate_signature(Some(&header(PATHLEN_LEAF_SIG, "root")), MANIFEST, Some(&bundle))
        .unwrap();
    assert_eq!(result, ValidationResult::Valid(Some(project())));
}

#[test]
fn test_malformed_header() {
    let err = config(SELF_SIGNED, false, false)
        .validate_signature(Some("sig=\"unterminated"), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(
        err,
        CodeSigningError::SignatureHeaderStructuredFieldParse { .. }
    ));
}

#[test]
fn test_header_without_sig() {
    let err = config(SELF_SIGNED, false, false)
        .validate_signature(Some("keyid=\"root\", alg=\"rsa-v1_5-sha256\""), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::SignatureMissing));
}

#[test]
fn test_unknown_header_algorithm() {
    let value = format!("sig=\"{}\", alg=\"ed25519\"", SELF_SIGNED_SIG.trim());
    let err = config(SELF_SIGNED, false, false)
        .validate_signature(Some(&value), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::AlgorithmParse { .. }));
}

#[test]
fn test_signature_not_base64() {
    let err = config(SELF_SIGNED, false, false)
        .validate_signature(Some("sig=\"not*base64!\""), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::SignatureEncoding { .. }));
}

#[test]
fn test_embedded_certificate_not_code_signing() {
    let err = config(PLAIN, false, false)
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "root")), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(
        err,
        CodeSigningError::NoCodeSigningCertificate { .. }
    ));
}

#[test]
fn test_embedded_certificate_garbage() {
    let err = config("not a certificate", false, false)
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "root")), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::CertificateParse { .. }));
}

#[test]
fn test_certificate_chain_valid() {
    // Key id is not checked when the response carries the chain.
    let result = config(ROOT, true, false)
        .validate_signature(
            Some(&header(LEAF_SIG, "ca-root")),
            MANIFEST,
            Some(&chain_bundle()),
        )
        .unwrap();
    assert_eq!(result, ValidationResult::Valid(Some(project())));
}

#[test]
fn test_certificate_chain_modified_body() {
    let mut body = MANIFEST.to_vec();
    body.truncate(body.len() - 1);
    let result = config(ROOT, true, false)
        .validate_signature(Some(&header(LEAF_SIG, "root")), &body, Some(&chain_bundle()))
        .unwrap();
    assert_eq!(result, ValidationResult::Invalid(Some(project())));
}

#[test]
fn test_certificate_chain_missing_intermediate() {
    let err = config(ROOT, true, false)
        .validate_signature(Some(&header(LEAF_SIG, "root")), MANIFEST, Some(LEAF))
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::CertificateChain { .. }));
}

#[test]
fn test_certificate_chain_absent_uses_embedded_only() {
    // The embedded root alone is not a code signing certificate.
    let err = config(ROOT, true, false)
        .validate_signature(Some(&header(LEAF_SIG, "root")), MANIFEST, None)
        .unwrap_err();
    assert!(matches!(
        err,
        CodeSigningError::NoCodeSigningCertificate { .. }
    ));
}

#[test]
fn test_certificate_chain_untrusted_anchor() {
    let err = config(SELF_SIGNED, true, false)
        .validate_signature(
            Some(&header(LEAF_SIG, "root")),
            MANIFEST,
            Some(&chain_bundle()),
        )
        .unwrap_err();
    assert!(matches!(err, CodeSigningError::CertificateChain { .. }));
}

#[test]
fn test_chain_ignored_when_not_configured() {
    let result = config(SELF_SIGNED, false, false)
        .validate_signature(
            Some(&header(SELF_SIGNED_SIG, "root")),
            MANIFEST,
            Some(&chain_bundle()),
        )
        .unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_settings_to_validation() {
    let json = serde_json::json!({
        "codeSigningCertificate": SELF_SIGNED,
        "codeSigningMetadata": { "keyid": "main" },
    })
    .to_string();
    let config = CodeSigningSettings::from_json(&json)
        .unwrap()
        .into_configuration()
        .unwrap()
        .expect("code signing enabled");

    assert_eq!(
        config.create_accept_signature_header(),
        r#"sig, keyid="main", alg="rsa-v1_5-sha256""#
    );
    let result = config
        .validate_signature(Some(&header(SELF_SIGNED_SIG, "main")), MANIFEST, None)
        .unwrap();
    assert!(result.is_valid());
}

proptest! {
    #[test]
    fn prop_accept_header_round_trips_key_id(key_id in "[ -~]{0,40}") {
        let mut metadata = HashMap::new();
        metadata.insert("keyid".to_string(), key_id.clone());
        let config = CodeSigningConfiguration::new(SELF_SIGNED, &metadata, false, false).unwrap();

        let parsed = parse_dictionary(&config.create_accept_signature_header(), true).unwrap();
        prop_assert_eq!(parsed.get("keyid"), Some(&key_id));
        prop_assert_eq!(parsed.get("alg").map(String::as_str), Some("rsa-v1_5-sha256"));
        prop_assert!(!parsed.contains_key("sig"));
    }

    #[test]
    fn prop_accepted_key_ids_always_round_trip(
        key_id in "[\\\\\"a-z\\x00-\\x1f\\x7f\\x{e9}\\x{1F600}]{0,20}"
    ) {
        let mut metadata = HashMap::new();
        metadata.insert("keyid".to_string(), key_id.clone());

        match CodeSigningConfiguration::new(SELF_SIGNED, &metadata, false, false) {
            Ok(config) => {
                let parsed =
                    parse_dictionary(&config.create_accept_signature_header(), true).unwrap();
                prop_assert_eq!(parsed.get("keyid"), Some(&key_id));
            }
            Err(err) => {
                prop_assert!(matches!(err, CodeSigningError::Config { .. }), "expected Config error, got {:?}", err);
                prop_assert!(key_id.bytes().any(|b| !(0x20..=0x7e).contains(&b)));
            }
        }
    }
}
