//! Building a `CodeSigningConfiguration` from command line flags.

use anyhow::{Context, Result};
use std::fs;

use ota_codesigning::{CodeSigningConfiguration, CodeSigningError, CodeSigningSettings};

use crate::cli::args::TrustArgs;

pub fn load_settings(args: &TrustArgs) -> Result<CodeSigningSettings> {
    let mut settings = match (&args.settings, &args.certificate) {
        (Some(path), _) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file: {}", path.display()))?;
            CodeSigningSettings::from_json(&json)?
        }
        (None, Some(_)) => CodeSigningSettings::default(),
        (None, None) => CodeSigningSettings::from_env()?,
    };

    if let Some(path) = &args.certificate {
        let pem = fs::read_to_string(path)
            .with_context(|| format!("failed to read certificate: {}", path.display()))?;
        settings = settings.with_certificate(pem);
    }
    if let Some(key_id) = &args.key_id {
        settings = settings.with_key_id(key_id.clone());
    }
    if let Some(alg) = &args.alg {
        settings = settings.with_algorithm(alg.clone());
    }
    if args.include_certificate_chain {
        settings = settings.with_include_certificate_chain(true);
    }
    if args.allow_unsigned {
        settings = settings.with_allow_unsigned(true);
    }

    Ok(settings)
}

pub fn load_configuration(args: &TrustArgs) -> Result<CodeSigningConfiguration> {
    let settings = load_settings(args)?;
    settings.into_configuration()?.ok_or_else(|| {
        CodeSigningError::Config {
            message: "no code signing certificate configured (use --certificate, --settings or OTA_CODE_SIGNING_CERTIFICATE)".to_string(),
        }
        .into()
    })
}
