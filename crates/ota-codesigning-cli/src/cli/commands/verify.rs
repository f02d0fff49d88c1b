//! `ota-codesign verify` - Verify a manifest body against its signature header.

use anyhow::{Context, Result};
use std::fs;

use ota_codesigning::ValidationResult;

use super::error_exit_code;
use super::trust::load_configuration;
use crate::cli::args::VerifyArgs;
use crate::exit_codes;

pub fn cmd_verify(args: VerifyArgs) -> i32 {
    match run_verify(&args) {
        Ok(result) => {
            report(&args, &result);
            match result {
                ValidationResult::Valid(_) | ValidationResult::Skipped => exit_codes::SUCCESS,
                ValidationResult::Invalid(_) => exit_codes::INVALID_SIGNATURE,
            }
        }
        Err(e) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "result": "error",
                        "error": format!("{e:#}"),
                        "exitCode": error_exit_code(&e),
                    })
                );
            } else if !args.quiet {
                eprintln!("error: {e:#}");
            }
            error_exit_code(&e)
        }
    }
}

fn run_verify(args: &VerifyArgs) -> Result<ValidationResult> {
    let config = load_configuration(&args.trust)?;

    let body = fs::read(&args.body)
        .with_context(|| format!("failed to read manifest body: {}", args.body.display()))?;

    let chain = args
        .certificate_chain
        .as_ref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read certificate chain: {}", path.display()))
        })
        .transpose()?;

    let result = config.validate_signature(args.signature.as_deref(), &body, chain.as_deref())?;
    Ok(result)
}

fn report(args: &VerifyArgs, result: &ValidationResult) {
    let outcome = match result {
        ValidationResult::Valid(_) => "valid",
        ValidationResult::Invalid(_) => "invalid",
        ValidationResult::Skipped => "skipped",
    };

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "result": outcome,
                "projectInformation": result.project_information(),
            })
        );
        return;
    }
    if args.quiet {
        return;
    }

    match result {
        ValidationResult::Valid(_) => println!("Verification successful!"),
        ValidationResult::Invalid(_) => println!("Signature does not match manifest body"),
        ValidationResult::Skipped => println!("Manifest is not signed (allowed)"),
    }
    if let Some(project) = result.project_information() {
        println!();
        println!("  scope_key:  {}", project.scope_key);
        println!("  project_id: {}", project.project_id);
    }
}
