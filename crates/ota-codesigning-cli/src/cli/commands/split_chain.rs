//! `ota-codesign split-chain` - Split a PEM bundle into its certificates.

use anyhow::{Context, Result};
use std::fs;

use ota_codesigning::{separate_certificate_chain, Certificate};

use super::error_exit_code;
use crate::cli::args::SplitChainArgs;
use crate::exit_codes;

pub fn cmd_split_chain(args: SplitChainArgs) -> i32 {
    match run_split_chain(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            error_exit_code(&e)
        }
    }
}

fn run_split_chain(args: &SplitChainArgs) -> Result<()> {
    let bundle = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read PEM bundle: {}", args.file.display()))?;

    let certificates = separate_certificate_chain(&bundle);
    tracing::debug!(count = certificates.len(), "split PEM bundle");

    if !args.json {
        for pem in &certificates {
            println!("{pem}");
        }
        return Ok(());
    }

    let mut entries = Vec::with_capacity(certificates.len());
    for (index, pem) in certificates.iter().enumerate() {
        let certificate = Certificate::from_pem(pem)
            .with_context(|| format!("certificate {index} in {}", args.file.display()))?;
        entries.push(serde_json::json!({
            "index": index,
            "subject": certificate.subject(),
            "issuer": certificate.issuer(),
            "notBefore": certificate.not_before().to_rfc3339(),
            "notAfter": certificate.not_after().to_rfc3339(),
            "projectInformation": certificate.project_information(),
            "pem": certificate.pem(),
        }));
    }
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
