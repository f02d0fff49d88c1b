//! `ota-codesign accept-header` - Print the accept-signature request header.

use anyhow::Result;

use super::error_exit_code;
use super::trust::load_configuration;
use crate::cli::args::AcceptHeaderArgs;
use crate::exit_codes;

pub fn cmd_accept_header(args: AcceptHeaderArgs) -> i32 {
    match run_accept_header(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            error_exit_code(&e)
        }
    }
}

fn run_accept_header(args: &AcceptHeaderArgs) -> Result<()> {
    let config = load_configuration(&args.trust)?;
    println!("{}", config.create_accept_signature_header());
    Ok(())
}
