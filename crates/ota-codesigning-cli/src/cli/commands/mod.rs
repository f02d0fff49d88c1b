pub mod accept_header;
pub mod split_chain;
pub mod trust;
pub mod verify;

use ota_codesigning::CodeSigningError;

use super::args::{Cli, Command};
use crate::exit_codes;

pub fn dispatch(cli: Cli) -> i32 {
    match cli.cmd {
        Command::Verify(args) => verify::cmd_verify(args),
        Command::AcceptHeader(args) => accept_header::cmd_accept_header(args),
        Command::SplitChain(args) => split_chain::cmd_split_chain(args),
    }
}

/// Exit code for a failed command: the library's code when the failure is a
/// code signing error, otherwise a configuration error.
pub(crate) fn error_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CodeSigningError>()
        .map(CodeSigningError::exit_code)
        .unwrap_or(exit_codes::CONFIG_ERROR)
}
