use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ota-codesign",
    version,
    about = "Verify code signed over-the-air update manifests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Verify a manifest body against its signature header
    Verify(VerifyArgs),

    /// Print the accept-signature request header for a configuration
    AcceptHeader(AcceptHeaderArgs),

    /// Split a PEM bundle into its certificates
    SplitChain(SplitChainArgs),
}

/// Trust material and policy shared by commands that build a configuration.
///
/// Flags override values from `--settings`. Without `--settings` and
/// `--certificate` the `OTA_CODE_SIGNING_*` environment variables are used.
#[derive(Args, Debug, Clone)]
pub struct TrustArgs {
    /// Embedded code signing certificate (PEM)
    #[arg(long)]
    pub certificate: Option<PathBuf>,

    /// Code signing settings file (JSON, app configuration keys)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Expected key id (default: root)
    #[arg(long)]
    pub key_id: Option<String>,

    /// Expected algorithm (default: rsa-v1_5-sha256)
    #[arg(long)]
    pub alg: Option<String>,

    /// Responses carry the leaf and intermediate certificates
    #[arg(long)]
    pub include_certificate_chain: bool,

    /// Accept manifests without a signature (dev/testing only)
    #[arg(long)]
    pub allow_unsigned: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub trust: TrustArgs,

    /// Signature header value; omit for an unsigned response
    #[arg(long)]
    pub signature: Option<String>,

    /// Certificate chain sent with the response (PEM bundle, leaf first)
    #[arg(long)]
    pub certificate_chain: Option<PathBuf>,

    /// Manifest body as received
    #[arg(long)]
    pub body: PathBuf,

    /// Print the result as JSON
    #[arg(long, conflicts_with = "quiet")]
    pub json: bool,

    /// Quiet mode - only exit code, no output
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct AcceptHeaderArgs {
    #[command(flatten)]
    pub trust: TrustArgs,
}

#[derive(Args, Debug)]
pub struct SplitChainArgs {
    /// PEM bundle
    pub file: PathBuf,

    /// Print subject and issuer of each certificate as JSON
    #[arg(long)]
    pub json: bool,
}
