//! # CLI Interface
//!
//! Argument structure for `transactid` using `clap` derive. Six
//! subcommands: `inspect`, `parse`, `validate`, `change-status`, `create`
//! and `keygen`. Messages are read from and written to files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use transactid_protocol::model::{MessageType, StatusCode};

use crate::logging::LogFormat;

/// TransactID message tool.
///
/// Builds, inspects and validates BIP-75 TransactID protocol messages
/// exchanged between VASPs.
#[derive(Parser, Debug)]
#[command(
    name = "transactid",
    about = "TransactID (BIP-75) message tool",
    version,
    propagate_version = true
)]
pub struct TransactIdCli {
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "TRANSACTID_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "TRANSACTID_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the envelope header as JSON. Needs no keys.
    Inspect(InspectArgs),
    /// Decode the message without validating it and print it as JSON.
    Parse(OpenArgs),
    /// Run every signature and certificate check. Exits non-zero on the
    /// first failure.
    Validate(OpenArgs),
    /// Rewrite the status code and message of an envelope.
    ChangeStatus(ChangeStatusArgs),
    /// Build a message from a JSON parameters file.
    Create(CreateArgs),
    /// Write a fresh keypair as PEM.
    Keygen(KeygenArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Envelope file.
    pub envelope: PathBuf,
}

/// Arguments for commands that open an envelope.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Envelope file.
    pub envelope: PathBuf,

    /// Recipient secp256k1 private key (PEM), needed for encrypted envelopes.
    #[arg(long, env = "TRANSACTID_RECIPIENT_PRIVATE_KEY")]
    pub recipient_private_key: Option<PathBuf>,

    /// Recipient public key (PEM). Derived from the private key when omitted.
    #[arg(long)]
    pub recipient_public_key: Option<PathBuf>,

    #[command(flatten)]
    pub trust: TrustArgs,
}

/// Revocation settings.
#[derive(Args, Debug)]
pub struct TrustArgs {
    /// Serve a CRL from disk instead of downloading it, as
    /// `<distribution-point>=<path>`. Repeatable. When given, distribution
    /// points without a local file fail revocation checks.
    #[arg(long = "crl", value_parser = parse_crl_mapping)]
    pub crls: Vec<(String, PathBuf)>,

    /// Timeout for each CRL download, in milliseconds.
    #[arg(long, env = "TRANSACTID_CRL_TIMEOUT_MS", default_value_t = 5_000)]
    pub crl_timeout_ms: u64,
}

#[derive(Args, Debug)]
pub struct ChangeStatusArgs {
    /// Envelope file.
    pub envelope: PathBuf,

    /// New status, by name (`CANCEL`) or wire code (`2`).
    #[arg(long, value_parser = StatusCode::from_str)]
    pub code: StatusCode,

    /// New status message.
    #[arg(long, default_value = "")]
    pub message: String,

    /// Where to write the updated envelope.
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Message type: invoice-request, payment-request, payment or
    /// payment-ack.
    #[arg(value_parser = MessageType::from_str)]
    pub kind: MessageType,

    /// JSON file holding the parameters for this message type.
    #[arg(long)]
    pub params: PathBuf,

    /// Identifier to stamp instead of the derived one.
    #[arg(long)]
    pub identifier: Option<String>,

    /// Where to write the envelope.
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyKind {
    /// RSA-2048, for attestations and sender signatures.
    Rsa,
    /// secp256k1, for envelope encryption.
    Ec,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    #[arg(long, value_enum)]
    pub kind: KeyKind,

    /// Directory to write `<name>.key.pem` and `<name>.pub.pem` into.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// File name stem.
    #[arg(long, default_value = "transactid")]
    pub name: String,
}

/// Parse `<distribution-point>=<path>`. Splits on the last `=` so query
/// strings in the distribution point survive.
fn parse_crl_mapping(s: &str) -> Result<(String, PathBuf), String> {
    match s.rsplit_once('=') {
        Some((uri, path)) if !uri.is_empty() && !path.is_empty() => {
            Ok((uri.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected <distribution-point>=<path>, got '{s}'")),
    }
}
