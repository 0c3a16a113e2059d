//! Subcommand implementations.
//!
//! Each command takes its parsed arguments, does its file I/O with
//! `anyhow` context, and returns what should go to stdout.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use transactid_protocol::crypto::keys::{
    generate_default_rsa_key_pair, generate_ec_key_pair, public_key_pem_from_private,
};
use transactid_protocol::envelope;
use transactid_protocol::model::{
    EncryptionParameters, InvoiceRequestParameters, MessageType, PaymentAckParameters,
    PaymentParameters, PaymentRequestParameters, RecipientParameters,
};
use transactid_protocol::pki::{CrlFetcher, StaticCrlFetcher, TrustSettings};
use transactid_protocol::TransactId;

use crate::cli::{
    ChangeStatusArgs, CreateArgs, InspectArgs, KeyKind, KeygenArgs, OpenArgs, TrustArgs,
};

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid parameters in {}", path.display()))
}

/// Facade with either on-disk CRLs or HTTP downloads.
fn transactid(trust: &TrustArgs) -> Result<TransactId> {
    let settings = TrustSettings {
        crl_timeout: Duration::from_millis(trust.crl_timeout_ms),
    };
    let mut builder = TransactId::builder().trust_settings(settings);
    if !trust.crls.is_empty() {
        let mut fetcher = StaticCrlFetcher::new();
        for (distribution_point, path) in &trust.crls {
            fetcher = fetcher.with_crl(distribution_point.clone(), read_bytes(path)?);
        }
        let fetcher: Arc<dyn CrlFetcher> = Arc::new(fetcher);
        builder = builder.crl_fetcher(fetcher);
    }
    builder.build().context("failed to set up TransactID")
}

fn recipient(args: &OpenArgs) -> Result<Option<RecipientParameters>> {
    let Some(private_key_path) = &args.recipient_private_key else {
        return Ok(None);
    };
    let private_key_pem = read_text(private_key_path)?;
    let public_key_pem = match &args.recipient_public_key {
        Some(path) => read_text(path)?,
        None => public_key_pem_from_private(&private_key_pem)
            .context("failed to derive the recipient public key")?,
    };
    Ok(Some(RecipientParameters {
        encryption_parameters: Some(EncryptionParameters::new(
            public_key_pem,
            Some(private_key_pem),
        )),
        ..Default::default()
    }))
}

pub fn inspect(args: &InspectArgs) -> Result<String> {
    let bytes = read_bytes(&args.envelope)?;
    let metadata = envelope::extract_metadata(&bytes)?;
    Ok(serde_json::to_string_pretty(&metadata)?)
}

pub fn parse(args: &OpenArgs) -> Result<String> {
    let bytes = read_bytes(&args.envelope)?;
    let recipient = recipient(args)?;
    let message = transactid(&args.trust)?.parse_protocol_message(&bytes, recipient.as_ref())?;
    Ok(serde_json::to_string_pretty(&message)?)
}

pub fn validate(args: &OpenArgs) -> Result<String> {
    let bytes = read_bytes(&args.envelope)?;
    let recipient = recipient(args)?;
    let transactid = transactid(&args.trust)?;
    let metadata = transactid.get_protocol_message_metadata(&bytes)?;
    if !transactid.is_protocol_message_valid(&bytes, recipient.as_ref())? {
        bail!("{} {} is not valid", metadata.message_type, metadata.identifier);
    }
    tracing::info!(
        message_type = %metadata.message_type,
        identifier = %metadata.identifier,
        "message valid"
    );
    Ok(format!("{} {} is valid", metadata.message_type, metadata.identifier))
}

pub fn change_status(args: &ChangeStatusArgs) -> Result<String> {
    let bytes = read_bytes(&args.envelope)?;
    let updated = envelope::change_status(&bytes, args.code, &args.message)?;
    write_bytes(&args.output, &updated)?;
    Ok(format!("status set to {} ({})", args.code, args.code.code()))
}

pub fn create(args: &CreateArgs) -> Result<String> {
    let transactid = TransactId::builder().build()?;
    let identifier = args.identifier.clone();
    let bytes = match args.kind {
        MessageType::InvoiceRequest => transactid
            .create_invoice_request(&read_json::<InvoiceRequestParameters>(&args.params)?, identifier)?,
        MessageType::PaymentRequest => transactid
            .create_payment_request(&read_json::<PaymentRequestParameters>(&args.params)?, identifier)?,
        MessageType::Payment => {
            transactid.create_payment(&read_json::<PaymentParameters>(&args.params)?, identifier)?
        }
        MessageType::PaymentAck => transactid
            .create_payment_ack(&read_json::<PaymentAckParameters>(&args.params)?, identifier)?,
    };
    write_bytes(&args.output, &bytes)?;
    let metadata = envelope::extract_metadata(&bytes)?;
    tracing::info!(
        message_type = %args.kind,
        identifier = %metadata.identifier,
        bytes = bytes.len(),
        "message created"
    );
    Ok(metadata.identifier)
}

pub fn keygen(args: &KeygenArgs) -> Result<String> {
    let pair = match args.kind {
        KeyKind::Rsa => generate_default_rsa_key_pair()?,
        KeyKind::Ec => generate_ec_key_pair()?,
    };

    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let key_path = args.output.join(format!("{}.key.pem", args.name));
    let pub_path = args.output.join(format!("{}.pub.pem", args.name));

    write_bytes(&key_path, pair.private_key_pem.as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict {}", key_path.display()))?;
    }
    write_bytes(&pub_path, pair.public_key_pem.as_bytes())?;

    tracing::info!(kind = ?args.kind, key_path = %key_path.display(), "keypair generated");
    Ok(format!("{}\n{}", key_path.display(), pub_path.display()))
}
