//! End-to-end message flows through the `TransactId` facade.
//!
//! Every test builds its own facade over an in-memory CRL fetcher, creates
//! messages from the PEM fixtures under `tests/fixtures`, and inspects the
//! bytes the way a receiving VASP would.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{TimeZone, Utc};

use transactid_protocol::codec;
use transactid_protocol::crypto::{self, EncryptionError};
use transactid_protocol::envelope::Envelope;
use transactid_protocol::model::{
    AddressCurrency, AddressInformation, Attestation, EncryptionParameters,
    InvoiceRequestParameters, MessageInformation, MessageType, OwnerParameters, OwnerType,
    OwnerValidationError, Output, PaymentAckParameters, PaymentParameters,
    PaymentRequestParameters, PkiDataParameters, PkiType, RecipientParameters, SenderParameters,
    StatusCode,
};
use transactid_protocol::pki::StaticCrlFetcher;
use transactid_protocol::services::{AddressInformationService, ProviderError};
use transactid_protocol::{InvoiceRequest, ProtocolMessageKind, TransactId, TransactIdError};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const CRL_DP: &str = "http://crl.transactid.test/intermediate.crl";
const CRL: &[u8] = include_bytes!("fixtures/intermediate.crl.der");

const SENDER_KEY: &str = include_str!("fixtures/sender.key.pem");
const SENDER_BUNDLE: &str = include_str!("fixtures/sender.bundle.pem");
const ORIGINATOR_KEY: &str = include_str!("fixtures/originator.key.pem");
const ORIGINATOR_BUNDLE: &str = include_str!("fixtures/originator.bundle.pem");
const BENEFICIARY_KEY: &str = include_str!("fixtures/beneficiary.key.pem");
const BENEFICIARY_BUNDLE: &str = include_str!("fixtures/beneficiary.bundle.pem");
const EV_BUNDLE: &str = include_str!("fixtures/ev.bundle.pem");
const EXPIRED_KEY: &str = include_str!("fixtures/expired.key.pem");
const EXPIRED_BUNDLE: &str = include_str!("fixtures/expired.bundle.pem");
const REVOKED_KEY: &str = include_str!("fixtures/revoked.key.pem");
const REVOKED_BUNDLE: &str = include_str!("fixtures/revoked.bundle.pem");
const NOT_YET_VALID_KEY: &str = include_str!("fixtures/not_yet_valid.key.pem");
const NOT_YET_VALID_BUNDLE: &str = include_str!("fixtures/not_yet_valid.bundle.pem");
const ROGUE_CERT: &str = include_str!("fixtures/rogue.crt.pem");
const ROGUE_RSA_1024_KEY: &str = include_str!("fixtures/rogue_rsa1024.key.pem");
const ROGUE_RSA_1024_CERT: &str = include_str!("fixtures/rogue_rsa1024.crt.pem");
const ROGUE_K1_CERT: &str = include_str!("fixtures/rogue_k1.crt.pem");

const SENDER_EC_KEY: &str = include_str!("fixtures/sender_ec.key.pem");
const SENDER_EC_PUB: &str = include_str!("fixtures/sender_ec.pub.pem");
const RECIPIENT_EC_KEY: &str = include_str!("fixtures/recipient_ec.key.pem");
const RECIPIENT_EC_PUB: &str = include_str!("fixtures/recipient_ec.pub.pem");
const STRANGER_EC_KEY: &str = include_str!("fixtures/stranger_ec.key.pem");

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn transactid() -> TransactId {
    TransactId::builder()
        .crl_fetcher(Arc::new(StaticCrlFetcher::new().with_crl(CRL_DP, CRL)))
        .build()
        .unwrap()
}

/// Address lookups answered from a fixed risk score.
struct FixedRisk(f64);

impl AddressInformationService for FixedRisk {
    fn get_address_information(
        &self,
        currency: AddressCurrency,
        script: &str,
    ) -> Result<Option<AddressInformation>, ProviderError> {
        Ok(Some(AddressInformation {
            identifier: Some(format!("{currency}:{script}")),
            risk_score: Some(self.0),
            ..Default::default()
        }))
    }
}

struct FailingLookup;

impl AddressInformationService for FailingLookup {
    fn get_address_information(
        &self,
        _currency: AddressCurrency,
        _script: &str,
    ) -> Result<Option<AddressInformation>, ProviderError> {
        Err(ProviderError::AddressInformation("service down".into()))
    }
}

fn x509(attestation: Attestation, key: &str, bundle: &str) -> PkiDataParameters {
    PkiDataParameters {
        attestation: Some(attestation),
        private_key_pem: key.into(),
        certificate_pem: bundle.into(),
        pki_type: PkiType::X509Sha256,
    }
}

fn no_pki(attestation: Attestation) -> PkiDataParameters {
    PkiDataParameters {
        attestation: Some(attestation),
        ..Default::default()
    }
}

fn owner(primary: bool, sets: Vec<PkiDataParameters>) -> OwnerParameters {
    OwnerParameters {
        primary_for_transaction: primary,
        pki_data_parameters_sets: sets,
    }
}

fn x509_sender(key: &str, bundle: &str) -> SenderParameters {
    SenderParameters {
        pki_data_parameters: Some(x509(Attestation::LegalPersonName, key, bundle)),
        ..Default::default()
    }
}

fn outputs() -> Vec<Output> {
    vec![
        Output::new(1_000, "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", AddressCurrency::Bitcoin),
        Output::new(2_000, "0x52908400098527886E0F7030069857D2E4169EE7", AddressCurrency::Ethereum),
    ]
}

/// The signed InvoiceRequest most tests start from.
fn signed_invoice_request() -> InvoiceRequestParameters {
    InvoiceRequestParameters {
        amount: 1000,
        memo: "memo".into(),
        notification_url: "https://notify.vasp.test".into(),
        originators_addresses: outputs(),
        originator_parameters: vec![
            owner(
                true,
                vec![
                    x509(Attestation::LegalPersonName, ORIGINATOR_KEY, ORIGINATOR_BUNDLE),
                    x509(Attestation::AddressDepartment, ORIGINATOR_KEY, ORIGINATOR_BUNDLE),
                ],
            ),
            owner(false, vec![no_pki(Attestation::LegalPersonName)]),
        ],
        beneficiary_parameters: vec![owner(
            true,
            vec![x509(Attestation::LegalPersonName, BENEFICIARY_KEY, BENEFICIARY_BUNDLE)],
        )],
        sender_parameters: x509_sender(SENDER_KEY, SENDER_BUNDLE),
        attestations_requested: vec![Attestation::LegalPersonName, Attestation::AddressCountry],
        recipient_parameters: Some(RecipientParameters {
            vasp_name: "Beneficiary VASP".into(),
            chain_address: Some("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2".into()),
            encryption_parameters: None,
        }),
        message_information: MessageInformation::default(),
    }
}

fn encryption_setup() -> (SenderParameters, RecipientParameters, RecipientParameters) {
    let sender = SenderParameters {
        encryption_parameters: Some(EncryptionParameters::new(
            SENDER_EC_PUB,
            Some(SENDER_EC_KEY.into()),
        )),
        ..x509_sender(SENDER_KEY, SENDER_BUNDLE)
    };
    let addressed_to = RecipientParameters {
        vasp_name: "Beneficiary VASP".into(),
        chain_address: None,
        encryption_parameters: Some(EncryptionParameters::new(RECIPIENT_EC_PUB, None)),
    };
    let recipient = RecipientParameters {
        encryption_parameters: Some(EncryptionParameters::new(
            RECIPIENT_EC_PUB,
            Some(RECIPIENT_EC_KEY.into()),
        )),
        ..addressed_to.clone()
    };
    (sender, addressed_to, recipient)
}

fn encrypted_invoice_request() -> (Vec<u8>, RecipientParameters) {
    let (sender, addressed_to, recipient) = encryption_setup();
    let parameters = InvoiceRequestParameters {
        sender_parameters: sender,
        recipient_parameters: Some(addressed_to),
        message_information: MessageInformation {
            encrypt_message: true,
            ..Default::default()
        },
        ..signed_invoice_request()
    };
    let bytes = transactid().create_invoice_request(&parameters, None).unwrap();
    (bytes, recipient)
}

fn rewrite_invoice_request(bytes: &[u8], edit: impl FnOnce(&mut InvoiceRequest)) -> Vec<u8> {
    let mut envelope = Envelope::decode(bytes).unwrap();
    let Envelope::Plain(plain) = &mut envelope else {
        panic!("expected a plain envelope");
    };
    let mut message: InvoiceRequest = codec::decode(&plain.serialized_message).unwrap();
    edit(&mut message);
    plain.serialized_message = codec::encode(&message).unwrap();
    envelope.encode().unwrap()
}

// ---------------------------------------------------------------------------
// 1. InvoiceRequest
// ---------------------------------------------------------------------------

#[test]
fn invoice_request_without_pki_round_trips() {
    let transactid = transactid();
    let parameters = InvoiceRequestParameters {
        amount: 42,
        memo: "plain".into(),
        originators_addresses: outputs(),
        originator_parameters: vec![owner(true, vec![no_pki(Attestation::LegalPersonName)])],
        ..Default::default()
    };

    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    assert!(transactid.is_invoice_request_valid(&bytes, None).unwrap());

    let parsed = transactid.parse_invoice_request(&bytes, None).unwrap();
    assert_eq!(parsed.amount, 42);
    assert_eq!(parsed.memo, "plain");
    assert_eq!(parsed.originators_addresses, outputs());
    assert_eq!(parsed.sender_pki_type, PkiType::None);
    assert!(parsed.sender_signature.is_empty());
    assert!(parsed.beneficiaries.is_empty());

    let metadata = parsed.protocol_message_metadata.unwrap();
    assert_eq!(metadata.message_type, MessageType::InvoiceRequest);
    assert_eq!(metadata.status_code, StatusCode::Ok);
    assert!(!metadata.encrypted);
}

#[test]
fn signed_invoice_request_is_valid() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    assert!(transactid.is_invoice_request_valid(&bytes, None).unwrap());

    let parsed = transactid.parse_invoice_request(&bytes, None).unwrap();
    assert_eq!(parsed.amount, 1000);
    assert_eq!(parsed.memo, "memo");
    assert_eq!(parsed.sender_pki_type, PkiType::X509Sha256);
    assert!(!parsed.sender_signature.is_empty());
    assert_eq!(parsed.recipient_vasp_name, "Beneficiary VASP");

    let primary = &parsed.originators[0];
    assert!(primary.primary_for_transaction);
    assert!(primary.pki_data_set.iter().all(|pki| !pki.signature.is_empty()));
    assert!(parsed.beneficiaries[0].pki_data_set[0].signature.is_empty());
}

#[test]
fn caller_identifier_is_kept() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), Some("correlation-1".into()))
        .unwrap();
    let metadata = transactid.get_protocol_message_metadata(&bytes).unwrap();
    assert_eq!(metadata.identifier, "correlation-1");
}

#[test]
fn derived_identifier_starts_with_payload_hash() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let metadata = transactid.get_protocol_message_metadata(&bytes).unwrap();
    assert!(metadata.identifier.len() > 64);
    assert!(metadata.identifier[..64].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn tampered_invoice_request_fails_sender_signature() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let tampered = rewrite_invoice_request(&bytes, |message| message.amount = 1_000_000);

    match transactid.is_invoice_request_valid(&tampered, None).unwrap_err() {
        TransactIdError::InvalidSignature(reason) => {
            assert_eq!(reason, "sender message signature invalid")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn flipped_sender_signature_byte_fails_sender_signature() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let tampered = rewrite_invoice_request(&bytes, |message| {
        let mut signature = BASE64.decode(&message.sender_signature).unwrap();
        let last = signature.len() - 1;
        signature[last] ^= 0x01;
        message.sender_signature = BASE64.encode(signature);
    });

    match transactid.is_invoice_request_valid(&tampered, None).unwrap_err() {
        TransactIdError::InvalidSignature(reason) => {
            assert_eq!(reason, "sender message signature invalid")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn tampered_attestation_fails_attestation_signature() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    // Re-signed as the sender, so only the attestation check can catch it.
    let tampered = rewrite_invoice_request(&bytes, |message| {
        message.originators[0].pki_data_set[0].attestation = Some(Attestation::DateOfBirth);
        let hash = codec::signing_hash(&message.unsigned()).unwrap();
        message.sender_signature = crypto::sign(&hash, SENDER_KEY).unwrap();
    });

    match transactid.is_invoice_request_valid(&tampered, None).unwrap_err() {
        TransactIdError::InvalidSignature(reason) => {
            assert_eq!(reason, "invalid originator signature for attestation DATE_OF_BIRTH")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rogue_attestation_certificate_names_the_attestation() {
    let transactid = transactid();
    let mut parameters = signed_invoice_request();
    parameters.originator_parameters[0].pki_data_parameters_sets[0].certificate_pem =
        ROGUE_CERT.into();
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();

    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificateChain(reason) => {
            assert!(reason.contains("LEGAL_PERSON_NAME"), "{reason}");
            assert!(reason.contains("originator"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn self_signed_small_rsa_attestation_rejected() {
    let transactid = transactid();
    let mut parameters = signed_invoice_request();
    parameters.originator_parameters[0].pki_data_parameters_sets[0] = x509(
        Attestation::LegalPersonName,
        ROGUE_RSA_1024_KEY,
        ROGUE_RSA_1024_CERT,
    );
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();

    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificateChain(reason) => {
            assert!(reason.contains("LEGAL_PERSON_NAME"), "{reason}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn self_signed_secp256k1_attestation_rejected() {
    let transactid = transactid();
    let mut parameters = signed_invoice_request();
    parameters.originator_parameters[0].pki_data_parameters_sets[1].certificate_pem =
        ROGUE_K1_CERT.into();
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();

    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificateChain(reason) => {
            assert!(reason.contains("ADDRESS_DEPARTMENT"), "{reason}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invoice_request_owner_rules() {
    let transactid = transactid();

    let no_originators = InvoiceRequestParameters {
        originator_parameters: Vec::new(),
        ..signed_invoice_request()
    };
    let err = transactid.create_invoice_request(&no_originators, None).unwrap_err();
    assert!(matches!(
        err,
        TransactIdError::InvalidOwners(OwnerValidationError::Empty(OwnerType::Originator))
    ));

    let two_primaries = InvoiceRequestParameters {
        originator_parameters: vec![
            owner(true, vec![no_pki(Attestation::LegalPersonName)]),
            owner(true, vec![no_pki(Attestation::LegalPersonName)]),
        ],
        ..signed_invoice_request()
    };
    let err = transactid.create_invoice_request(&two_primaries, None).unwrap_err();
    assert!(matches!(
        err,
        TransactIdError::InvalidOwners(OwnerValidationError::MultiplePrimary(OwnerType::Originator))
    ));

    let beneficiaries_without_primary = InvoiceRequestParameters {
        beneficiary_parameters: vec![owner(false, vec![no_pki(Attestation::LegalPersonName)])],
        ..signed_invoice_request()
    };
    let err = transactid
        .create_invoice_request(&beneficiaries_without_primary, None)
        .unwrap_err();
    assert!(matches!(
        err,
        TransactIdError::InvalidOwners(OwnerValidationError::NoPrimary(OwnerType::Beneficiary))
    ));
}

// ---------------------------------------------------------------------------
// 2. Sender certificates
// ---------------------------------------------------------------------------

#[test]
fn ev_sender_certificate_accepted() {
    let transactid = transactid();
    let mut parameters = signed_invoice_request();
    parameters.sender_parameters.ev_certificate_pem = Some(EV_BUNDLE.into());
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    assert!(transactid.is_invoice_request_valid(&bytes, None).unwrap());
}

#[test]
fn non_ev_certificate_offered_as_ev_rejected() {
    let transactid = transactid();
    let mut parameters = signed_invoice_request();
    parameters.sender_parameters.ev_certificate_pem = Some(SENDER_BUNDLE.into());
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();

    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificate(reason) => assert!(reason.contains("EV"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn expired_sender_certificate_rejected() {
    let transactid = transactid();
    let parameters = InvoiceRequestParameters {
        sender_parameters: x509_sender(EXPIRED_KEY, EXPIRED_BUNDLE),
        ..signed_invoice_request()
    };
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    let err = transactid.is_invoice_request_valid(&bytes, None).unwrap_err();
    assert!(matches!(err, TransactIdError::InvalidCertificate(_)));
}

#[test]
fn not_yet_valid_sender_certificate_rejected() {
    let transactid = transactid();
    let parameters = InvoiceRequestParameters {
        sender_parameters: x509_sender(NOT_YET_VALID_KEY, NOT_YET_VALID_BUNDLE),
        ..signed_invoice_request()
    };
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificate(reason) => {
            assert!(reason.contains("not valid until 2099"), "{reason}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn not_yet_valid_attestation_certificate_rejected() {
    let transactid = transactid();
    let mut parameters = signed_invoice_request();
    parameters.originator_parameters[0].pki_data_parameters_sets[0] = x509(
        Attestation::LegalPersonName,
        NOT_YET_VALID_KEY,
        NOT_YET_VALID_BUNDLE,
    );
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificateChain(reason) => {
            assert!(reason.contains("LEGAL_PERSON_NAME"), "{reason}");
            assert!(reason.contains("not valid until"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn revoked_sender_certificate_rejected() {
    let transactid = transactid();
    let parameters = InvoiceRequestParameters {
        sender_parameters: x509_sender(REVOKED_KEY, REVOKED_BUNDLE),
        ..signed_invoice_request()
    };
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    match transactid.is_invoice_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificate(reason) => assert!(reason.contains("revoked"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unreachable_crl_fails_closed() {
    let transactid = TransactId::builder()
        .crl_fetcher(Arc::new(StaticCrlFetcher::new()))
        .build()
        .unwrap();
    let parameters = InvoiceRequestParameters {
        sender_parameters: x509_sender(REVOKED_KEY, REVOKED_BUNDLE),
        ..signed_invoice_request()
    };
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    let err = transactid.is_invoice_request_valid(&bytes, None).unwrap_err();
    assert!(matches!(err, TransactIdError::InvalidCertificate(_)));
}

// ---------------------------------------------------------------------------
// 3. Encryption
// ---------------------------------------------------------------------------

#[test]
fn encrypted_invoice_request_round_trips() {
    let transactid = transactid();
    let (bytes, recipient) = encrypted_invoice_request();

    let metadata = transactid.get_protocol_message_metadata(&bytes).unwrap();
    assert!(metadata.encrypted);
    assert!(metadata.nonce.is_some());
    assert_eq!(metadata.sender_public_key_pem.as_deref(), Some(SENDER_EC_PUB));
    assert_eq!(metadata.recipient_public_key_pem.as_deref(), Some(RECIPIENT_EC_PUB));

    assert!(transactid
        .is_invoice_request_valid(&bytes, Some(&recipient))
        .unwrap());
    let parsed = transactid.parse_invoice_request(&bytes, Some(&recipient)).unwrap();
    assert_eq!(parsed.amount, 1000);
    assert!(parsed.protocol_message_metadata.unwrap().encrypted);
}

#[test]
fn encrypted_message_needs_recipient_private_key() {
    let transactid = transactid();
    let (bytes, _) = encrypted_invoice_request();
    let err = transactid.parse_invoice_request(&bytes, None).unwrap_err();
    assert!(matches!(
        err,
        TransactIdError::Encryption(EncryptionError::MissingRecipientPrivateKey)
    ));
}

#[test]
fn encrypted_message_unreadable_by_stranger() {
    let transactid = transactid();
    let (bytes, _) = encrypted_invoice_request();
    let stranger = RecipientParameters {
        encryption_parameters: Some(EncryptionParameters::new(
            RECIPIENT_EC_PUB,
            Some(STRANGER_EC_KEY.into()),
        )),
        ..Default::default()
    };
    assert!(transactid.parse_invoice_request(&bytes, Some(&stranger)).is_err());
}

#[test]
fn encrypted_envelope_tamper_breaks_envelope_signature() {
    let transactid = transactid();
    let (bytes, recipient) = encrypted_invoice_request();
    let mut envelope = Envelope::decode(&bytes).unwrap();
    let Envelope::Encrypted(encrypted) = &mut envelope else {
        panic!("expected an encrypted envelope");
    };
    encrypted.identifier = "forged".into();
    let tampered = envelope.encode().unwrap();

    match transactid
        .is_invoice_request_valid(&tampered, Some(&recipient))
        .unwrap_err()
    {
        TransactIdError::InvalidSignature(reason) => assert_eq!(reason, "sender signature invalid"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn encryption_requires_keys() {
    let transactid = transactid();
    let encrypt = MessageInformation {
        encrypt_message: true,
        ..Default::default()
    };

    let no_recipient = InvoiceRequestParameters {
        message_information: encrypt.clone(),
        ..signed_invoice_request()
    };
    let err = transactid.create_invoice_request(&no_recipient, None).unwrap_err();
    assert!(matches!(err, TransactIdError::Encryption(EncryptionError::MissingRecipientKeys)));

    let (_, addressed_to, _) = encryption_setup();
    let no_sender_keys = InvoiceRequestParameters {
        recipient_parameters: Some(addressed_to.clone()),
        message_information: encrypt.clone(),
        ..signed_invoice_request()
    };
    let err = transactid.create_invoice_request(&no_sender_keys, None).unwrap_err();
    assert!(matches!(err, TransactIdError::Encryption(EncryptionError::MissingSenderKeys)));

    let rsa_sender_key = InvoiceRequestParameters {
        sender_parameters: SenderParameters {
            encryption_parameters: Some(EncryptionParameters::new(
                SENDER_EC_PUB,
                Some(SENDER_KEY.into()),
            )),
            ..x509_sender(SENDER_KEY, SENDER_BUNDLE)
        },
        recipient_parameters: Some(addressed_to),
        message_information: encrypt,
        ..signed_invoice_request()
    };
    let err = transactid.create_invoice_request(&rsa_sender_key, None).unwrap_err();
    assert!(matches!(err, TransactIdError::Encryption(EncryptionError::IncorrectKeyFormat)));
}

// ---------------------------------------------------------------------------
// 4. Status changes
// ---------------------------------------------------------------------------

#[test]
fn change_status_keeps_everything_else() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let before = transactid.get_protocol_message_metadata(&bytes).unwrap();

    let changed = transactid
        .change_status_protocol_message(&bytes, StatusCode::Cancel, "Cancel by user")
        .unwrap();
    let after = transactid.get_protocol_message_metadata(&changed).unwrap();

    assert_eq!(after.status_code, StatusCode::Cancel);
    assert_eq!(after.status_message, "Cancel by user");
    assert_eq!(after.identifier, before.identifier);
    assert_eq!(after.message_type, before.message_type);
    assert!(transactid.is_invoice_request_valid(&changed, None).unwrap());
    assert_eq!(
        transactid.parse_invoice_request(&changed, None).unwrap().amount,
        1000
    );
}

#[test]
fn change_status_on_encrypted_message_keeps_signature_valid() {
    let transactid = transactid();
    let (bytes, recipient) = encrypted_invoice_request();
    let before = transactid.get_protocol_message_metadata(&bytes).unwrap();

    let changed = transactid
        .change_status_protocol_message(&bytes, StatusCode::AmountTooHigh, "too much")
        .unwrap();
    let after = transactid.get_protocol_message_metadata(&changed).unwrap();

    assert_eq!(after.status_code, StatusCode::AmountTooHigh);
    assert_eq!(after.identifier, before.identifier);
    assert_eq!(after.nonce, before.nonce);
    assert_eq!(after.signature, before.signature);
    assert_eq!(after.encrypted_message, before.encrypted_message);
    assert!(transactid
        .is_invoice_request_valid(&changed, Some(&recipient))
        .unwrap());
}

#[test]
fn initial_status_comes_from_message_information() {
    let transactid = transactid();
    let parameters = InvoiceRequestParameters {
        message_information: MessageInformation {
            status_code: StatusCode::CertificateRequired,
            status_message: "send a certificate".into(),
            encrypt_message: false,
        },
        ..signed_invoice_request()
    };
    let bytes = transactid.create_invoice_request(&parameters, None).unwrap();
    let metadata = transactid.get_protocol_message_metadata(&bytes).unwrap();
    assert_eq!(metadata.status_code, StatusCode::CertificateRequired);
    assert_eq!(metadata.status_message, "send a certificate");
}

// ---------------------------------------------------------------------------
// 5. PaymentRequest
// ---------------------------------------------------------------------------

fn payment_request_parameters() -> PaymentRequestParameters {
    PaymentRequestParameters {
        network: "test".into(),
        beneficiaries_addresses: outputs(),
        time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        expires: Some(Utc.timestamp_opt(1_700_003_600, 0).unwrap()),
        memo: "pay here".into(),
        payment_url: "https://pay.vasp.test".into(),
        merchant_data: "order-7".into(),
        beneficiary_parameters: vec![owner(
            true,
            vec![x509(Attestation::LegalPersonName, BENEFICIARY_KEY, BENEFICIARY_BUNDLE)],
        )],
        sender_parameters: x509_sender(SENDER_KEY, SENDER_BUNDLE),
        attestations_requested: vec![Attestation::LegalPersonName],
        ..Default::default()
    }
}

#[test]
fn payment_request_round_trips() {
    let transactid = transactid();
    let bytes = transactid
        .create_payment_request(&payment_request_parameters(), None)
        .unwrap();
    assert!(transactid.is_payment_request_valid(&bytes, None).unwrap());

    let parsed = transactid.parse_payment_request(&bytes, None).unwrap();
    assert_eq!(parsed.network, "test");
    assert_eq!(parsed.beneficiaries_addresses, outputs());
    assert_eq!(parsed.time, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    assert_eq!(parsed.expires, Some(Utc.timestamp_opt(1_700_003_600, 0).unwrap()));
    assert_eq!(parsed.merchant_data, "order-7");
    assert!(parsed.is_expired_at(Utc.timestamp_opt(1_700_003_601, 0).unwrap()));
    assert!(!parsed.is_expired_at(Utc.timestamp_opt(1_700_000_001, 0).unwrap()));
}

#[test]
fn payment_request_expiry_before_epoch_rejected() {
    let transactid = transactid();
    let parameters = PaymentRequestParameters {
        expires: Some(Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap()),
        ..payment_request_parameters()
    };
    let err = transactid.create_payment_request(&parameters, None).unwrap_err();
    assert!(
        matches!(err, TransactIdError::InvalidObject { ref message_type, .. } if message_type == "PaymentDetails"),
        "{err:?}"
    );
}

#[test]
fn payment_request_requires_beneficiaries() {
    let transactid = transactid();
    let parameters = PaymentRequestParameters {
        beneficiary_parameters: Vec::new(),
        ..payment_request_parameters()
    };
    let err = transactid.create_payment_request(&parameters, None).unwrap_err();
    assert!(matches!(
        err,
        TransactIdError::InvalidOwners(OwnerValidationError::Empty(OwnerType::Beneficiary))
    ));
}

#[test]
fn payment_request_with_rogue_beneficiary_rejected() {
    let transactid = transactid();
    let mut parameters = payment_request_parameters();
    parameters.beneficiary_parameters[0].pki_data_parameters_sets[0].certificate_pem =
        ROGUE_CERT.into();
    let bytes = transactid.create_payment_request(&parameters, None).unwrap();
    match transactid.is_payment_request_valid(&bytes, None).unwrap_err() {
        TransactIdError::InvalidCertificateChain(reason) => {
            assert!(reason.contains("beneficiary"), "{reason}");
            assert!(reason.contains("LEGAL_PERSON_NAME"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 6. Payment and PaymentAck
// ---------------------------------------------------------------------------

fn payment_parameters() -> PaymentParameters {
    PaymentParameters {
        merchant_data: Some("order-7".into()),
        transactions: vec![vec![0x01, 0x02, 0x03], vec![0xaa; 32]],
        outputs: outputs(),
        memo: Some("refund here".into()),
        originator_parameters: vec![owner(
            true,
            vec![x509(Attestation::LegalPersonName, ORIGINATOR_KEY, ORIGINATOR_BUNDLE)],
        )],
        beneficiary_parameters: vec![owner(true, vec![no_pki(Attestation::LegalPersonName)])],
        ..Default::default()
    }
}

#[test]
fn payment_round_trips() {
    let transactid = transactid();
    let bytes = transactid.create_payment(&payment_parameters(), None).unwrap();
    assert!(transactid.is_payment_valid(&bytes, None).unwrap());

    let parsed = transactid.parse_payment(&bytes, None).unwrap();
    assert_eq!(parsed.transactions.len(), 2);
    assert_eq!(parsed.outputs, outputs());
    assert_eq!(parsed.memo.as_deref(), Some("refund here"));
    assert!(!parsed.originators[0].pki_data_set[0].signature.is_empty());
}

#[test]
fn payment_without_owners_is_valid() {
    let transactid = transactid();
    let parameters = PaymentParameters {
        transactions: vec![vec![0x42]],
        ..Default::default()
    };
    let bytes = transactid.create_payment(&parameters, None).unwrap();
    assert!(transactid.is_payment_valid(&bytes, None).unwrap());
    let parsed = transactid.parse_payment(&bytes, None).unwrap();
    assert!(parsed.originators.is_empty());
    assert!(parsed.merchant_data.is_none());
}

#[test]
fn payment_ack_validates_embedded_payment() {
    let transactid = transactid();
    let payment_bytes = transactid.create_payment(&payment_parameters(), None).unwrap();
    let payment = transactid.parse_payment(&payment_bytes, None).unwrap();

    let ack = PaymentAckParameters {
        payment: payment.clone(),
        memo: "thanks".into(),
        sender_parameters: SenderParameters::default(),
        recipient_parameters: None,
        message_information: MessageInformation::default(),
    };
    let bytes = transactid.create_payment_ack(&ack, None).unwrap();
    assert!(transactid.is_payment_ack_valid(&bytes, None).unwrap());

    let parsed = transactid.parse_payment_ack(&bytes, None).unwrap();
    assert_eq!(parsed.memo, "thanks");
    assert_eq!(parsed.payment.transactions, payment.transactions);
    assert!(parsed.payment.protocol_message_metadata.is_none());

    let mut rogue = payment;
    rogue.originators[0].pki_data_set[0].certificate_pem = ROGUE_CERT.into();
    let rogue_ack = PaymentAckParameters {
        payment: rogue,
        ..ack
    };
    let bytes = transactid.create_payment_ack(&rogue_ack, None).unwrap();
    let err = transactid.is_payment_ack_valid(&bytes, None).unwrap_err();
    assert!(matches!(err, TransactIdError::InvalidCertificateChain(_)));
}

// ---------------------------------------------------------------------------
// 7. Address information
// ---------------------------------------------------------------------------

#[test]
fn invoice_request_outputs_get_address_information() {
    let transactid = TransactId::builder()
        .crl_fetcher(Arc::new(StaticCrlFetcher::new()))
        .address_information_service(Arc::new(FixedRisk(0.25)))
        .build()
        .unwrap();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();

    let parsed = transactid
        .parse_invoice_request_with_addresses_info(&bytes, None)
        .unwrap();
    for output in &parsed.originators_addresses {
        let info = output.address_information.as_ref().unwrap();
        assert_eq!(info.risk_score, Some(0.25));
        assert_eq!(
            info.identifier.as_deref(),
            Some(format!("{}:{}", output.currency, output.script).as_str())
        );
    }
}

#[test]
fn payment_request_outputs_get_address_information() {
    let transactid = TransactId::builder()
        .crl_fetcher(Arc::new(StaticCrlFetcher::new()))
        .address_information_service(Arc::new(FixedRisk(0.9)))
        .build()
        .unwrap();
    let bytes = transactid
        .create_payment_request(&payment_request_parameters(), None)
        .unwrap();
    let parsed = transactid
        .parse_payment_request_with_addresses_info(&bytes, None)
        .unwrap();
    assert!(parsed
        .beneficiaries_addresses
        .iter()
        .all(|output| output.address_information.is_some()));
}

#[test]
fn address_lookups_unsupported_without_service_or_addresses() {
    let transactid = transactid();
    let invoice = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    assert!(matches!(
        transactid
            .parse_invoice_request_with_addresses_info(&invoice, None)
            .unwrap_err(),
        TransactIdError::UnsupportedOperation(_)
    ));

    let payment = transactid.create_payment(&payment_parameters(), None).unwrap();
    assert!(matches!(
        transactid
            .parse_payment_with_addresses_info(&payment, None)
            .unwrap_err(),
        TransactIdError::UnsupportedOperation(_)
    ));
}

#[test]
fn address_lookup_failure_surfaces() {
    let transactid = TransactId::builder()
        .crl_fetcher(Arc::new(StaticCrlFetcher::new()))
        .address_information_service(Arc::new(FailingLookup))
        .build()
        .unwrap();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let err = transactid
        .parse_invoice_request_with_addresses_info(&bytes, None)
        .unwrap_err();
    assert!(matches!(err, TransactIdError::AddressInformation(_)));
}

// ---------------------------------------------------------------------------
// 8. Dispatch and malformed input
// ---------------------------------------------------------------------------

#[test]
fn wrong_message_type_is_invalid_object() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let err = transactid.parse_payment(&bytes, None).unwrap_err();
    assert!(matches!(err, TransactIdError::InvalidObject { ref message_type, .. } if message_type == "Payment"));
    assert!(transactid.is_payment_request_valid(&bytes, None).is_err());
}

#[test]
fn any_message_dispatches_on_envelope_type() {
    let transactid = transactid();
    let invoice = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let payment = transactid.create_payment(&payment_parameters(), None).unwrap();

    let parsed = transactid.parse_protocol_message(&invoice, None).unwrap();
    assert_eq!(parsed.message_type(), MessageType::InvoiceRequest);
    assert!(matches!(parsed, ProtocolMessageKind::InvoiceRequest(ref m) if m.amount == 1000));
    assert!(parsed.metadata().is_some());

    let parsed = transactid.parse_protocol_message(&payment, None).unwrap();
    assert_eq!(parsed.message_type(), MessageType::Payment);
    assert!(transactid.is_protocol_message_valid(&payment, None).unwrap());
}

#[test]
fn truncated_bytes_are_invalid_object() {
    let transactid = transactid();
    let bytes = transactid
        .create_invoice_request(&signed_invoice_request(), None)
        .unwrap();
    let err = transactid
        .parse_invoice_request(&bytes[..bytes.len() / 2], None)
        .unwrap_err();
    assert!(matches!(err, TransactIdError::InvalidObject { .. }));
}
