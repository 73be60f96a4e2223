#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Encryption handshake tests: the cipher is installed only when the verify
//! token round-trips intact, and never otherwise.

use std::sync::Arc;

use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

use craft_protocol::config::{StatusConfig, MAILBOX_CAPACITY};
use craft_protocol::error::ProtocolError;
use craft_protocol::protocol::messages::{ClientboundMessage, ServerboundMessage};
use craft_protocol::protocol::ProtocolState;
use craft_protocol::server::handlers::{PacketHandler, VanillaHandler};
use craft_protocol::server::session::{SessionCommand, SessionHandle};
use craft_protocol::utils::crypto::ServerKeypair;

struct LoginExchange {
    handler: VanillaHandler,
    handle: SessionHandle,
    rx: tokio::sync::mpsc::Receiver<SessionCommand>,
    public_key: RsaPublicKey,
    verify_token: Vec<u8>,
}

/// Drives handshake + login start and captures the encryption request the
/// server hands back.
fn start_login() -> LoginExchange {
    let keypair = Arc::new(ServerKeypair::generate().unwrap());
    let mut handler = VanillaHandler::new(keypair, StatusConfig::default());
    let (handle, mut rx) = SessionHandle::channel(MAILBOX_CAPACITY);

    handler
        .handle(
            ProtocolState::Handshaking,
            ServerboundMessage::Handshake {
                protocol_version: 767,
                server_address: "localhost".into(),
                server_port: 25565,
                next_state: 2,
            },
            &handle,
        )
        .unwrap();
    assert!(matches!(
        rx.try_recv().unwrap(),
        SessionCommand::ChangeState(ProtocolState::Login)
    ));

    handler
        .handle(
            ProtocolState::Login,
            ServerboundMessage::LoginStart {
                name: "steve".into(),
                player_uuid: uuid::Uuid::from_u128(42),
            },
            &handle,
        )
        .unwrap();

    let (public_key_der, verify_token) = match rx.try_recv().unwrap() {
        SessionCommand::Send(ClientboundMessage::EncryptionRequest {
            public_key,
            verify_token,
            should_authenticate,
            ..
        }) => {
            assert!(!should_authenticate);
            (public_key, verify_token)
        }
        other => panic!("expected encryption request, got {other:?}"),
    };

    let public_key = RsaPublicKey::from_public_key_der(&public_key_der).unwrap();

    LoginExchange {
        handler,
        handle,
        rx,
        public_key,
        verify_token,
    }
}

fn rsa_encrypt(public_key: &RsaPublicKey, data: &[u8]) -> Vec<u8> {
    public_key
        .encrypt(&mut rand::rngs::OsRng, Pkcs1v15Encrypt, data)
        .unwrap()
}

#[test]
fn matching_verify_token_activates_encryption() {
    let mut exchange = start_login();
    let shared_secret = [0x42u8; 16];

    exchange
        .handler
        .handle(
            ProtocolState::Login,
            ServerboundMessage::EncryptionResponse {
                shared_secret: rsa_encrypt(&exchange.public_key, &shared_secret),
                verify_token: rsa_encrypt(&exchange.public_key, &exchange.verify_token),
            },
            &exchange.handle,
        )
        .unwrap();

    // cipher installation first, then the encrypted success message
    match exchange.rx.try_recv().unwrap() {
        SessionCommand::EnableEncryption(secret) => assert_eq!(*secret, shared_secret),
        other => panic!("expected EnableEncryption first, got {other:?}"),
    }
    match exchange.rx.try_recv().unwrap() {
        SessionCommand::Send(ClientboundMessage::LoginSuccess {
            username,
            player_uuid,
            ..
        }) => {
            assert_eq!(username, "steve");
            assert_eq!(player_uuid, uuid::Uuid::from_u128(42));
        }
        other => panic!("expected LoginSuccess, got {other:?}"),
    }
}

#[test]
fn mismatched_verify_token_installs_no_cipher() {
    let mut exchange = start_login();
    let shared_secret = [0x42u8; 16];
    let mut wrong_token = exchange.verify_token.clone();
    wrong_token[0] ^= 0xFF;

    let result = exchange.handler.handle(
        ProtocolState::Login,
        ServerboundMessage::EncryptionResponse {
            shared_secret: rsa_encrypt(&exchange.public_key, &shared_secret),
            verify_token: rsa_encrypt(&exchange.public_key, &wrong_token),
        },
        &exchange.handle,
    );

    assert!(matches!(result, Err(ProtocolError::VerifyTokenMismatch)));
    // no command of any kind was issued
    assert!(exchange.rx.try_recv().is_err());
}

#[test]
fn garbage_ciphertext_installs_no_cipher() {
    let mut exchange = start_login();

    let result = exchange.handler.handle(
        ProtocolState::Login,
        ServerboundMessage::EncryptionResponse {
            shared_secret: vec![0u8; 128],
            verify_token: vec![0u8; 128],
        },
        &exchange.handle,
    );

    assert!(matches!(result, Err(ProtocolError::DecryptionFailure)));
    assert!(exchange.rx.try_recv().is_err());
}

#[test]
fn wrong_secret_length_is_rejected() {
    let mut exchange = start_login();

    let result = exchange.handler.handle(
        ProtocolState::Login,
        ServerboundMessage::EncryptionResponse {
            shared_secret: rsa_encrypt(&exchange.public_key, &[0x42u8; 8]),
            verify_token: rsa_encrypt(&exchange.public_key, &exchange.verify_token),
        },
        &exchange.handle,
    );

    assert!(matches!(
        result,
        Err(ProtocolError::InvalidSecretLength(8))
    ));
    assert!(exchange.rx.try_recv().is_err());
}

#[test]
fn encryption_response_without_login_start_fails() {
    let keypair = Arc::new(ServerKeypair::generate().unwrap());
    let mut handler = VanillaHandler::new(keypair, StatusConfig::default());
    let (handle, _rx) = SessionHandle::channel(MAILBOX_CAPACITY);

    // a client skipping login start cannot reach the encrypted phase; the
    // token it would need was never sent, so any response fails
    let result = handler.handle(
        ProtocolState::Login,
        ServerboundMessage::EncryptionResponse {
            shared_secret: vec![0u8; 128],
            verify_token: vec![0u8; 128],
        },
        &handle,
    );
    assert!(result.is_err());
}
