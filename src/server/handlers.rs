//! # Message Handlers
//!
//! Business logic for the registered message shapes.
//!
//! Handlers receive the current protocol state and the decoded message, and
//! may only act on the connection through the [`SessionHandle`]: state
//! transitions and outbound sends go through the mailbox, never the socket.
//! A handler error terminates the connection.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::StatusConfig;
use crate::error::{ProtocolError, Result};
use crate::protocol::chat::{Chat, ChatColor};
use crate::protocol::messages::{ClientboundMessage, ServerboundMessage};
use crate::protocol::ProtocolState;
use crate::server::session::SessionHandle;
use crate::utils::crypto::{ServerKeypair, SHARED_SECRET_LEN};

/// The seam between the protocol core and message business logic.
pub trait PacketHandler: Send + 'static {
    /// Reacts to one decoded message. Requests against the connection go
    /// through `session`; returning an error closes the connection.
    fn handle(
        &mut self,
        state: ProtocolState,
        message: ServerboundMessage,
        session: &SessionHandle,
    ) -> Result<()>;
}

/// JSON payload of the status (server list) response.
#[derive(Serialize)]
struct StatusPayload {
    version: StatusVersion,
    players: StatusPlayers,
    description: Chat,
}

#[derive(Serialize)]
struct StatusVersion {
    name: String,
    protocol: i32,
}

#[derive(Serialize)]
struct StatusPlayers {
    max: u32,
    online: u32,
}

/// The shipped handler: status pings plus the encrypted login flow up to the
/// Configuration state.
pub struct VanillaHandler {
    keypair: Arc<ServerKeypair>,
    status: StatusConfig,
    verify_token: [u8; 4],
    alleged_name: Option<String>,
    alleged_uuid: Option<Uuid>,
}

impl VanillaHandler {
    pub fn new(keypair: Arc<ServerKeypair>, status: StatusConfig) -> Self {
        // fresh token per connection; echoed back under RSA during login
        let mut verify_token = [0u8; 4];
        OsRng.fill_bytes(&mut verify_token);

        Self {
            keypair,
            status,
            verify_token,
            alleged_name: None,
            alleged_uuid: None,
        }
    }

    fn status_json(&self) -> Result<String> {
        let payload = StatusPayload {
            version: StatusVersion {
                name: self.status.version_name.clone(),
                protocol: self.status.protocol_version,
            },
            players: StatusPlayers {
                max: self.status.max_players,
                online: 0,
            },
            description: Chat::new().text(self.status.motd.clone()),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    fn on_encryption_response(
        &mut self,
        shared_secret: &[u8],
        verify_token: &[u8],
        session: &SessionHandle,
    ) -> Result<()> {
        let token = self.keypair.decrypt(verify_token)?;
        if token != self.verify_token {
            return Err(ProtocolError::VerifyTokenMismatch);
        }

        let secret = Zeroizing::new(self.keypair.decrypt(shared_secret)?);
        if secret.len() != SHARED_SECRET_LEN {
            return Err(ProtocolError::InvalidSecretLength(secret.len()));
        }
        let mut key = Zeroizing::new([0u8; SHARED_SECRET_LEN]);
        key.copy_from_slice(&secret);

        let name = self
            .alleged_name
            .clone()
            .ok_or_else(|| ProtocolError::Handshake("encryption response before login start".into()))?;
        let player_uuid = self
            .alleged_uuid
            .ok_or_else(|| ProtocolError::Handshake("encryption response before login start".into()))?;

        // install the cipher first so the success packet goes out encrypted
        session.enable_encryption(key)?;
        session.send_message(ClientboundMessage::LoginSuccess {
            player_uuid,
            username: name,
            properties: vec![],
            strict_error_handling: false,
        })
    }
}

impl PacketHandler for VanillaHandler {
    fn handle(
        &mut self,
        state: ProtocolState,
        message: ServerboundMessage,
        session: &SessionHandle,
    ) -> Result<()> {
        debug!(state = %state, name = message.name(), "handling message");

        match message {
            ServerboundMessage::Handshake {
                protocol_version,
                next_state,
                ..
            } => {
                let next = ProtocolState::from_next_state(next_state)?;
                debug!(protocol_version, next = %next, "handshake");
                session.change_state(next)
            }

            ServerboundMessage::StatusRequest => {
                session.send_message(ClientboundMessage::StatusResponse {
                    json: self.status_json()?,
                })
            }

            ServerboundMessage::StatusPing { challenge } => {
                session.send_message(ClientboundMessage::StatusPong { challenge })
            }

            ServerboundMessage::LoginStart { name, player_uuid } => {
                info!(player = %name, uuid = %player_uuid, "login start");
                self.alleged_name = Some(name);
                self.alleged_uuid = Some(player_uuid);

                session.send_message(ClientboundMessage::EncryptionRequest {
                    server_id: String::new(),
                    public_key: self.keypair.public_key_der().to_vec(),
                    verify_token: self.verify_token.to_vec(),
                    should_authenticate: false,
                })
            }

            ServerboundMessage::EncryptionResponse {
                shared_secret,
                verify_token,
            } => self.on_encryption_response(&shared_secret, &verify_token, session),

            ServerboundMessage::LoginAcknowledged => {
                session.change_state(ProtocolState::Configuration)?;

                // no Play state here; configuration ends the shipped flow
                let reason = Chat::new()
                    .text("Login complete. ")
                    .color(ChatColor::Aqua)
                    .add_extra(Chat::new().text("This server does not accept players yet."))
                    .to_nbt()?;
                session.send_message(ClientboundMessage::ConfigurationDisconnect { reason })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::MAILBOX_CAPACITY;
    use crate::server::session::SessionCommand;
    use tokio::sync::mpsc;

    fn test_handle() -> (SessionHandle, mpsc::Receiver<SessionCommand>) {
        SessionHandle::channel(MAILBOX_CAPACITY)
    }

    #[test]
    fn status_request_sends_configured_motd() {
        let keypair = Arc::new(ServerKeypair::generate().unwrap());
        let mut handler = VanillaHandler::new(keypair, StatusConfig::default());
        let (handle, mut rx) = test_handle();

        handler
            .handle(
                ProtocolState::Status,
                ServerboundMessage::StatusRequest,
                &handle,
            )
            .unwrap();

        match rx.try_recv().unwrap() {
            SessionCommand::Send(ClientboundMessage::StatusResponse { json }) => {
                assert!(json.contains("A craft-protocol server"));
                assert!(json.contains("\"protocol\":767"));
            }
            other => panic!("expected status response, got {other:?}"),
        }
    }

    #[test]
    fn ping_echoes_challenge() {
        let keypair = Arc::new(ServerKeypair::generate().unwrap());
        let mut handler = VanillaHandler::new(keypair, StatusConfig::default());
        let (handle, mut rx) = test_handle();

        handler
            .handle(
                ProtocolState::Status,
                ServerboundMessage::StatusPing { challenge: 777 },
                &handle,
            )
            .unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionCommand::Send(ClientboundMessage::StatusPong { challenge: 777 })
        ));
    }

    #[test]
    fn handshake_requests_declared_state() {
        let keypair = Arc::new(ServerKeypair::generate().unwrap());
        let mut handler = VanillaHandler::new(keypair, StatusConfig::default());
        let (handle, mut rx) = test_handle();

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
    }

    #[test]
    fn invalid_next_state_is_an_error() {
        let keypair = Arc::new(ServerKeypair::generate().unwrap());
        let mut handler = VanillaHandler::new(keypair, StatusConfig::default());
        let (handle, _rx) = test_handle();

        let result = handler.handle(
            ProtocolState::Handshaking,
            ServerboundMessage::Handshake {
                protocol_version: 767,
                server_address: "localhost".into(),
                server_port: 25565,
                next_state: 9,
            },
            &handle,
        );
        assert!(matches!(result, Err(ProtocolError::InvalidNextState(9))));
    }
}
