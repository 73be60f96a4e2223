//! # Message Registry
//!
//! Maps `(state, id)` keys to inbound schemas and message identities to
//! outbound registrations, and drives the generic schema codec for both
//! directions.
//!
//! The registry is built explicitly during process initialization by
//! [`Registry::vanilla`], which enumerates every known schema. There is no
//! load-time self-registration, so there are no load-order dependencies.
//! Registering the same key twice is a startup error, not a runtime one.

use std::collections::HashMap;

use tracing::debug;

use crate::core::buffer::ByteBuffer;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::protocol::messages::{ClientboundMessage, ServerboundMessage};
use crate::protocol::schema::{FieldSpec, FieldType, MessageSchema};
use crate::protocol::ProtocolState;

struct OutboundEntry {
    id: i32,
    schema: MessageSchema,
}

/// Two one-way lookup tables over message schemas.
pub struct Registry {
    inbound: HashMap<(ProtocolState, i32), MessageSchema>,
    outbound: HashMap<&'static str, OutboundEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inbound: HashMap::new(),
            outbound: HashMap::new(),
        }
    }

    /// Registers an inbound schema under `(state, id)`.
    pub fn register_inbound(
        &mut self,
        state: ProtocolState,
        id: i32,
        schema: MessageSchema,
    ) -> Result<()> {
        if self.inbound.insert((state, id), schema).is_some() {
            return Err(ProtocolError::DuplicateInbound { state, id });
        }
        Ok(())
    }

    /// Registers an outbound schema under its message identity.
    pub fn register_outbound(&mut self, id: i32, schema: MessageSchema) -> Result<()> {
        let name = schema.name;
        if self
            .outbound
            .insert(name, OutboundEntry { id, schema })
            .is_some()
        {
            return Err(ProtocolError::DuplicateOutbound(name));
        }
        Ok(())
    }

    /// Decodes a de-framed packet against the schema registered for the
    /// connection's current state.
    pub fn decode_inbound(&self, state: ProtocolState, packet: &Packet) -> Result<ServerboundMessage> {
        let schema = self
            .inbound
            .get(&(state, packet.id))
            .ok_or(ProtocolError::UnknownPacket {
                state,
                id: packet.id,
            })?;

        debug!(name = schema.name, state = %state, id = packet.id, "decoding packet");

        let mut buf = ByteBuffer::from_bytes(packet.body.clone());
        let fields = schema.decode(&mut buf)?;
        ServerboundMessage::from_fields(schema.name, fields)
    }

    /// Encodes a message into a packet whose id comes from the outbound
    /// registration.
    pub fn encode_outbound(&self, message: &ClientboundMessage) -> Result<Packet> {
        let entry = self
            .outbound
            .get(message.name())
            .ok_or(ProtocolError::UnregisteredMessage(message.name()))?;

        let fields = message.to_fields()?;
        let body = entry.schema.encode(&fields)?;
        Ok(Packet::new(entry.id, body.into_inner()))
    }

    /// The full vanilla schema set: every message the server understands,
    /// with protocol-defined ids and field orders.
    pub fn vanilla() -> Result<Self> {
        use FieldType::*;

        let mut registry = Self::new();

        registry.register_inbound(
            ProtocolState::Handshaking,
            0x00,
            MessageSchema::new(
                "handshake",
                vec![
                    FieldSpec::new("protocol_version", VarInt),
                    FieldSpec::new("server_address", String),
                    FieldSpec::new("server_port", UShort),
                    FieldSpec::new("next_state", VarInt),
                ],
            ),
        )?;
        registry.register_inbound(
            ProtocolState::Status,
            0x00,
            MessageSchema::new("status_request", vec![]),
        )?;
        registry.register_inbound(
            ProtocolState::Status,
            0x01,
            MessageSchema::new("status_ping", vec![FieldSpec::new("challenge", Long)]),
        )?;
        registry.register_inbound(
            ProtocolState::Login,
            0x00,
            MessageSchema::new(
                "login_start",
                vec![
                    FieldSpec::new("name", String),
                    FieldSpec::new("player_uuid", Uuid),
                ],
            ),
        )?;
        registry.register_inbound(
            ProtocolState::Login,
            0x01,
            MessageSchema::new(
                "encryption_response",
                vec![
                    FieldSpec::new("shared_secret", FieldType::seq(UByte)),
                    FieldSpec::new("verify_token", FieldType::seq(UByte)),
                ],
            ),
        )?;
        registry.register_inbound(
            ProtocolState::Login,
            0x03,
            MessageSchema::new("login_acknowledged", vec![]),
        )?;

        registry.register_outbound(
            0x00,
            MessageSchema::new("status_response", vec![FieldSpec::new("json", String)]),
        )?;
        registry.register_outbound(
            0x01,
            MessageSchema::new("status_pong", vec![FieldSpec::new("challenge", Long)]),
        )?;
        registry.register_outbound(
            0x00,
            MessageSchema::new("login_disconnect", vec![FieldSpec::new("reason", String)]),
        )?;
        registry.register_outbound(
            0x01,
            MessageSchema::new(
                "encryption_request",
                vec![
                    FieldSpec::new("server_id", String),
                    FieldSpec::new("public_key", FieldType::seq(UByte)),
                    FieldSpec::new("verify_token", FieldType::seq(UByte)),
                    FieldSpec::new("should_authenticate", Bool),
                ],
            ),
        )?;
        registry.register_outbound(
            0x02,
            MessageSchema::new(
                "login_success",
                vec![
                    FieldSpec::new("player_uuid", Uuid),
                    FieldSpec::new("username", String),
                    FieldSpec::new(
                        "properties",
                        FieldType::seq(Group(vec![
                            FieldSpec::new("name", String),
                            FieldSpec::new("value", String),
                            FieldSpec::new("signature", FieldType::optional(String)),
                        ])),
                    ),
                    FieldSpec::new("strict_error_handling", Bool),
                ],
            ),
        )?;
        registry.register_outbound(
            0x02,
            MessageSchema::new(
                "configuration_disconnect",
                vec![FieldSpec::new("reason", Nbt)],
            ),
        )?;

        Ok(registry)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::chat::Chat;

    #[test]
    fn vanilla_registry_builds() {
        assert!(Registry::vanilla().is_ok());
    }

    #[test]
    fn duplicate_inbound_registration_fails_fast() {
        let mut registry = Registry::new();
        registry
            .register_inbound(
                ProtocolState::Status,
                0x00,
                MessageSchema::new("status_request", vec![]),
            )
            .unwrap();
        assert!(matches!(
            registry.register_inbound(
                ProtocolState::Status,
                0x00,
                MessageSchema::new("other", vec![]),
            ),
            Err(ProtocolError::DuplicateInbound { .. })
        ));
    }

    #[test]
    fn unknown_packet_is_a_structured_error() {
        let registry = Registry::vanilla().unwrap();
        let packet = Packet::new(0x7F, vec![]);
        assert!(matches!(
            registry.decode_inbound(ProtocolState::Status, &packet),
            Err(ProtocolError::UnknownPacket {
                state: ProtocolState::Status,
                id: 0x7F
            })
        ));
    }

    #[test]
    fn decodes_handshake_from_wire_bytes() {
        let registry = Registry::vanilla().unwrap();
        let mut body = ByteBuffer::new();
        body.write_var_int(767);
        body.write_string("example.com");
        body.write_u16(25565);
        body.write_var_int(2);

        let packet = Packet::new(0x00, body.into_inner());
        let message = registry
            .decode_inbound(ProtocolState::Handshaking, &packet)
            .unwrap();
        assert_eq!(
            message,
            ServerboundMessage::Handshake {
                protocol_version: 767,
                server_address: "example.com".into(),
                server_port: 25565,
                next_state: 2,
            }
        );
    }

    #[test]
    fn pong_encodes_under_registered_id() {
        let registry = Registry::vanilla().unwrap();
        let packet = registry
            .encode_outbound(&ClientboundMessage::StatusPong { challenge: -9 })
            .unwrap();
        assert_eq!(packet.id, 0x01);
        assert_eq!(packet.body, (-9i64).to_be_bytes());
    }

    #[test]
    fn login_disconnect_carries_chat_json() {
        let registry = Registry::vanilla().unwrap();
        let packet = registry
            .encode_outbound(&ClientboundMessage::LoginDisconnect {
                reason: Chat::new().text("bye"),
            })
            .unwrap();
        assert_eq!(packet.id, 0x00);
        let mut body = ByteBuffer::from_bytes(packet.body);
        assert_eq!(body.read_string().unwrap(), r#"{"text":"bye"}"#);
    }

    #[test]
    fn login_success_round_trips_through_its_own_schema() {
        let registry = Registry::vanilla().unwrap();
        let message = ClientboundMessage::LoginSuccess {
            player_uuid: uuid::Uuid::from_u128(7),
            username: "steve".into(),
            properties: vec![crate::protocol::messages::ProfileProperty {
                name: "textures".into(),
                value: "v".into(),
                signature: None,
            }],
            strict_error_handling: false,
        };
        let packet = registry.encode_outbound(&message).unwrap();
        assert_eq!(packet.id, 0x02);
        // spot-check: uuid first, then the username string
        let mut body = ByteBuffer::from_bytes(packet.body);
        assert_eq!(body.read_uuid().unwrap(), uuid::Uuid::from_u128(7));
        assert_eq!(body.read_string().unwrap(), "steve");
    }
}
