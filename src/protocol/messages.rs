//! Typed message shapes.
//!
//! The registry decodes packets into [`ServerboundMessage`] values and
//! encodes [`ClientboundMessage`] values back into packets. Both are plain
//! sum types over the registered schemas; the conversions here bridge between
//! the typed variants and the generic field values the schema codec works
//! with, erroring on any disagreement with the declared layout.

use uuid::Uuid;

use crate::core::nbt::NbtValue;
use crate::error::{ProtocolError, Result};
use crate::protocol::chat::Chat;
use crate::protocol::schema::FieldValue;

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerboundMessage {
    Handshake {
        protocol_version: i32,
        server_address: String,
        server_port: u16,
        next_state: i32,
    },
    StatusRequest,
    StatusPing {
        challenge: i64,
    },
    LoginStart {
        name: String,
        player_uuid: Uuid,
    },
    EncryptionResponse {
        shared_secret: Vec<u8>,
        verify_token: Vec<u8>,
    },
    LoginAcknowledged,
}

impl ServerboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ServerboundMessage::Handshake { .. } => "handshake",
            ServerboundMessage::StatusRequest => "status_request",
            ServerboundMessage::StatusPing { .. } => "status_ping",
            ServerboundMessage::LoginStart { .. } => "login_start",
            ServerboundMessage::EncryptionResponse { .. } => "encryption_response",
            ServerboundMessage::LoginAcknowledged => "login_acknowledged",
        }
    }

    /// Builds the typed message for `schema_name` from decoded field values.
    pub fn from_fields(schema_name: &'static str, fields: Vec<FieldValue>) -> Result<Self> {
        let mut reader = FieldReader::new(schema_name, fields);
        let message = match schema_name {
            "handshake" => ServerboundMessage::Handshake {
                protocol_version: reader.var_int("protocol_version")?,
                server_address: reader.string("server_address")?,
                server_port: reader.u_short("server_port")?,
                next_state: reader.var_int("next_state")?,
            },
            "status_request" => ServerboundMessage::StatusRequest,
            "status_ping" => ServerboundMessage::StatusPing {
                challenge: reader.long("challenge")?,
            },
            "login_start" => ServerboundMessage::LoginStart {
                name: reader.string("name")?,
                player_uuid: reader.uuid("player_uuid")?,
            },
            "encryption_response" => ServerboundMessage::EncryptionResponse {
                shared_secret: reader.byte_seq("shared_secret")?,
                verify_token: reader.byte_seq("verify_token")?,
            },
            "login_acknowledged" => ServerboundMessage::LoginAcknowledged,
            _ => return Err(ProtocolError::UnregisteredMessage(schema_name)),
        };
        reader.finish()?;
        Ok(message)
    }
}

/// One entry of a login-success property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

impl ProfileProperty {
    fn to_group(&self) -> FieldValue {
        FieldValue::Group(vec![
            FieldValue::String(self.name.clone()),
            FieldValue::String(self.value.clone()),
            FieldValue::Optional(
                self.signature
                    .clone()
                    .map(|s| Box::new(FieldValue::String(s))),
            ),
        ])
    }
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientboundMessage {
    StatusResponse {
        json: String,
    },
    StatusPong {
        challenge: i64,
    },
    LoginDisconnect {
        reason: Chat,
    },
    EncryptionRequest {
        server_id: String,
        public_key: Vec<u8>,
        verify_token: Vec<u8>,
        should_authenticate: bool,
    },
    LoginSuccess {
        player_uuid: Uuid,
        username: String,
        properties: Vec<ProfileProperty>,
        strict_error_handling: bool,
    },
    ConfigurationDisconnect {
        reason: NbtValue,
    },
}

impl ClientboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ClientboundMessage::StatusResponse { .. } => "status_response",
            ClientboundMessage::StatusPong { .. } => "status_pong",
            ClientboundMessage::LoginDisconnect { .. } => "login_disconnect",
            ClientboundMessage::EncryptionRequest { .. } => "encryption_request",
            ClientboundMessage::LoginSuccess { .. } => "login_success",
            ClientboundMessage::ConfigurationDisconnect { .. } => "configuration_disconnect",
        }
    }

    /// Flattens the typed message into schema field values.
    pub fn to_fields(&self) -> Result<Vec<FieldValue>> {
        let fields = match self {
            ClientboundMessage::StatusResponse { json } => {
                vec![FieldValue::String(json.clone())]
            }
            ClientboundMessage::StatusPong { challenge } => {
                vec![FieldValue::Long(*challenge)]
            }
            ClientboundMessage::LoginDisconnect { reason } => {
                vec![FieldValue::String(reason.to_json()?)]
            }
            ClientboundMessage::EncryptionRequest {
                server_id,
                public_key,
                verify_token,
                should_authenticate,
            } => vec![
                FieldValue::String(server_id.clone()),
                FieldValue::byte_seq(public_key),
                FieldValue::byte_seq(verify_token),
                FieldValue::Bool(*should_authenticate),
            ],
            ClientboundMessage::LoginSuccess {
                player_uuid,
                username,
                properties,
                strict_error_handling,
            } => vec![
                FieldValue::Uuid(*player_uuid),
                FieldValue::String(username.clone()),
                FieldValue::Seq(properties.iter().map(ProfileProperty::to_group).collect()),
                FieldValue::Bool(*strict_error_handling),
            ],
            ClientboundMessage::ConfigurationDisconnect { reason } => {
                vec![FieldValue::Nbt(reason.clone())]
            }
        };
        Ok(fields)
    }
}

/// Consumes decoded field values in declaration order, checking shapes.
struct FieldReader {
    message: &'static str,
    values: std::vec::IntoIter<FieldValue>,
}

impl FieldReader {
    fn new(message: &'static str, values: Vec<FieldValue>) -> Self {
        Self {
            message,
            values: values.into_iter(),
        }
    }

    fn mismatch(&self, field: &'static str) -> ProtocolError {
        ProtocolError::FieldMismatch {
            message: self.message,
            field,
        }
    }

    fn next(&mut self, field: &'static str) -> Result<FieldValue> {
        self.values.next().ok_or_else(|| self.mismatch(field))
    }

    fn var_int(&mut self, field: &'static str) -> Result<i32> {
        match self.next(field)? {
            FieldValue::VarInt(v) => Ok(v),
            _ => Err(self.mismatch(field)),
        }
    }

    fn u_short(&mut self, field: &'static str) -> Result<u16> {
        match self.next(field)? {
            FieldValue::UShort(v) => Ok(v),
            _ => Err(self.mismatch(field)),
        }
    }

    fn long(&mut self, field: &'static str) -> Result<i64> {
        match self.next(field)? {
            FieldValue::Long(v) => Ok(v),
            _ => Err(self.mismatch(field)),
        }
    }

    fn string(&mut self, field: &'static str) -> Result<String> {
        match self.next(field)? {
            FieldValue::String(v) => Ok(v),
            _ => Err(self.mismatch(field)),
        }
    }

    fn uuid(&mut self, field: &'static str) -> Result<Uuid> {
        match self.next(field)? {
            FieldValue::Uuid(v) => Ok(v),
            _ => Err(self.mismatch(field)),
        }
    }

    fn byte_seq(&mut self, field: &'static str) -> Result<Vec<u8>> {
        let value = self.next(field)?;
        value.as_byte_seq().ok_or_else(|| self.mismatch(field))
    }

    /// All declared fields must have been consumed.
    fn finish(mut self) -> Result<()> {
        if self.values.next().is_some() {
            return Err(self.mismatch("field count"));
        }
        Ok(())
    }
}
