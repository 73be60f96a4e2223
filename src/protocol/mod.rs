//! # Protocol Layer
//!
//! Protocol states, message schemas, and the generic schema-driven codec.
//!
//! Every message the server understands is described as data: an ordered list
//! of typed fields registered under a `(state, id)` key for inbound packets
//! and under the message's identity for outbound packets. The registry walks
//! those descriptions to decode and encode packets generically; no message
//! has bespoke wire code.
//!
//! ## Components
//! - **State**: The connection phase controlling which schemas are valid
//! - **Schema**: Field descriptions and the generic field codec
//! - **Registry**: `(state, id)` lookup tables, built explicitly at startup
//! - **Messages**: Typed sum types for the registered message shapes
//! - **Chat**: Rich-text components (JSON and NBT forms)

pub mod chat;
pub mod messages;
pub mod registry;
pub mod schema;

use std::fmt;

use crate::error::{ProtocolError, Result};

/// The enumerated phase of a connection.
///
/// Exactly one live value exists per connection. The state only advances
/// (through the handshake's declared next-state and the login flow) and never
/// regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolState {
    Handshaking,
    Status,
    Login,
    Configuration,
    Play,
}

impl ProtocolState {
    /// Maps the handshake's declared next-state id to a state.
    pub fn from_next_state(id: i32) -> Result<Self> {
        match id {
            1 => Ok(ProtocolState::Status),
            2 => Ok(ProtocolState::Login),
            other => Err(ProtocolError::InvalidNextState(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProtocolState::Handshaking => "handshaking",
            ProtocolState::Status => "status",
            ProtocolState::Login => "login",
            ProtocolState::Configuration => "configuration",
            ProtocolState::Play => "play",
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn next_state_ids() {
        assert_eq!(
            ProtocolState::from_next_state(1).unwrap(),
            ProtocolState::Status
        );
        assert_eq!(
            ProtocolState::from_next_state(2).unwrap(),
            ProtocolState::Login
        );
        assert!(matches!(
            ProtocolState::from_next_state(3),
            Err(ProtocolError::InvalidNextState(3))
        ));
    }

    #[test]
    fn states_are_ordered_for_monotonic_advancement() {
        assert!(ProtocolState::Handshaking < ProtocolState::Status);
        assert!(ProtocolState::Status < ProtocolState::Login);
        assert!(ProtocolState::Login < ProtocolState::Configuration);
        assert!(ProtocolState::Configuration < ProtocolState::Play);
    }
}
