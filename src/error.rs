//! # Error Types
//!
//! Comprehensive error handling for the protocol core.
//!
//! This module defines all error variants that can occur during protocol
//! operations, from low-level codec failures to connection-fatal transport
//! errors.
//!
//! ## Error Categories
//! - **Codec Errors**: Malformed primitives (truncated buffer, oversized varint)
//! - **Framing Errors**: Invalid frame lengths, runaway accumulation
//! - **Registry Errors**: Unknown packets, unsupported field shapes
//! - **Handshake Errors**: Verify-token mismatch, decryption failures
//! - **Transport Errors**: Socket failures, closed connections
//!
//! Codec errors are fatal to the current decode; framing, registry, and
//! handshake errors are fatal to the connection. Nothing is retried
//! automatically.

use std::io;
use thiserror::Error;

use crate::protocol::ProtocolState;

/// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("buffer too short: needed {needed} bytes but only {available} remain")]
    BufferTooShort { needed: usize, available: usize },

    #[error("varint is too big")]
    VarIntTooBig,

    #[error("varlong is too big")]
    VarLongTooBig,

    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBool(u8),

    #[error("invalid string length {0}")]
    InvalidStringLength(i32),

    #[error("string payload is not valid UTF-8")]
    InvalidStringEncoding,

    #[error("mismatched list tags: expected {expected} but got {found}")]
    MismatchedListTag {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid frame length {0}")]
    InvalidFrameLength(i32),

    #[error("frame accumulation exceeded {0} bytes without a complete frame")]
    OversizedAccumulation(usize),

    #[error("unknown packet 0x{id:02x} in state {state}")]
    UnknownPacket { state: ProtocolState, id: i32 },

    #[error("duplicate inbound registration for packet 0x{id:02x} in state {state}")]
    DuplicateInbound { state: ProtocolState, id: i32 },

    #[error("duplicate outbound registration for message {0}")]
    DuplicateOutbound(&'static str),

    #[error("message {0} has no outbound registration")]
    UnregisteredMessage(&'static str),

    #[error("message {message}: field {field} has an unsupported shape")]
    UnsupportedField {
        message: &'static str,
        field: &'static str,
    },

    #[error("message {message}: field {field} does not match its schema")]
    FieldMismatch {
        message: &'static str,
        field: &'static str,
    },

    #[error("invalid next state {0} in handshake")]
    InvalidNextState(i32),

    #[error("illegal state transition from {from} to {to}")]
    IllegalStateTransition {
        from: ProtocolState,
        to: ProtocolState,
    },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("verify token mismatch")]
    VerifyTokenMismatch,

    #[error("shared secret should be 16 bytes but received {0} bytes")]
    InvalidSecretLength(usize),

    #[error("decryption failed")]
    DecryptionFailure,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("session mailbox is full")]
    MailboxFull,

    #[error("session mailbox is closed")]
    MailboxClosed,

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
