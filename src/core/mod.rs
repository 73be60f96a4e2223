//! # Core Protocol Components
//!
//! Low-level binary handling: the cursor buffer, packet framing, and the NBT
//! tree serializer.
//!
//! This module provides the foundation for the protocol, handling wire
//! primitives, frame reassembly, and structured binary payloads.
//!
//! ## Components
//! - **Buffer**: Growable byte buffer with atomic cursor reads
//! - **Packet / Codec**: Length-prefixed frame format and incremental framer
//! - **NBT**: Tagged tree serializer for structured payloads
//!
//! ## Wire Format
//! ```text
//! [Length: VarInt] [Id: VarInt] [Body: N bytes]
//! ```
//! where the length counts the id bytes plus the body bytes.

pub mod buffer;
pub mod codec;
pub mod nbt;
pub mod packet;
