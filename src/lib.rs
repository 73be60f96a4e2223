//! # craft-protocol
//!
//! Server core for the Minecraft Java-edition wire protocol: a stateful,
//! length-prefixed binary protocol over TCP with an optional RSA-bootstrapped
//! AES/CFB8 stream cipher.
//!
//! ## Layers
//! - [`core`]: byte buffer, VarInt codec, frame reassembly, NBT serializer
//! - [`protocol`]: protocol states, declarative message schemas, registry
//! - [`transport`]: listener, per-connection read pumps, stream encryption
//! - [`server`]: the per-connection session actor and message handlers
//!
//! ## Quick Start
//! ```rust,no_run
//! use craft_protocol::config::ServerConfig;
//! use craft_protocol::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> craft_protocol::Result<()> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod utils;

pub use error::{ProtocolError, Result};
