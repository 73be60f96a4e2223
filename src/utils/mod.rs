//! # Utility Modules
//!
//! Supporting utilities for cryptography and logging.
//!
//! ## Components
//! - **Crypto**: The per-listener RSA keypair and the AES/CFB8 stream cipher
//! - **Logging**: Structured logging configuration
//!
//! ## Security
//! - Cryptographically secure RNG (`OsRng`) for keys and tokens
//! - Shared secrets are zeroed after cipher installation (`zeroize`)

pub mod crypto;
pub mod logging;
