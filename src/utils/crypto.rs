//! # Cryptographic Primitives
//!
//! The listener's RSA keypair and the per-connection stream cipher.
//!
//! The keypair bootstraps per-connection symmetric encryption: its public key
//! travels in the encryption request, and the client's encryption response
//! carries the shared secret and verify token encrypted under it (PKCS#1
//! v1.5). Once the secret is recovered and the token verified, both stream
//! directions switch to AES-128 in 8-bit CFB mode.
//!
//! The wire protocol mandates that the 16-byte shared secret serves as both
//! the AES key and the IV. That asymmetry is preserved here for
//! interoperability; it is not a pattern to generalize.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use tracing::info;

use crate::error::{ProtocolError, Result};

/// Keypair size used by the protocol.
pub const RSA_KEY_BITS: usize = 1024;

/// Length of the symmetric shared secret.
pub const SHARED_SECRET_LEN: usize = 16;

type Aes128Cfb8Enc = cfb8::Encryptor<aes::Aes128>;
type Aes128Cfb8Dec = cfb8::Decryptor<aes::Aes128>;

/// The listener-scoped asymmetric keypair, shared read-only by every
/// connection accepted on that listener.
pub struct ServerKeypair {
    private_key: RsaPrivateKey,
    public_key_der: Vec<u8>,
}

impl ServerKeypair {
    /// Generates a fresh keypair. Called once per listener.
    pub fn generate() -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| ProtocolError::Handshake(format!("keypair generation failed: {e}")))?;

        let public_key_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| ProtocolError::Handshake(format!("public key encoding failed: {e}")))?
            .as_bytes()
            .to_vec();

        info!(bits = RSA_KEY_BITS, "generated RSA keypair");

        Ok(Self {
            private_key,
            public_key_der,
        })
    }

    /// SPKI/DER form of the public key, as sent in the encryption request.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Decrypts a PKCS#1 v1.5 ciphertext from an encryption response.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.private_key
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map_err(|_| ProtocolError::DecryptionFailure)
    }
}

fn check_secret(shared_secret: &[u8]) -> Result<()> {
    if shared_secret.len() != SHARED_SECRET_LEN {
        return Err(ProtocolError::InvalidSecretLength(shared_secret.len()));
    }
    Ok(())
}

/// Write-direction half of the stream cipher. Encrypts in place.
pub struct StreamEncryptor(Aes128Cfb8Enc);

impl StreamEncryptor {
    pub fn new(shared_secret: &[u8]) -> Result<Self> {
        check_secret(shared_secret)?;
        let cipher = Aes128Cfb8Enc::new_from_slices(shared_secret, shared_secret)
            .map_err(|_| ProtocolError::InvalidSecretLength(shared_secret.len()))?;
        Ok(Self(cipher))
    }

    pub fn encrypt(&mut self, data: &mut [u8]) {
        // CFB8 operates one byte at a time
        for chunk in data.chunks_mut(1) {
            self.0.encrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
    }
}

/// Read-direction half of the stream cipher. Decrypts in place.
pub struct StreamDecryptor(Aes128Cfb8Dec);

impl StreamDecryptor {
    pub fn new(shared_secret: &[u8]) -> Result<Self> {
        check_secret(shared_secret)?;
        let cipher = Aes128Cfb8Dec::new_from_slices(shared_secret, shared_secret)
            .map_err(|_| ProtocolError::InvalidSecretLength(shared_secret.len()))?;
        Ok(Self(cipher))
    }

    pub fn decrypt(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_mut(1) {
            self.0.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
        }
    }
}
