//! ChaCha20-Poly1305 with a caller-supplied nonce.
//!
//! The 16-byte Poly1305 tag is appended to the ciphertext. No associated
//! data on this layer.

use aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypt bytes; the tag is appended to the ciphertext.
///
/// # Errors
///
/// Errors if the key or nonce has the wrong length.
pub fn encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = new_cipher(key)?;
    let nonce = check_nonce(nonce)?;

    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| Error::Key("ChaCha20-Poly1305 encryption failed".to_string()))
}

/// Decrypt `ciphertext ‖ tag`.
///
/// # Errors
///
/// Errors if the key or nonce has the wrong length, or with an opaque
/// integrity failure when the tag does not verify.
pub fn decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = new_cipher(key)?;
    let nonce = check_nonce(nonce)?;

    cipher.decrypt(nonce, ciphertext).map_err(|_| Error::Integrity)
}

fn new_cipher(key: &[u8]) -> Result<ChaCha20Poly1305> {
    ChaCha20Poly1305::new_from_slice(key)
        .map_err(|_| Error::Key(format!("ChaCha20 requires a {KEY_LEN}-byte key")))
}

fn check_nonce(nonce: &[u8]) -> Result<&Nonce> {
    if nonce.len() != NONCE_LEN {
        return Err(Error::Key(format!(
            "ChaCha20 nonce must be {NONCE_LEN} bytes"
        )));
    }
    Ok(Nonce::from_slice(nonce))
}
