//! AES-256-GCM with a 16-byte IV and a detached tag.
//!
//! The IV is 16 bytes, not the usual 12. The tag is carried out-of-band
//! in the container, so encryption returns `(ciphertext, tag)` instead
//! of one concatenated buffer.

use aead::consts::U16;
use aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt bytes; returns `(ciphertext, tag)`.
///
/// The associated data is authenticated but not encrypted.
///
/// # Errors
///
/// Errors if the key or IV has the wrong length.
pub fn encrypt(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let cipher = new_cipher(key)?;
    let iv = check_iv(iv)?;

    let mut ciphertext = cipher
        .encrypt(
            iv,
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|_| Error::Key("AES-GCM encryption failed".to_string()))?;

    let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);
    Ok((ciphertext, tag))
}

/// Decrypt bytes whose tag is carried separately.
///
/// # Errors
///
/// Errors if the key or IV has the wrong length, or with an opaque
/// integrity failure when the tag does not verify.
pub fn decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>> {
    let cipher = new_cipher(key)?;
    let iv = check_iv(iv)?;
    if tag.len() != TAG_LEN {
        return Err(Error::Integrity);
    }

    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    cipher
        .decrypt(
            iv,
            Payload {
                msg: &combined,
                aad: associated_data,
            },
        )
        .map_err(|_| Error::Integrity)
}

fn new_cipher(key: &[u8]) -> Result<Aes256Gcm16> {
    Aes256Gcm16::new_from_slice(key)
        .map_err(|_| Error::Key(format!("AES-256 requires a {KEY_LEN}-byte key")))
}

fn check_iv(iv: &[u8]) -> Result<&Nonce<U16>> {
    if iv.len() != IV_LEN {
        return Err(Error::Key(format!("AES-GCM IV must be {IV_LEN} bytes")));
    }
    Ok(Nonce::from_slice(iv))
}
