//! Encryption and decryption engines.
//!
//! Encrypt dataflow:
//!
//! ```text
//! plaintext → [compress?] → AES-GCM → ChaCha20 → transform → body
//! symmetric material → pack → RSA-OAEP → wrapped keys
//! HMAC(body ‖ metadata) → integrity tag
//! ```
//!
//! Decryption reverses the layers in the exact opposite order, after
//! verifying the integrity tag and the wrapped symmetric material.
//! Each engine is a self-contained computation; no state is shared
//! between calls, and every encryption starts from fresh randomness.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use secrecy::zeroize::Zeroizing;
use sha2::Sha512;

use crate::bundle::{self, KeyBundle};
use crate::container::{self, Container, flags};
use crate::crypto::rsa::{RsaPrivateKey, RsaPublicKey};
use crate::crypto::{aes, chacha, lzma, rsa};
use crate::error::{Error, Result};
use crate::kdf;
use crate::transform;

type HmacSha512 = Hmac<Sha512>;

pub struct Encryptor {
    bundle: KeyBundle,
    rsa_public_key: RsaPublicKey,
}

impl Encryptor {
    /// Derive a fresh key set from the passphrase.
    ///
    /// Generates the salt, IV and nonce, stretches the passphrase into
    /// the master key, expands the subkeys, and generates the
    /// per-artifact RSA-4096 keypair. By far the costliest call here.
    ///
    /// # Errors
    ///
    /// Errors if RSA key generation or PEM serialization fails.
    pub fn new(passphrase: &str) -> Result<Self> {
        let salt = kdf::random_bytes(bundle::SALT_LEN);
        let aes_iv = kdf::random_bytes(aes::IV_LEN);
        let chacha_nonce = kdf::random_bytes(chacha::NONCE_LEN);

        let master_key = kdf::derive_master(
            passphrase,
            &salt,
            kdf::MASTER_KEY_LEN,
            kdf::PBKDF2_ITERATIONS,
        );
        let aes_key = kdf::derive_subkey(&master_key, kdf::AES_KEY_LABEL, aes::KEY_LEN);
        let chacha_key = kdf::derive_subkey(&master_key, kdf::CHACHA_KEY_LABEL, chacha::KEY_LEN);
        let hmac_key = kdf::derive_subkey(&master_key, kdf::HMAC_KEY_LABEL, 64);

        let (rsa_private_key, rsa_public_key) = rsa::generate_keypair()?;

        let bundle = KeyBundle {
            master_key,
            aes_key,
            chacha_key,
            hmac_key,
            salt,
            aes_iv,
            chacha_nonce,
            rsa_private_key: rsa::private_key_to_pem(&rsa_private_key)?,
            rsa_public_key: rsa::public_key_to_pem(&rsa_public_key)?,
            version: bundle::VERSION.to_string(),
        };

        Ok(Self {
            bundle,
            rsa_public_key,
        })
    }

    #[must_use]
    pub fn bundle(&self) -> &KeyBundle {
        &self.bundle
    }

    #[must_use]
    pub fn into_bundle(self) -> KeyBundle {
        self.bundle
    }

    /// Encrypt a payload into a container.
    ///
    /// # Errors
    ///
    /// Errors if any pipeline stage fails.
    pub fn encrypt(&self, data: &[u8], file_type: &str, filename: &str) -> Result<Vec<u8>> {
        let original_size = data.len() as u64;

        // Compression only pays off if it actually shrinks the input.
        let compressed = lzma::compress(data, lzma::PRESET)?;
        let (payload, is_compressed) = if compressed.len() < data.len() {
            (compressed, true)
        } else {
            (data.to_vec(), false)
        };
        let compressed_size = payload.len() as u64;

        let (aes_ciphertext, aes_tag) = aes::encrypt(
            &self.bundle.aes_key,
            &self.bundle.aes_iv,
            &payload,
            filename.as_bytes(),
        )?;
        let chacha_ciphertext = chacha::encrypt(
            &self.bundle.chacha_key,
            &self.bundle.chacha_nonce,
            &aes_ciphertext,
        )?;
        let body = transform::forward(&chacha_ciphertext, &self.bundle.master_key);

        let packed = self.bundle.pack_symmetric_material();
        let wrapped_keys = rsa::encrypt(&self.rsa_public_key, &packed)?;

        let hmac = integrity_tag(
            &self.bundle.hmac_key,
            &body,
            file_type,
            filename,
            original_size,
            compressed_size,
        )?;

        let mut container_flags =
            flags::MULTI_LAYER | flags::RSA_PROTECTED | flags::INTEGRITY_CHECK;
        if is_compressed {
            container_flags |= flags::COMPRESSED;
        }

        container::encode(&Container {
            version: (container::VERSION_BYTES[0], container::VERSION_BYTES[1]),
            flags: container_flags,
            timestamp: unix_timestamp(),
            file_type: file_type.to_string(),
            filename: filename.to_string(),
            original_size,
            compressed_size,
            salt: self.bundle.salt.clone(),
            aes_tag,
            wrapped_keys,
            body,
            hmac,
        })
    }
}

/// The result of a successful decryption.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decrypted {
    pub data: Vec<u8>,
    pub file_type: String,
    pub filename: String,
    pub timestamp: u64,
    pub original_size: u64,
}

#[derive(Debug)]
pub struct Decryptor {
    bundle: KeyBundle,
    rsa_private_key: RsaPrivateKey,
}

impl Decryptor {
    /// Load the RSA private key out of the bundle.
    ///
    /// # Errors
    ///
    /// Errors if the bundle carries no valid PEM private key.
    pub fn new(bundle: KeyBundle) -> Result<Self> {
        let rsa_private_key = rsa::private_key_from_pem(&bundle.rsa_private_key)?;
        Ok(Self {
            bundle,
            rsa_private_key,
        })
    }

    /// Decrypt a container back into its payload and metadata.
    ///
    /// The integrity tag is verified before any cryptographic work;
    /// nothing is decrypted for a tampered container.
    ///
    /// # Errors
    ///
    /// Errors on format, version, integrity, or key failures, per the
    /// stage that rejects the artifact.
    pub fn decrypt(&self, encrypted: &[u8]) -> Result<Decrypted> {
        let container = container::decode(encrypted)?;

        if container.version_string() != self.bundle.version {
            return Err(Error::Version {
                container: container.version_string(),
                bundle: self.bundle.version.clone(),
            });
        }

        self.verify_integrity(&container)?;

        let unwrapped = Zeroizing::new(rsa::decrypt(&self.rsa_private_key, &container.wrapped_keys)?);
        self.bundle.verify_symmetric_material(&unwrapped)?;

        let after_transform = transform::inverse(&container.body, &self.bundle.master_key);
        let after_chacha = chacha::decrypt(
            &self.bundle.chacha_key,
            &self.bundle.chacha_nonce,
            &after_transform,
        )?;
        let payload = aes::decrypt(
            &self.bundle.aes_key,
            &self.bundle.aes_iv,
            &after_chacha,
            &container.aes_tag,
            container.filename.as_bytes(),
        )?;

        let data = if container.is_compressed() {
            lzma::decompress(&payload)?
        } else {
            payload
        };

        if data.len() as u64 != container.original_size {
            return Err(Error::Integrity);
        }

        Ok(Decrypted {
            data,
            file_type: container.file_type,
            filename: container.filename,
            timestamp: container.timestamp,
            original_size: container.original_size,
        })
    }

    fn verify_integrity(&self, container: &Container) -> Result<()> {
        // `verify_slice` compares in constant time.
        let mut mac = HmacSha512::new_from_slice(&self.bundle.hmac_key)
            .map_err(|_| Error::Key("HMAC key is empty".to_string()))?;
        mac.update(&container.body);
        mac.update(container.file_type.as_bytes());
        mac.update(container.filename.as_bytes());
        mac.update(&container.original_size.to_le_bytes());
        mac.update(&container.compressed_size.to_le_bytes());
        mac.verify_slice(&container.hmac)
            .map_err(|_| Error::Integrity)
    }
}

fn integrity_tag(
    key: &[u8],
    body: &[u8],
    file_type: &str,
    filename: &str,
    original_size: u64,
    compressed_size: u64,
) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha512::new_from_slice(key).map_err(|_| Error::Key("HMAC key is empty".to_string()))?;
    mac.update(body);
    mac.update(file_type.as_bytes());
    mac.update(filename.as_bytes());
    mac.update(&original_size.to_le_bytes());
    mac.update(&compressed_size.to_le_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;

    // RSA-4096 generation dominates test time; share one engine across
    // every test that doesn't need a second key set.
    static ENCRYPTOR: LazyLock<Encryptor> =
        LazyLock::new(|| Encryptor::new("CorrectHorse9!").unwrap());

    fn decryptor() -> Decryptor {
        Decryptor::new(ENCRYPTOR.bundle().clone()).unwrap()
    }

    fn reencode(container: &Container) -> Vec<u8> {
        container::encode(container).unwrap()
    }

    #[test]
    fn fresh_key_set_has_exact_lengths() {
        let bundle = ENCRYPTOR.bundle();

        assert_eq!(bundle.master_key.len(), 32);
        assert_eq!(bundle.aes_key.len(), 32);
        assert_eq!(bundle.chacha_key.len(), 32);
        assert_eq!(bundle.hmac_key.len(), 64);
        assert_eq!(bundle.salt.len(), 32);
        assert_eq!(bundle.aes_iv.len(), 16);
        assert_eq!(bundle.chacha_nonce.len(), 12);
        assert_eq!(bundle.version, "1.0.0");
    }

    #[test]
    fn subkeys_are_reproducible_from_the_bundle() {
        let bundle = ENCRYPTOR.bundle();

        let master_key = kdf::derive_master(
            "CorrectHorse9!",
            &bundle.salt,
            kdf::MASTER_KEY_LEN,
            kdf::PBKDF2_ITERATIONS,
        );

        assert_eq!(master_key, bundle.master_key);
        assert_eq!(
            kdf::derive_subkey(&master_key, kdf::AES_KEY_LABEL, 32),
            bundle.aes_key
        );
        assert_eq!(
            kdf::derive_subkey(&master_key, kdf::CHACHA_KEY_LABEL, 32),
            bundle.chacha_key
        );
        assert_eq!(
            kdf::derive_subkey(&master_key, kdf::HMAC_KEY_LABEL, 64),
            bundle.hmac_key
        );
    }

    #[test]
    fn small_text_roundtrip() {
        let encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        assert_eq!(&encrypted[..6], b"DOCENC");

        let container = container::decode(&encrypted).unwrap();
        // Too small to compress.
        assert!(!container.is_compressed());
        assert_eq!(container.original_size, 13);
        assert_eq!(container.compressed_size, 13);
        // One raw RSA block, no framing.
        assert_eq!(container.wrapped_keys.len(), 512);
        assert_eq!(container.hmac.len(), 64);

        let decrypted = decryptor().decrypt(&encrypted).unwrap();

        assert_eq!(decrypted.data, b"Hello, world!");
        assert_eq!(decrypted.file_type, "text");
        assert_eq!(decrypted.filename, "hi.txt");
        assert_eq!(decrypted.original_size, 13);
    }

    #[test]
    fn empty_payload_roundtrip() {
        let encrypted = ENCRYPTOR.encrypt(b"", "text", "empty.txt").unwrap();

        let decrypted = decryptor().decrypt(&encrypted).unwrap();

        assert_eq!(decrypted.data, b"");
        assert_eq!(decrypted.original_size, 0);
    }

    #[test]
    fn compressible_payload_roundtrip() {
        let zeros = vec![0u8; 1024 * 1024];

        let encrypted = ENCRYPTOR.encrypt(&zeros, "text", "zeros.bin").unwrap();

        let container = container::decode(&encrypted).unwrap();
        assert!(container.is_compressed());
        assert!(container.compressed_size < container.original_size);
        assert_eq!(container.original_size, 1024 * 1024);

        let decrypted = decryptor().decrypt(&encrypted).unwrap();

        assert_eq!(decrypted.data, zeros);
    }

    #[test]
    fn incompressible_payload_keeps_original_bytes() {
        let noise = kdf::random_bytes(4096);

        let encrypted = ENCRYPTOR.encrypt(&noise, "text", "noise.bin").unwrap();

        let container = container::decode(&encrypted).unwrap();
        assert!(!container.is_compressed());
        assert_eq!(container.compressed_size, 4096);
        // Body is the payload plus the 16-byte Poly1305 tag.
        assert_eq!(container.body.len(), 4096 + 16);

        let decrypted = decryptor().decrypt(&encrypted).unwrap();

        assert_eq!(decrypted.data, noise);
    }

    #[test]
    fn wrapped_keys_are_one_block_regardless_of_payload_size() {
        // The wrapped plaintext is the packed symmetric material, whose
        // size does not depend on the payload.
        for payload_len in [446, 447] {
            let payload = vec![0x5A; payload_len];

            let encrypted = ENCRYPTOR.encrypt(&payload, "text", "edge.txt").unwrap();

            let container = container::decode(&encrypted).unwrap();
            assert_eq!(container.wrapped_keys.len(), 512, "payload {payload_len}");
        }
    }

    #[test]
    fn advisory_flags_are_set() {
        let encrypted = ENCRYPTOR.encrypt(b"Hello, world!", "text", "hi.txt").unwrap();

        let container = container::decode(&encrypted).unwrap();

        assert_ne!(container.flags & flags::MULTI_LAYER, 0);
        assert_ne!(container.flags & flags::RSA_PROTECTED, 0);
        assert_ne!(container.flags & flags::INTEGRITY_CHECK, 0);
        assert_eq!(container.flags & flags::METADATA_ENCRYPTED, 0);
    }

    #[test]
    fn tampered_hmac_is_rejected() {
        let mut encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        let last = encrypted.len() - 1;
        encrypted[last] ^= 1;

        let err = decryptor().decrypt(&encrypted).unwrap_err();

        assert_eq!(err, Error::Integrity);
    }

    #[test]
    fn tampered_body_is_rejected() {
        let encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        let mut container = container::decode(&encrypted).unwrap();
        container.body[0] ^= 1;

        let err = decryptor().decrypt(&reencode(&container)).unwrap_err();

        assert_eq!(err, Error::Integrity);
    }

    #[test]
    fn tampered_metadata_is_rejected() {
        let encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        let mut container = container::decode(&encrypted).unwrap();
        container.filename = "ha.txt".to_string();

        let err = decryptor().decrypt(&reencode(&container)).unwrap_err();

        assert_eq!(err, Error::Integrity);
    }

    #[test]
    fn tampered_size_field_is_rejected() {
        let encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        let mut container = container::decode(&encrypted).unwrap();
        container.original_size += 1;

        let err = decryptor().decrypt(&reencode(&container)).unwrap_err();

        assert_eq!(err, Error::Integrity);
    }

    #[test]
    fn tampered_aes_tag_is_rejected() {
        // The AES tag is outside the HMAC; tampering must still be
        // caught, by GCM itself.
        let encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        let mut container = container::decode(&encrypted).unwrap();
        container.aes_tag[0] ^= 1;

        let err = decryptor().decrypt(&reencode(&container)).unwrap_err();

        assert_eq!(err, Error::Integrity);
    }

    #[test]
    fn version_mismatch_is_rejected_before_integrity() {
        let encrypted = ENCRYPTOR
            .encrypt(b"Hello, world!", "text", "hi.txt")
            .unwrap();

        let mut container = container::decode(&encrypted).unwrap();
        container.version = (2, 0);

        let err = decryptor().decrypt(&reencode(&container)).unwrap_err();

        assert_eq!(
            err,
            Error::Version {
                container: "2.0.0".to_string(),
                bundle: "1.0.0".to_string(),
            }
        );
    }

    #[test]
    fn artifact_from_another_key_set_is_rejected() {
        // Same passphrase, fresh salt and keys: a different bundle.
        let other = Encryptor::new("CorrectHorse9!").unwrap();

        let encrypted = other.encrypt(b"Hello, world!", "text", "hi.txt").unwrap();

        let err = decryptor().decrypt(&encrypted).unwrap_err();

        assert_eq!(err, Error::Integrity);
    }

    #[test]
    fn decryptor_rejects_bundle_without_private_key() {
        let mut bundle = ENCRYPTOR.bundle().clone();
        bundle.rsa_private_key = b"garbage".to_vec();

        let err = Decryptor::new(bundle).unwrap_err();

        assert!(matches!(err, Error::Key(_)));
    }

    #[test]
    fn garbage_input_is_a_format_error() {
        let err = decryptor().decrypt(b"definitely not a container").unwrap_err();

        assert!(matches!(err, Error::Format(_)));
    }
}
