//! Passphrase stretching and subkey expansion.

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::Sha512;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const MASTER_KEY_LEN: usize = 32;

pub const AES_KEY_LABEL: &[u8] = b"AES-256-GCM-KEY";
pub const CHACHA_KEY_LABEL: &[u8] = b"CHACHA20-KEY";
pub const HMAC_KEY_LABEL: &[u8] = b"HMAC-SHA512-KEY";

pub const GENERATED_PASSPHRASE_LEN: usize = 32;

const PASSPHRASE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!@#$%^&*()_+-=[]{}|;:,.<>?";

type HmacSha512 = Hmac<Sha512>;

/// Stretch a passphrase into the master key.
///
/// PBKDF2-HMAC-SHA512 over the UTF-8 passphrase bytes.
#[must_use]
pub fn derive_master(passphrase: &str, salt: &[u8], len: usize, iterations: u32) -> Vec<u8> {
    let mut key = vec![0u8; len];
    pbkdf2_hmac::<Sha512>(passphrase.as_bytes(), salt, iterations, &mut key);
    key
}

/// Expand the master key into a labeled subkey.
///
/// HKDF-Expand shaped, but not HKDF: the feedback block is the last 64
/// bytes of the accumulated output, and the counter is a single byte,
/// so one label can produce at most `255 * 64` bytes.
///
/// # Panics
///
/// Panics if `len > 255 * 64`.
#[must_use]
pub fn derive_subkey(master_key: &[u8], label: &[u8], len: usize) -> Vec<u8> {
    assert!(len <= 255 * 64, "subkey too long for the one-byte counter");

    let prk = {
        let mut mac = HmacSha512::new_from_slice(b"").expect("HMAC accepts any key length");
        mac.update(master_key);
        mac.finalize().into_bytes()
    };

    let mut okm: Vec<u8> = Vec::with_capacity(len + 64);
    let mut counter: u8 = 1;
    while okm.len() < len {
        let mut mac = HmacSha512::new_from_slice(&prk).expect("HMAC accepts any key length");
        let feedback_start = okm.len().saturating_sub(64);
        mac.update(&okm[feedback_start..]);
        mac.update(label);
        mac.update(&[counter]);
        okm.extend_from_slice(&mac.finalize().into_bytes());
        counter = counter.wrapping_add(1);
    }

    okm.truncate(len);
    okm
}

/// Fill a fresh buffer from the OS CSPRNG (salts, IVs, nonces).
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate a passphrase when the user did not provide one.
#[must_use]
pub fn generate_passphrase(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| PASSPHRASE_ALPHABET[rng.gen_range(0..PASSPHRASE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_key_is_reproducible() {
        // Low iteration count; the tests only care about determinism.
        let first = derive_master("CorrectHorse9!", b"salt-salt-salt-salt", 32, 1000);
        let second = derive_master("CorrectHorse9!", b"salt-salt-salt-salt", 32, 1000);

        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn master_key_depends_on_salt() {
        let first = derive_master("CorrectHorse9!", b"salt-a", 32, 1000);
        let second = derive_master("CorrectHorse9!", b"salt-b", 32, 1000);

        assert_ne!(first, second);
    }

    #[test]
    fn master_key_depends_on_passphrase() {
        let first = derive_master("CorrectHorse9!", b"salt", 32, 1000);
        let second = derive_master("WrongHorse9!", b"salt", 32, 1000);

        assert_ne!(first, second);
    }

    #[test]
    fn subkey_is_reproducible() {
        let master_key = [7u8; 32];

        let first = derive_subkey(&master_key, AES_KEY_LABEL, 32);
        let second = derive_subkey(&master_key, AES_KEY_LABEL, 32);

        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn subkeys_differ_by_label() {
        let master_key = [7u8; 32];

        let aes = derive_subkey(&master_key, AES_KEY_LABEL, 32);
        let chacha = derive_subkey(&master_key, CHACHA_KEY_LABEL, 32);

        assert_ne!(aes, chacha);
    }

    #[test]
    fn subkey_prefix_is_stable_across_lengths() {
        // The expansion is a running concatenation; a longer request
        // must start with the shorter one.
        let master_key = [7u8; 32];

        let short = derive_subkey(&master_key, HMAC_KEY_LABEL, 32);
        let long = derive_subkey(&master_key, HMAC_KEY_LABEL, 64);

        assert_eq!(short, long[..32]);
    }

    #[test]
    fn subkey_spans_multiple_blocks() {
        let master_key = [7u8; 32];

        let subkey = derive_subkey(&master_key, HMAC_KEY_LABEL, 200);

        assert_eq!(subkey.len(), 200);
        // The second block feeds back the first; blocks must differ.
        assert_ne!(subkey[..64], subkey[64..128]);
    }

    #[test]
    #[should_panic(expected = "subkey too long")]
    fn subkey_rejects_output_beyond_counter_range() {
        _ = derive_subkey(&[7u8; 32], HMAC_KEY_LABEL, 255 * 64 + 1);
    }

    #[test]
    fn random_bytes_have_requested_length() {
        assert_eq!(random_bytes(32).len(), 32);
        assert_eq!(random_bytes(0).len(), 0);
    }

    #[test]
    fn generated_passphrase_sticks_to_the_alphabet() {
        let passphrase = generate_passphrase(GENERATED_PASSPHRASE_LEN);

        assert_eq!(passphrase.chars().count(), 32);
        assert!(
            passphrase
                .bytes()
                .all(|c| PASSPHRASE_ALPHABET.contains(&c))
        );
    }

    #[test]
    fn generated_passphrases_are_unique() {
        assert_ne!(generate_passphrase(32), generate_passphrase(32));
    }
}
