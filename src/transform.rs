//! Keyed byte-level obfuscation layer.
//!
//! 16 rounds of S-box substitution, position permutation and XOR over
//! the whole buffer. Every table is derived deterministically from the
//! key, so the transformation is reversible with the same key and
//! nothing besides the key needs to be stored.
//!
//! The construction is bit-exact by contract: S-box shuffles draw from
//! `SHA256(key ‖ index)` with a `u32` big-endian index, the permutation
//! draws from `SHA512(key ‖ "PERMUTATION")` with `u64` big-endian swap
//! counters, and round keys expand `SHA512(key ‖ round)` with `u32`
//! big-endian counters.

use sha2::{Digest, Sha256, Sha512};

pub const ROUNDS: usize = 16;
pub const SBOX_COUNT: usize = 8;

const PERMUTATION_LABEL: &[u8] = b"PERMUTATION";

/// Apply the transformation.
#[must_use]
pub fn forward(data: &[u8], key: &[u8]) -> Vec<u8> {
    let sboxes = generate_sboxes(key);
    let permutation = generate_permutation(key, data.len());

    let mut state = data.to_vec();
    for round in 0..ROUNDS {
        state = substitute(&state, &sboxes, round);
        state = permute(&state, &permutation);
        let round_key = derive_round_key(key, round, state.len());
        xor_in_place(&mut state, &round_key);
    }
    state
}

/// Reverse the transformation.
#[must_use]
pub fn inverse(data: &[u8], key: &[u8]) -> Vec<u8> {
    let sboxes = generate_sboxes(key);
    let inverse_sboxes = invert_sboxes(&sboxes);
    let permutation = generate_permutation(key, data.len());

    let mut state = data.to_vec();
    for round in (0..ROUNDS).rev() {
        let round_key = derive_round_key(key, round, state.len());
        xor_in_place(&mut state, &round_key);
        state = permute_inverse(&state, &permutation);
        state = substitute(&state, &inverse_sboxes, round);
    }
    state
}

fn generate_sboxes(key: &[u8]) -> Vec<[u8; 256]> {
    (0..SBOX_COUNT)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update(key);
            hasher.update((i as u32).to_be_bytes());
            let seed = hasher.finalize();

            let mut sbox = [0u8; 256];
            for (j, slot) in sbox.iter_mut().enumerate() {
                *slot = j as u8;
            }
            // Fisher-Yates, high to low, driven by the seed bytes.
            for j in (1..=255usize).rev() {
                let k = usize::from(seed[j % seed.len()]) % (j + 1);
                sbox.swap(j, k);
            }
            sbox
        })
        .collect()
}

fn invert_sboxes(sboxes: &[[u8; 256]]) -> Vec<[u8; 256]> {
    sboxes
        .iter()
        .map(|sbox| {
            let mut inverse = [0u8; 256];
            for (i, &value) in sbox.iter().enumerate() {
                inverse[usize::from(value)] = i as u8;
            }
            inverse
        })
        .collect()
}

fn substitute(data: &[u8], sboxes: &[[u8; 256]], round: usize) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &byte)| sboxes[(i + round) % sboxes.len()][usize::from(byte)])
        .collect()
}

fn generate_permutation(key: &[u8], len: usize) -> Vec<usize> {
    let mut hasher = Sha512::new();
    hasher.update(key);
    hasher.update(PERMUTATION_LABEL);
    let base = hasher.finalize();

    let mut indices: Vec<usize> = (0..len).collect();
    for i in (1..len).rev() {
        let mut hasher = Sha256::new();
        hasher.update(&base);
        hasher.update((i as u64).to_be_bytes());
        let digest = hasher.finalize();

        let j = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % (i + 1);
        indices.swap(i, j);
    }
    indices
}

fn permute(data: &[u8], permutation: &[usize]) -> Vec<u8> {
    debug_assert_eq!(data.len(), permutation.len());

    let mut permuted = vec![0u8; data.len()];
    for (i, &position) in permutation.iter().enumerate() {
        permuted[position] = data[i];
    }
    permuted
}

fn permute_inverse(data: &[u8], permutation: &[usize]) -> Vec<u8> {
    debug_assert_eq!(data.len(), permutation.len());

    let mut restored = vec![0u8; data.len()];
    for (i, &position) in permutation.iter().enumerate() {
        restored[i] = data[position];
    }
    restored
}

fn derive_round_key(key: &[u8], round: usize, len: usize) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(key);
    hasher.update((round as u32).to_be_bytes());
    let material = hasher.finalize();

    let mut round_key = Vec::with_capacity(len + 64);
    let mut counter: u32 = 0;
    while round_key.len() < len {
        let mut hasher = Sha512::new();
        hasher.update(&material);
        hasher.update(counter.to_be_bytes());
        round_key.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    round_key.truncate(len);
    round_key
}

fn xor_in_place(state: &mut [u8], key: &[u8]) {
    for (byte, key_byte) in state.iter_mut().zip(key) {
        *byte ^= key_byte;
    }
}
