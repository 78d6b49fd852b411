//! Secret token generation.
//!
//! Session cookies and API keys are both opaque random strings. Anyone
//! holding one is treated as its owner, so the only property that matters
//! is that nobody can guess one.
//!
//! # Uniformity
//!
//! Each character is drawn independently from the 71-character
//! [`ALPHABET`]. A random byte has 256 values, which is not a multiple of
//! 71, so `byte % 71` alone would favour the first 43 characters. Instead
//! we reject bytes `>= 213` (the largest multiple of 71 below 256) and
//! reduce the rest: every character then has exactly 3 preimages out of
//! 213 accepted bytes.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::TokenError;

/// The 71 characters a token may contain: digits, ASCII letters, and nine
/// symbols that are safe in cookie values and store keys.
pub const ALPHABET: &[u8; 71] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_.~!*+$@";

/// Bytes at or above this bound are rejected (`71 * 3`).
const ACCEPT_BELOW: u8 = (ALPHABET.len() * (256 / ALPHABET.len())) as u8;

/// Returns a token of exactly `length` characters from [`ALPHABET`].
///
/// Randomness comes from the operating system (`OsRng`), not a userspace
/// generator.
///
/// # Errors
/// Returns [`TokenError::Generation`] if the OS random source fails.
pub fn new_token(length: usize) -> Result<String, TokenError> {
    let mut token = String::with_capacity(length);
    // Roughly 17% of bytes are rejected; over-draw a little so one fill
    // usually suffices.
    let mut buf = vec![0u8; length + length / 4 + 8];

    while token.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| TokenError::Generation(e.to_string()))?;

        for &byte in &buf {
            if token.len() == length {
                break;
            }
            if byte < ACCEPT_BELOW {
                token.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
            }
        }
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_alphabet_has_71_distinct_characters() {
        let distinct: HashSet<u8> = ALPHABET.iter().copied().collect();
        assert_eq!(distinct.len(), 71);
        assert_eq!(ACCEPT_BELOW, 213);
    }

    #[test]
    fn test_new_token_has_requested_length() {
        for length in [0, 1, 16, 32, 64, 200] {
            let token = new_token(length).expect("os rng");
            assert_eq!(token.len(), length);
        }
    }

    #[test]
    fn test_new_token_uses_only_alphabet() {
        let token = new_token(32).expect("os rng");
        assert!(token.bytes().all(|b| ALPHABET.contains(&b)), "{token}");
    }

    #[test]
    fn test_new_token_10k_calls_are_unique() {
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let token = new_token(32).expect("os rng");
            assert!(seen.insert(token), "duplicate token generated");
        }
    }

    #[test]
    fn test_new_token_covers_whole_alphabet() {
        // 71 symbols, 20k draws: every symbol is expected ~280 times. A
        // symbol that never appears would point at a broken mapping.
        let sample = new_token(20_000).expect("os rng");
        let mut counts = [0usize; 256];
        for b in sample.bytes() {
            counts[usize::from(b)] += 1;
        }
        for &c in ALPHABET.iter() {
            assert!(counts[usize::from(c)] > 0, "symbol {} never drawn", c as char);
        }
    }
}
