//! Key utilities.
//!
//! Keys are byte strings over a 128-symbol alphabet. Symbol `0` is reserved
//! for the end-of-word slot of the Patricia edge table, so valid key bytes are
//! `1..=127`.

use crate::error::{Result, TrieError};

/// Number of slots in a Patricia edge table (one per 8-bit ASCII symbol).
pub const ALPHABET_SIZE: usize = 128;

/// Reserved end-of-word slot.
pub const EOE_INDEX: usize = 0;

/// First symbol of the key, `None` for the empty key.
#[inline]
pub fn first(key: &[u8]) -> Option<u8> {
    key.first().copied()
}

/// The key without its first symbol (empty for the empty key).
#[inline]
pub fn rest(key: &[u8]) -> &[u8] {
    key.get(1..).unwrap_or(&[])
}

/// Symbol at 0-based position `i`.
#[inline]
pub fn symbol_at(key: &[u8], i: usize) -> Option<u8> {
    key.get(i).copied()
}

/// Number of symbols in the key.
#[inline]
pub fn length(key: &[u8]) -> usize {
    key.len()
}

/// Is `byte` part of the key alphabet?
#[inline]
pub fn is_symbol(byte: u8) -> bool {
    byte != 0 && (byte as usize) < ALPHABET_SIZE
}

/// Check that `key` is non-empty and uses only alphabet symbols.
pub fn validate(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(TrieError::EmptyKey);
    }
    match key.iter().position(|&b| !is_symbol(b)) {
        Some(position) => Err(TrieError::InvalidSymbol {
            byte: key[position],
            position,
        }),
        None => Ok(()),
    }
}

/// Length of the longest common prefix of `a` and `b`.
#[inline]
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Render validated key bytes as a `String`.
///
/// Every alphabet symbol is ASCII, so this is a byte-to-char widening.
pub(crate) fn to_string(key: &[u8]) -> String {
    key.iter().map(|&b| b as char).collect()
}
