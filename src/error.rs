//! Error types for trie-index

use thiserror::Error;

/// Result type alias using [`TrieError`]
pub type Result<T> = std::result::Result<T, TrieError>;

/// Errors reported by the trie engines and their JSON codecs.
#[derive(Error, Debug)]
pub enum TrieError {
    /// A key must contain at least one symbol
    #[error("Empty key")]
    EmptyKey,

    /// Key byte outside the `1..=127` alphabet
    #[error("Invalid symbol 0x{byte:02x} at position {position}")]
    InvalidSymbol { byte: u8, position: usize },

    /// Terminal markers must be nonzero
    #[error("Terminal marker must be nonzero")]
    ZeroMarker,

    /// JSON text could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that does not describe a trie
    #[error("Malformed trie at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl TrieError {
    /// Create a malformed-input error for the field at `path`
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TrieError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Anchor a malformed-input path that was reported relative to a record
    /// at `prefix`. Other errors pass through unchanged.
    pub(crate) fn within(self, prefix: &str) -> Self {
        match self {
            TrieError::Malformed { path, reason } => TrieError::Malformed {
                path: format!("{prefix}{path}"),
                reason,
            },
            other => other,
        }
    }

    /// True for errors caused by the caller passing an unusable key or marker.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            TrieError::EmptyKey | TrieError::InvalidSymbol { .. } | TrieError::ZeroMarker
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TrieError::InvalidSymbol { byte: 0xe9, position: 3 };
        assert_eq!(err.to_string(), "Invalid symbol 0xe9 at position 3");

        let err = TrieError::malformed("$.middle.char", "expected a string");
        assert_eq!(err.to_string(), "Malformed trie at $.middle.char: expected a string");
        assert!(!err.is_contract_violation());
        assert!(TrieError::ZeroMarker.is_contract_violation());
    }

    #[test]
    fn test_within_prefixes_relative_paths() {
        let err = TrieError::malformed(".label", "bad").within("$.children.a");
        match err {
            TrieError::Malformed { path, .. } => assert_eq!(path, "$.children.a.label"),
            other => panic!("unexpected {other:?}"),
        }
        let err = TrieError::EmptyKey.within("$");
        assert!(matches!(err, TrieError::EmptyKey));
    }
}
