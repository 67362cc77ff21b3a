//! # trie-index
//!
//! Two trie engines over ASCII keys, each with an exact JSON round-trip:
//!
//! - [`PatriciaTrie`]: a compressed radix trie with multi-symbol edge labels
//! - [`HybridTrie`]: a ternary search trie whose sibling levels can be kept
//!   AVL-balanced
//!
//! Keys are non-empty byte strings over the symbols `1..=127`.
//!
//! ## Example
//!
//! ```rust
//! use trie_index::{HybridTrie, PatriciaTrie};
//!
//! let mut words = PatriciaTrie::new();
//! words.insert(b"test").unwrap();
//! words.insert(b"testing").unwrap();
//! assert_eq!(words.prefix_count(b"test"), 2);
//!
//! let text = words.to_json_string(false).unwrap();
//! let back = PatriciaTrie::from_json_slice(text.as_bytes()).unwrap();
//! assert_eq!(back.keys(), vec!["test", "testing"]);
//!
//! let mut hybrid = HybridTrie::new();
//! hybrid.insert(b"help", 1).unwrap();
//! hybrid.insert(b"hello", 2).unwrap();
//! assert_eq!(hybrid.keys(), vec!["hello", "help"]);
//! ```

pub mod error;
pub mod hybrid;
pub mod key;
pub mod patricia;

mod codec;

use std::fmt;

use serde_json::Value;

pub use error::{Result, TrieError};
pub use hybrid::{HybridStats, HybridTrie};
pub use patricia::{PatriciaStats, PatriciaTrie};

/// Configuration shared by both engines and the command-line tool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Use the AVL-rebalancing insert for hybrid tries (also during merges)
    pub rebalance: bool,
    /// Indent JSON output
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rebalance: false,
            pretty_json: true,
        }
    }
}

/// Operations common to both engines.
///
/// Lets callers such as the command-line tool drive either engine through a
/// single code path.
pub trait WordTrie: Sized {
    type Stats: fmt::Display;

    fn with_config(config: &Config) -> Self;

    /// Add `word`; `seq` is its 1-based position in the input and becomes the
    /// terminal marker where the engine keeps one.
    fn add_word(&mut self, word: &[u8], seq: u64) -> Result<bool>;

    fn remove_word(&mut self, word: &[u8]) -> Result<bool>;

    fn contains_word(&self, word: &[u8]) -> bool;

    fn count_prefix(&self, prefix: &[u8]) -> usize;

    /// Stored words in alphabetical order.
    fn words(&self) -> Vec<String>;

    fn word_count(&self) -> usize;

    fn tree_height(&self) -> isize;

    fn mean_depth(&self) -> f64;

    /// Union of both tries; `other` is consumed.
    fn absorb(self, other: Self) -> Self;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value, config: &Config) -> Result<Self>;

    fn stats(&self) -> Self::Stats;

    fn dump(&self) -> String;

    fn verify(&self) -> Vec<String>;
}

impl WordTrie for PatriciaTrie {
    type Stats = PatriciaStats;

    fn with_config(_config: &Config) -> Self {
        PatriciaTrie::new()
    }

    fn add_word(&mut self, word: &[u8], _seq: u64) -> Result<bool> {
        self.insert(word)
    }

    fn remove_word(&mut self, word: &[u8]) -> Result<bool> {
        self.remove(word)
    }

    fn contains_word(&self, word: &[u8]) -> bool {
        self.contains(word)
    }

    fn count_prefix(&self, prefix: &[u8]) -> usize {
        self.prefix_count(prefix)
    }

    fn words(&self) -> Vec<String> {
        self.keys()
    }

    fn word_count(&self) -> usize {
        self.len()
    }

    fn tree_height(&self) -> isize {
        self.height()
    }

    fn mean_depth(&self) -> f64 {
        self.average_depth_f64()
    }

    fn absorb(self, other: Self) -> Self {
        self.merge(other)
    }

    fn to_value(&self) -> Value {
        self.to_json()
    }

    fn from_value(value: &Value, _config: &Config) -> Result<Self> {
        PatriciaTrie::from_json(value)
    }

    fn stats(&self) -> PatriciaStats {
        PatriciaTrie::stats(self)
    }

    fn dump(&self) -> String {
        PatriciaTrie::dump(self)
    }

    fn verify(&self) -> Vec<String> {
        PatriciaTrie::verify(self)
    }
}

impl WordTrie for HybridTrie {
    type Stats = HybridStats;

    fn with_config(config: &Config) -> Self {
        HybridTrie::with_config(config)
    }

    fn add_word(&mut self, word: &[u8], seq: u64) -> Result<bool> {
        if self.rebalances() {
            self.insert_balanced(word, seq)
        } else {
            self.insert(word, seq)
        }
    }

    fn remove_word(&mut self, word: &[u8]) -> Result<bool> {
        self.remove(word)
    }

    fn contains_word(&self, word: &[u8]) -> bool {
        self.contains(word)
    }

    fn count_prefix(&self, prefix: &[u8]) -> usize {
        self.prefix_count(prefix)
    }

    fn words(&self) -> Vec<String> {
        self.keys()
    }

    fn word_count(&self) -> usize {
        self.len()
    }

    fn tree_height(&self) -> isize {
        self.height()
    }

    fn mean_depth(&self) -> f64 {
        self.average_depth_f64()
    }

    fn absorb(mut self, other: Self) -> Self {
        self.merge(other);
        self
    }

    fn to_value(&self) -> Value {
        self.to_json()
    }

    fn from_value(value: &Value, config: &Config) -> Result<Self> {
        let mut trie = HybridTrie::from_json(value)?;
        trie.set_rebalance(config.rebalance);
        Ok(trie)
    }

    fn stats(&self) -> HybridStats {
        HybridTrie::stats(self)
    }

    fn dump(&self) -> String {
        HybridTrie::dump(self)
    }

    fn verify(&self) -> Vec<String> {
        HybridTrie::verify(self)
    }
}

/// Build a trie from `words`, numbering them from 1 in input order.
pub fn build_from_words<T, I>(words: I, config: &Config) -> Result<T>
where
    T: WordTrie,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut trie = T::with_config(config);
    for (seq, word) in (1..).zip(words) {
        trie.add_word(word.as_ref(), seq)?;
    }
    Ok(trie)
}

/// Parse a serialized trie.
pub fn load<T: WordTrie>(bytes: &[u8], config: &Config) -> Result<T> {
    T::from_value(&codec::parse(bytes)?, config)
}

/// Serialize `trie` to JSON text, pretty-printed if the config asks for it.
pub fn render<T: WordTrie>(trie: &T, config: &Config) -> Result<String> {
    codec::render(&trie.to_value(), config.pretty_json)
}


#[cfg(test)]
mod proptests;
