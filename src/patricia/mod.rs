//! Patricia trie: a compressed radix trie over ASCII keys.
//!
//! Every node owns a 128-slot edge table indexed by the first symbol of each
//! outgoing edge. An edge consumes a whole label (one or more symbols) and
//! either leads to a child node or, when it has no child, ends a key at the
//! end of its label.
//!
//! Key termination inside the trie is a dedicated `terminal` flag on the node
//! instead of an entry in slot 0. Slot 0 stays empty because symbol 0 is
//! outside the key alphabet.
//!
//! Compression invariant, restored after every delete and merge:
//! - no child node has exactly one edge unless it is terminal
//! - no child node has zero edges (such a child is folded into a leafless edge)

mod debug;
mod json;

use std::fmt;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::Result;
use crate::key::{self, ALPHABET_SIZE};

/// Edge labels; most labels are short enough to stay inline.
pub(crate) type Label = SmallVec<[u8; 16]>;

#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub(crate) label: Label,
    pub(crate) child: Option<Box<PatriciaNode>>,
}

impl Edge {
    /// An edge ending a key at the end of `label`.
    fn leaf(label: &[u8]) -> Self {
        Self {
            label: Label::from_slice(label),
            child: None,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct PatriciaNode {
    pub(crate) terminal: bool,
    pub(crate) edges: [Option<Box<Edge>>; ALPHABET_SIZE],
}

impl PatriciaNode {
    pub(crate) fn new() -> Self {
        Self {
            terminal: false,
            edges: std::array::from_fn(|_| None),
        }
    }

    fn terminal_only() -> Box<Self> {
        let mut node = Box::new(Self::new());
        node.terminal = true;
        node
    }

    /// Edge starting with symbol `c`.
    #[inline]
    pub(crate) fn edge(&self, c: u8) -> Option<&Edge> {
        self.edges.get(c as usize)?.as_deref()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    fn word_count(&self) -> usize {
        usize::from(self.terminal)
            + self
                .edges
                .iter()
                .flatten()
                .map(|edge| edge.child.as_deref().map_or(1, PatriciaNode::word_count))
                .sum::<usize>()
    }
}

/// Structural statistics for a [`PatriciaTrie`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatriciaStats {
    /// Number of stored keys
    pub words: usize,
    /// Number of nodes, root included
    pub nodes: usize,
    /// Number of occupied edge slots
    pub edges: usize,
    /// Number of unoccupied edge slots (symbols `1..=127` of every node)
    pub nil_slots: usize,
    /// Height in edges, -1 when empty
    pub height: isize,
    /// Average depth of key ends, -1.0 when empty
    pub average_depth: f64,
}

impl fmt::Display for PatriciaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "words: {}", self.words)?;
        writeln!(f, "nodes: {}", self.nodes)?;
        writeln!(f, "edges: {}", self.edges)?;
        writeln!(f, "nil slots: {}", self.nil_slots)?;
        writeln!(f, "height: {}", self.height)?;
        write!(f, "average depth: {:.3}", self.average_depth)
    }
}

/// A compressed radix trie.
#[derive(Clone, Debug)]
pub struct PatriciaTrie {
    root: Box<PatriciaNode>,
    len: usize,
}

impl PatriciaTrie {
    pub fn new() -> Self {
        Self {
            root: Box::new(PatriciaNode::new()),
            len: 0,
        }
    }

    pub(crate) fn from_root(root: Box<PatriciaNode>) -> Self {
        let len = root.word_count();
        Self { root, len }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `key`. Returns `true` if it was not present.
    pub fn insert(&mut self, key: &[u8]) -> Result<bool> {
        key::validate(key)?;
        let added = insert(&mut self.root, key);
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Result<bool> {
        key::validate(key)?;
        let removed = remove(&mut self.root, key);
        if removed {
            self.len -= 1;
        }
        Ok(removed)
    }

    pub fn contains(&self, mut key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        let mut node = &*self.root;
        while let Some(c) = key::first(key) {
            let Some(edge) = node.edge(c) else {
                return false;
            };
            if !key.starts_with(&edge.label) {
                return false;
            }
            key = &key[edge.label.len()..];
            match edge.child.as_deref() {
                Some(child) => node = child,
                None => return key.is_empty(),
            }
        }
        node.terminal
    }

    /// Number of stored keys starting with `prefix`.
    ///
    /// The empty prefix matches every key. Returns 0 as soon as no edge can
    /// extend the match.
    pub fn prefix_count(&self, mut prefix: &[u8]) -> usize {
        let mut node = &*self.root;
        loop {
            let Some(c) = key::first(prefix) else {
                return node.word_count();
            };
            let Some(edge) = node.edge(c) else {
                return 0;
            };
            let common = key::common_prefix_len(&edge.label, prefix);
            if common == prefix.len() {
                return edge.child.as_deref().map_or(1, PatriciaNode::word_count);
            }
            if common < edge.label.len() {
                return 0;
            }
            match edge.child.as_deref() {
                Some(child) => {
                    node = child;
                    prefix = &prefix[common..];
                }
                None => return 0,
            }
        }
    }

    /// All keys in alphabetical order.
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        let mut path = Vec::new();
        collect_keys(&self.root, &mut path, &mut out);
        out
    }

    /// Number of edges on the longest root-to-leaf path, -1 when empty.
    pub fn height(&self) -> isize {
        if self.is_empty() {
            return -1;
        }
        height(&self.root) as isize
    }

    /// Floor of the average depth (in edges) at which keys end, -1 when empty.
    pub fn average_depth(&self) -> isize {
        match self.leaf_depths() {
            (_, 0) => -1,
            (sum, leaves) => (sum / leaves) as isize,
        }
    }

    /// Average depth (in edges) at which keys end, -1.0 when empty.
    pub fn average_depth_f64(&self) -> f64 {
        match self.leaf_depths() {
            (_, 0) => -1.0,
            (sum, leaves) => sum as f64 / leaves as f64,
        }
    }

    fn leaf_depths(&self) -> (usize, usize) {
        let (mut sum, mut leaves) = (0, 0);
        leaf_depths(&self.root, 0, &mut sum, &mut leaves);
        (sum, leaves)
    }

    pub fn node_count(&self) -> usize {
        node_count(&self.root)
    }

    pub fn edge_count(&self) -> usize {
        edge_count(&self.root)
    }

    /// Number of unoccupied edge slots over all nodes.
    pub fn nil_count(&self) -> usize {
        self.node_count() * (ALPHABET_SIZE - 1) - self.edge_count()
    }

    pub fn stats(&self) -> PatriciaStats {
        PatriciaStats {
            words: self.len,
            nodes: self.node_count(),
            edges: self.edge_count(),
            nil_slots: self.nil_count(),
            height: self.height(),
            average_depth: self.average_depth_f64(),
        }
    }

    /// Merge two tries, consuming both. Nodes of either input are reused.
    pub fn merge(mut self, mut other: PatriciaTrie) -> PatriciaTrie {
        let a = std::mem::replace(&mut self.root, Box::new(PatriciaNode::new()));
        let b = std::mem::replace(&mut other.root, Box::new(PatriciaNode::new()));
        let merged = PatriciaTrie::from_root(merge_nodes(a, b));
        debug!(
            left = self.len,
            right = other.len,
            total = merged.len,
            "merged patricia tries"
        );
        merged
    }

    /// The union of both tries as a new trie; inputs are untouched.
    pub fn merged(&self, other: &PatriciaTrie) -> PatriciaTrie {
        self.clone().merge(other.clone())
    }
}

impl Default for PatriciaTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PatriciaTrie {
    fn drop(&mut self) {
        let mut stack: Vec<Box<PatriciaNode>> = Vec::new();
        for slot in self.root.edges.iter_mut() {
            if let Some(child) = slot.as_mut().and_then(|edge| edge.child.take()) {
                stack.push(child);
            }
        }
        while let Some(mut node) = stack.pop() {
            for slot in node.edges.iter_mut() {
                if let Some(child) = slot.as_mut().and_then(|edge| edge.child.take()) {
                    stack.push(child);
                }
            }
        }
    }
}

fn insert(mut node: &mut PatriciaNode, mut key: &[u8]) -> bool {
    loop {
        let Some(c) = key::first(key) else {
            let added = !node.terminal;
            node.terminal = true;
            return added;
        };
        let slot = &mut node.edges[c as usize];
        let edge = match slot {
            None => {
                *slot = Some(Box::new(Edge::leaf(key)));
                return true;
            }
            Some(edge) => edge,
        };

        let common = key::common_prefix_len(&edge.label, key);
        if common < edge.label.len() {
            split(edge, common, &key[common..]);
            return true;
        }
        key = &key[common..];
        if edge.child.is_none() && key.is_empty() {
            return false;
        }
        // A leafless edge gets a terminal child for the key it already ends.
        node = &mut **edge.child.get_or_insert_with(PatriciaNode::terminal_only);
    }
}

/// Split `edge` after `at` symbols. The old suffix keeps the old child; `rest`
/// ends at the new middle node or hangs from it as a leafless edge.
fn split(edge: &mut Edge, at: usize, rest: &[u8]) {
    let old_suffix = Label::from_slice(&edge.label[at..]);
    edge.label.truncate(at);
    let mut mid = Box::new(PatriciaNode::new());
    let slot = old_suffix[0] as usize;
    mid.edges[slot] = Some(Box::new(Edge {
        label: old_suffix,
        child: edge.child.take(),
    }));
    match key::first(rest) {
        None => mid.terminal = true,
        Some(c) => mid.edges[c as usize] = Some(Box::new(Edge::leaf(rest))),
    }
    edge.child = Some(mid);
}

fn remove(node: &mut PatriciaNode, key: &[u8]) -> bool {
    let Some(c) = key::first(key) else {
        return std::mem::take(&mut node.terminal);
    };
    let c = c as usize;

    let drop_edge = {
        let Some(edge) = node.edges[c].as_deref_mut() else {
            return false;
        };
        if !key.starts_with(&edge.label) {
            return false;
        }
        let rest = &key[edge.label.len()..];
        match edge.child.as_deref_mut() {
            None if rest.is_empty() => true,
            None => return false,
            Some(child) => {
                if !remove(child, rest) {
                    return false;
                }
                !normalize(edge)
            }
        }
    };
    if drop_edge {
        node.edges[c] = None;
    }
    true
}

/// Restore the compression invariant on the child of `edge`. Returns `false`
/// when the edge itself no longer leads to any key and must be dropped.
fn normalize(edge: &mut Edge) -> bool {
    let Some(child) = edge.child.as_deref_mut() else {
        return true;
    };
    match (child.edge_count(), child.terminal) {
        (0, true) => {
            edge.child = None;
            true
        }
        (0, false) => false,
        (1, false) => {
            let Some(grandchild) = child.edges.iter_mut().find_map(Option::take) else {
                return true;
            };
            let Edge { label, child } = *grandchild;
            edge.label.extend_from_slice(&label);
            edge.child = child;
            true
        }
        _ => true,
    }
}

fn merge_nodes(mut a: Box<PatriciaNode>, mut b: Box<PatriciaNode>) -> Box<PatriciaNode> {
    a.terminal |= b.terminal;
    for (slot_a, slot_b) in a.edges.iter_mut().zip(b.edges.iter_mut()) {
        let Some(edge_b) = slot_b.take() else {
            continue;
        };
        *slot_a = Some(match slot_a.take() {
            None => edge_b,
            Some(edge_a) => merge_edges(edge_a, edge_b),
        });
    }
    a
}

/// Merge two edges sharing their first symbol. The longest common prefix
/// becomes the merged label; both remainders are merged below it.
fn merge_edges(mut edge_a: Box<Edge>, edge_b: Box<Edge>) -> Box<Edge> {
    let common = key::common_prefix_len(&edge_a.label, &edge_b.label);
    let child_a = edge_a.child.take();
    let tail_a = tail_node(&edge_a.label[common..], child_a);
    let Edge {
        label: label_b,
        child: child_b,
    } = *edge_b;
    let tail_b = tail_node(&label_b[common..], child_b);

    edge_a.label.truncate(common);
    edge_a.child = Some(merge_nodes(tail_a, tail_b));
    let live = normalize(&mut edge_a);
    debug_assert!(live, "merged edge must still lead to a key");
    edge_a
}

/// The subtrie hanging below the first `label.len() - suffix.len()` symbols of
/// an edge.
fn tail_node(suffix: &[u8], child: Option<Box<PatriciaNode>>) -> Box<PatriciaNode> {
    match key::first(suffix) {
        None => child.unwrap_or_else(PatriciaNode::terminal_only),
        Some(c) => {
            let mut node = Box::new(PatriciaNode::new());
            node.edges[c as usize] = Some(Box::new(Edge {
                label: Label::from_slice(suffix),
                child,
            }));
            node
        }
    }
}

fn collect_keys(node: &PatriciaNode, path: &mut Vec<u8>, out: &mut Vec<String>) {
    if node.terminal {
        out.push(key::to_string(path));
    }
    for edge in node.edges.iter().flatten() {
        path.extend_from_slice(&edge.label);
        match edge.child.as_deref() {
            Some(child) => collect_keys(child, path, out),
            None => out.push(key::to_string(path)),
        }
        path.truncate(path.len() - edge.label.len());
    }
}

fn height(node: &PatriciaNode) -> usize {
    node.edges
        .iter()
        .flatten()
        .map(|edge| 1 + edge.child.as_deref().map_or(0, height))
        .max()
        .unwrap_or(0)
}

fn leaf_depths(node: &PatriciaNode, depth: usize, sum: &mut usize, leaves: &mut usize) {
    if node.terminal {
        *sum += depth;
        *leaves += 1;
    }
    for edge in node.edges.iter().flatten() {
        match edge.child.as_deref() {
            Some(child) => leaf_depths(child, depth + 1, sum, leaves),
            None => {
                *sum += depth + 1;
                *leaves += 1;
            }
        }
    }
}

fn node_count(node: &PatriciaNode) -> usize {
    1 + node
        .edges
        .iter()
        .flatten()
        .filter_map(|edge| edge.child.as_deref())
        .map(node_count)
        .sum::<usize>()
}

fn edge_count(node: &PatriciaNode) -> usize {
    node.edges
        .iter()
        .flatten()
        .map(|edge| 1 + edge.child.as_deref().map_or(0, edge_count))
        .sum()
}
