//! Hybrid trie: a ternary search trie over ASCII keys.
//!
//! Every depth level of the trie is itself a binary search tree over sibling
//! symbols:
//! - `inf` / `sup` hold keys whose symbol at this depth sorts below / above
//!   the node label, without consuming input
//! - `eq` holds the continuation of the key once the label is consumed
//!
//! A node carries a terminal marker when a key ends on it. Markers are
//! caller-supplied nonzero values (usually insertion sequence numbers); the
//! first marker assigned to a key wins.
//!
//! The rebalancing insert keeps each sibling BST AVL-balanced. Rotations only
//! rewire `inf`/`sup` links, so the `eq` continuation of a rotated node moves
//! with it.

mod debug;
mod json;

use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU64;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{Result, TrieError};
use crate::key;
use crate::Config;

type Link = Option<Box<HybridNode>>;

/// Path buffer used while walking keys back out of the trie.
type KeyPath = SmallVec<[u8; 32]>;

pub(crate) struct HybridNode {
    pub(crate) label: u8,
    pub(crate) marker: Option<NonZeroU64>,
    pub(crate) inf: Link,
    pub(crate) eq: Link,
    pub(crate) sup: Link,
}

impl HybridNode {
    fn new(label: u8) -> Self {
        Self {
            label,
            marker: None,
            inf: None,
            eq: None,
            sup: None,
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.inf.is_none() && self.eq.is_none() && self.sup.is_none()
    }
}

/// Structural statistics for a [`HybridTrie`].
#[derive(Debug, Clone, PartialEq)]
pub struct HybridStats {
    /// Number of stored keys
    pub words: usize,
    /// Number of allocated nodes
    pub nodes: usize,
    /// Number of absent child links (including an absent root)
    pub nil_links: usize,
    /// Height, -1 when empty
    pub height: isize,
    /// Average leaf depth, -1.0 when empty
    pub average_depth: f64,
    /// Sibling height of the root level BST
    pub root_level_height: usize,
}

impl fmt::Display for HybridStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "words: {}", self.words)?;
        writeln!(f, "nodes: {}", self.nodes)?;
        writeln!(f, "nil links: {}", self.nil_links)?;
        writeln!(f, "height: {}", self.height)?;
        writeln!(f, "average depth: {:.3}", self.average_depth)?;
        write!(f, "root level height: {}", self.root_level_height)
    }
}

/// A ternary search trie with optional AVL balancing of sibling levels.
pub struct HybridTrie {
    root: Link,
    len: usize,
    rebalance: bool,
}

impl HybridTrie {
    /// Create an empty trie using plain insertion for merges.
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            rebalance: false,
        }
    }

    /// Create an empty trie; `config.rebalance` selects the insertion variant
    /// used by [`merge`](Self::merge) and the [`WordTrie`](crate::WordTrie)
    /// interface.
    pub fn with_config(config: &Config) -> Self {
        let mut trie = Self::new();
        trie.rebalance = config.rebalance;
        trie
    }

    pub(crate) fn from_root(root: Link) -> Self {
        let len = count_markers(&root);
        Self {
            root,
            len,
            rebalance: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Does insertion through the generic interface rebalance?
    pub fn rebalances(&self) -> bool {
        self.rebalance
    }

    pub fn set_rebalance(&mut self, rebalance: bool) {
        self.rebalance = rebalance;
    }

    /// Insert `key` with terminal marker `marker`.
    ///
    /// Returns `true` if the key was not present. Re-inserting an existing key
    /// keeps its original marker.
    pub fn insert(&mut self, key: &[u8], marker: u64) -> Result<bool> {
        let marker = check_insert(key, marker)?;
        let added = insert_plain(&mut self.root, key, marker);
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// Insert `key` and restore AVL balance of every sibling level on the
    /// insertion path.
    pub fn insert_balanced(&mut self, key: &[u8], marker: u64) -> Result<bool> {
        let marker = check_insert(key, marker)?;
        let added = insert_balanced(&mut self.root, key, marker);
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// Insert with the variant selected at construction time.
    pub(crate) fn insert_configured(&mut self, key: &[u8], marker: NonZeroU64) -> bool {
        let added = if self.rebalance {
            insert_balanced(&mut self.root, key, marker)
        } else {
            insert_plain(&mut self.root, key, marker)
        };
        if added {
            self.len += 1;
        }
        added
    }

    /// Remove `key`. Returns `true` if it was present.
    ///
    /// Every node on the search path that ends up without a marker and without
    /// an `eq` continuation is spliced out.
    pub fn remove(&mut self, key: &[u8]) -> Result<bool> {
        key::validate(key)?;
        let removed = remove(&mut self.root, key);
        if removed {
            self.len -= 1;
        }
        Ok(removed)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.marker(key).is_some()
    }

    /// Terminal marker stored for `key`.
    pub fn marker(&self, key: &[u8]) -> Option<u64> {
        self.find(key)
            .and_then(|node| node.marker)
            .map(NonZeroU64::get)
    }

    /// Number of stored keys starting with `prefix`.
    ///
    /// The empty prefix matches every key.
    pub fn prefix_count(&self, prefix: &[u8]) -> usize {
        if prefix.is_empty() {
            return self.len;
        }
        match self.find(prefix) {
            Some(node) => usize::from(node.marker.is_some()) + count_markers(&node.eq),
            None => 0,
        }
    }

    /// All keys in alphabetical order.
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        visit_keys(&self.root, &mut |key, _| out.push(key::to_string(key)));
        out
    }

    /// All keys with their markers, in alphabetical order.
    pub fn entries(&self) -> Vec<(String, u64)> {
        let mut out = Vec::with_capacity(self.len);
        visit_keys(&self.root, &mut |key, marker| {
            out.push((key::to_string(key), marker.get()))
        });
        out
    }

    /// -1 for an empty trie, 0 for a single node.
    pub fn height(&self) -> isize {
        height(&self.root)
    }

    /// Floor of the average leaf depth (root depth 0), -1 when empty.
    pub fn average_depth(&self) -> isize {
        match self.leaf_depths() {
            (_, 0) => -1,
            (sum, leaves) => (sum / leaves) as isize,
        }
    }

    /// Average leaf depth (root depth 0), -1.0 when empty.
    pub fn average_depth_f64(&self) -> f64 {
        match self.leaf_depths() {
            (_, 0) => -1.0,
            (sum, leaves) => sum as f64 / leaves as f64,
        }
    }

    fn leaf_depths(&self) -> (usize, usize) {
        leaf_depths(&self.root)
    }

    pub fn node_count(&self) -> usize {
        node_count(&self.root)
    }

    /// Number of absent child links, counting an absent root.
    pub fn nil_count(&self) -> usize {
        nil_count(&self.root)
    }

    pub fn stats(&self) -> HybridStats {
        HybridStats {
            words: self.len,
            nodes: self.node_count(),
            nil_links: self.nil_count(),
            height: self.height(),
            average_depth: self.average_depth_f64(),
            root_level_height: sibling_height(&self.root),
        }
    }

    /// Move every key of `other` into this trie.
    ///
    /// Keys keep the marker they had in `other` unless they already exist
    /// here. `other` is consumed.
    pub fn merge(&mut self, mut other: HybridTrie) {
        let source = other.root.take();
        let before = self.len;
        visit_keys(&source, &mut |key, marker| {
            self.insert_configured(key, marker);
        });
        free(source);
        debug!(
            added = self.len - before,
            total = self.len,
            "merged hybrid trie"
        );
    }

    /// A new trie holding the union of both key sets; inputs are untouched.
    pub fn merged(&self, other: &HybridTrie) -> HybridTrie {
        let mut out = self.clone();
        visit_keys(&other.root, &mut |key, marker| {
            out.insert_configured(key, marker);
        });
        debug!(total = out.len, "copied hybrid trie union");
        out
    }

    /// Node reached after consuming all of `key`.
    fn find(&self, mut key: &[u8]) -> Option<&HybridNode> {
        let mut link = self.root.as_deref();
        while let (Some(node), Some(c)) = (link, key::first(key)) {
            match c.cmp(&node.label) {
                Ordering::Less => link = node.inf.as_deref(),
                Ordering::Greater => link = node.sup.as_deref(),
                Ordering::Equal => {
                    let rest = key::rest(key);
                    if rest.is_empty() {
                        return Some(node);
                    }
                    key = rest;
                    link = node.eq.as_deref();
                }
            }
        }
        None
    }
}

impl Default for HybridTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HybridTrie {
    fn clone(&self) -> Self {
        Self {
            root: copy(&self.root),
            len: self.len,
            rebalance: self.rebalance,
        }
    }
}

impl fmt::Debug for HybridTrie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridTrie")
            .field("len", &self.len)
            .field("rebalance", &self.rebalance)
            .finish_non_exhaustive()
    }
}

impl Drop for HybridTrie {
    fn drop(&mut self) {
        free(self.root.take());
    }
}

fn check_insert(key: &[u8], marker: u64) -> Result<NonZeroU64> {
    key::validate(key)?;
    NonZeroU64::new(marker).ok_or(TrieError::ZeroMarker)
}

/// Tear a subtree down without recursing, so long keys cannot exhaust the stack.
pub(crate) fn free(link: Link) {
    let mut stack: Vec<Box<HybridNode>> = link.into_iter().collect();
    while let Some(mut node) = stack.pop() {
        stack.extend(node.inf.take());
        stack.extend(node.eq.take());
        stack.extend(node.sup.take());
    }
}

fn insert_plain(mut slot: &mut Link, mut key: &[u8], marker: NonZeroU64) -> bool {
    while let Some(c) = key::first(key) {
        let node = slot.get_or_insert_with(|| Box::new(HybridNode::new(c)));
        match c.cmp(&node.label) {
            Ordering::Less => slot = &mut node.inf,
            Ordering::Greater => slot = &mut node.sup,
            Ordering::Equal => {
                let rest = key::rest(key);
                if rest.is_empty() {
                    if node.marker.is_some() {
                        return false;
                    }
                    node.marker = Some(marker);
                    return true;
                }
                key = rest;
                slot = &mut node.eq;
            }
        }
    }
    false
}

/// Insert one level at a time: place `c` in the sibling BST of the current
/// level, restore that level's balance, then continue into the `eq` link of
/// the node labelled `c`. Deeper levels never change the sibling heights of
/// the levels above them.
fn insert_balanced(mut slot: &mut Link, mut key: &[u8], marker: NonZeroU64) -> bool {
    while let Some(c) = key::first(key) {
        insert_sibling(slot, c);
        let Some(node) = find_sibling(slot, c) else {
            return false;
        };
        let rest = key::rest(key);
        if rest.is_empty() {
            if node.marker.is_some() {
                return false;
            }
            node.marker = Some(marker);
            return true;
        }
        key = rest;
        slot = &mut node.eq;
    }
    false
}

/// Add a node labelled `c` to one sibling level if it is missing, rebalancing
/// on the way back up. Recursion depth is bounded by the level's height.
fn insert_sibling(slot: &mut Link, c: u8) {
    let node = slot.get_or_insert_with(|| Box::new(HybridNode::new(c)));
    match c.cmp(&node.label) {
        Ordering::Less => insert_sibling(&mut node.inf, c),
        Ordering::Greater => insert_sibling(&mut node.sup, c),
        Ordering::Equal => return,
    }
    rebalance(slot);
}

fn find_sibling(mut slot: &mut Link, c: u8) -> Option<&mut HybridNode> {
    while let Some(node) = slot {
        match c.cmp(&node.label) {
            Ordering::Less => slot = &mut node.inf,
            Ordering::Greater => slot = &mut node.sup,
            Ordering::Equal => return Some(node),
        }
    }
    None
}

/// Number of nodes on the longest path that only follows `inf`/`sup` links.
pub(crate) fn sibling_height(link: &Link) -> usize {
    let mut stack: Vec<(&HybridNode, usize)> =
        link.as_deref().map(|n| (n, 1)).into_iter().collect();
    let mut height = 0;
    while let Some((node, h)) = stack.pop() {
        height = height.max(h);
        stack.extend(node.inf.as_deref().map(|n| (n, h + 1)));
        stack.extend(node.sup.as_deref().map(|n| (n, h + 1)));
    }
    height
}

fn rebalance(slot: &mut Link) {
    let Some(node) = slot.as_deref_mut() else {
        return;
    };
    let balance = sibling_height(&node.inf) as isize - sibling_height(&node.sup) as isize;
    if balance > 1 {
        let zig_zag = node
            .inf
            .as_deref()
            .is_some_and(|inf| sibling_height(&inf.sup) > sibling_height(&inf.inf));
        if zig_zag {
            rotate_left(&mut node.inf);
        }
        rotate_right(slot);
    } else if balance < -1 {
        let zig_zag = node
            .sup
            .as_deref()
            .is_some_and(|sup| sibling_height(&sup.inf) > sibling_height(&sup.sup));
        if zig_zag {
            rotate_right(&mut node.sup);
        }
        rotate_left(slot);
    }
}

fn rotate_right(slot: &mut Link) {
    let Some(mut node) = slot.take() else {
        return;
    };
    let Some(mut pivot) = node.inf.take() else {
        *slot = Some(node);
        return;
    };
    trace!(from = %(node.label as char), to = %(pivot.label as char), "rotate right");
    node.inf = pivot.sup.take();
    pivot.sup = Some(node);
    *slot = Some(pivot);
}

fn rotate_left(slot: &mut Link) {
    let Some(mut node) = slot.take() else {
        return;
    };
    let Some(mut pivot) = node.sup.take() else {
        *slot = Some(node);
        return;
    };
    trace!(from = %(node.label as char), to = %(pivot.label as char), "rotate left");
    node.sup = pivot.inf.take();
    pivot.inf = Some(node);
    *slot = Some(pivot);
}

/// What the removal search saw at one node of the path.
struct PathNode {
    step: Ordering,
    marked: bool,
    has_siblings: bool,
    has_eq: bool,
}

/// Remove `key` in two passes without recursion.
///
/// The first pass records the search path. Removing the marker makes the end
/// node redundant when it has no `eq` continuation; splicing it out empties
/// its parent's `eq` link when it also had no siblings, which can make that
/// parent redundant in turn. The topmost node of that chain is located from
/// the recorded path and spliced out in the second pass, dropping the chain
/// below it.
fn remove(root: &mut Link, key: &[u8]) -> bool {
    let mut trail: Vec<PathNode> = Vec::new();
    let mut link = root.as_deref();
    let mut rest = key;
    loop {
        let (Some(node), Some(c)) = (link, key::first(rest)) else {
            return false;
        };
        let step = c.cmp(&node.label);
        trail.push(PathNode {
            step,
            marked: node.marker.is_some(),
            has_siblings: node.inf.is_some() || node.sup.is_some(),
            has_eq: node.eq.is_some(),
        });
        match step {
            Ordering::Less => link = node.inf.as_deref(),
            Ordering::Greater => link = node.sup.as_deref(),
            Ordering::Equal => {
                rest = key::rest(rest);
                if rest.is_empty() {
                    break;
                }
                link = node.eq.as_deref();
            }
        }
    }

    let end = trail.len() - 1;
    if !trail[end].marked {
        return false;
    }
    let cut = (!trail[end].has_eq).then(|| {
        let mut top = end;
        while top > 0
            && !trail[top].has_siblings
            && trail[top - 1].step == Ordering::Equal
            && !trail[top - 1].marked
        {
            top -= 1;
        }
        top
    });

    let mut slot = root;
    for seen in &trail[..cut.unwrap_or(end)] {
        let Some(node) = slot.as_deref_mut() else {
            return false;
        };
        slot = match seen.step {
            Ordering::Less => &mut node.inf,
            Ordering::Greater => &mut node.sup,
            Ordering::Equal => &mut node.eq,
        };
    }
    match cut {
        None => {
            if let Some(node) = slot.as_deref_mut() {
                node.marker = None;
            }
        }
        Some(_) => {
            if let Some(mut node) = slot.take() {
                *slot = join(node.inf.take(), node.sup.take());
                free(node.eq.take());
            }
        }
    }
    true
}

/// Join two sibling subtrees where every label of `inf` sorts below every
/// label of `sup`.
fn join(inf: Link, sup: Link) -> Link {
    match (inf, sup) {
        (Some(mut inf), Some(sup)) => {
            attach_rightmost(&mut inf.sup, sup);
            Some(inf)
        }
        (inf, None) => inf,
        (None, sup) => sup,
    }
}

fn attach_rightmost(mut slot: &mut Link, subtree: Box<HybridNode>) {
    loop {
        match slot {
            Some(node) => slot = &mut node.sup,
            None => {
                *slot = Some(subtree);
                return;
            }
        }
    }
}

/// Pre-order walk yielding `(depth, node)` for every node below a link, with
/// the top node at depth 0.
struct Walk<'a> {
    stack: Vec<(usize, &'a HybridNode)>,
}

impl<'a> Walk<'a> {
    fn new(link: &'a Link) -> Self {
        Self {
            stack: link.as_deref().map(|node| (0, node)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a HybridNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in [&node.inf, &node.eq, &node.sup] {
            if let Some(child) = child.as_deref() {
                self.stack.push((depth + 1, child));
            }
        }
        Some((depth, node))
    }
}

/// Fold the tree bottom-up. `build` gets each node together with the folded
/// values of its `inf`, `eq` and `sup` children.
pub(crate) fn fold<T>(
    link: &Link,
    mut build: impl FnMut(&HybridNode, [Option<T>; 3]) -> T,
) -> Option<T> {
    let mut nodes: Vec<&HybridNode> = Walk::new(link).map(|(_, node)| node).collect();
    // Reversed pre-order visits `inf`, `eq`, `sup` and then the node itself.
    nodes.reverse();
    let mut done: Vec<T> = Vec::new();
    for node in nodes {
        let sup = node.sup.as_ref().and_then(|_| done.pop());
        let eq = node.eq.as_ref().and_then(|_| done.pop());
        let inf = node.inf.as_ref().and_then(|_| done.pop());
        done.push(build(node, [inf, eq, sup]));
    }
    done.pop()
}

fn copy(link: &Link) -> Link {
    fold(link, |node, [inf, eq, sup]| {
        Box::new(HybridNode {
            label: node.label,
            marker: node.marker,
            inf,
            eq,
            sup,
        })
    })
}

enum Visit<'a> {
    Node(&'a HybridNode),
    Label(&'a HybridNode),
    Pop,
}

/// Call `f` for every stored key in alphabetical order: the `inf` subtree,
/// the key ending on the node, its `eq` continuation, then the `sup` subtree.
fn visit_keys(link: &Link, f: &mut impl FnMut(&[u8], NonZeroU64)) {
    let mut path = KeyPath::new();
    let mut stack: Vec<Visit<'_>> = link.as_deref().map(Visit::Node).into_iter().collect();
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Node(node) => {
                stack.extend(node.sup.as_deref().map(Visit::Node));
                stack.push(Visit::Label(node));
                stack.extend(node.inf.as_deref().map(Visit::Node));
            }
            Visit::Label(node) => {
                path.push(node.label);
                if let Some(marker) = node.marker {
                    f(path.as_slice(), marker);
                }
                stack.push(Visit::Pop);
                stack.extend(node.eq.as_deref().map(Visit::Node));
            }
            Visit::Pop => {
                path.pop();
            }
        }
    }
}

fn count_markers(link: &Link) -> usize {
    Walk::new(link)
        .filter(|(_, node)| node.marker.is_some())
        .count()
}

fn height(link: &Link) -> isize {
    Walk::new(link)
        .map(|(depth, _)| depth as isize)
        .max()
        .unwrap_or(-1)
}

fn leaf_depths(link: &Link) -> (usize, usize) {
    Walk::new(link)
        .filter(|(_, node)| node.is_leaf())
        .fold((0, 0), |(sum, leaves), (depth, _)| (sum + depth, leaves + 1))
}

fn node_count(link: &Link) -> usize {
    Walk::new(link).count()
}

fn nil_count(link: &Link) -> usize {
    if link.is_none() {
        return 1;
    }
    Walk::new(link)
        .map(|(_, node)| {
            [&node.inf, &node.eq, &node.sup]
                .iter()
                .filter(|child| child.is_none())
                .count()
        })
        .sum()
}
