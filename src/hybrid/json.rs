//! JSON codec for [`HybridTrie`].
//!
//! Each node is written as
//! `{"char": "h", "is_end_of_word": false, "left": .., "middle": .., "right": ..}`
//! with `left`/`middle`/`right` standing for `inf`/`eq`/`sup` and `null` for
//! an absent child. Loading rebuilds the same nodes one for one, so an
//! unbalanced or hand-edited shape survives a save/load cycle unchanged.
//!
//! Markers are not part of the format. Loaded terminals are numbered `1..=n`
//! in alphabetical order.

use std::num::NonZeroU64;

use serde_json::{Map, Value};
use tracing::debug;

use super::{fold, HybridNode, HybridTrie, Link};
use crate::codec;
use crate::error::{Result, TrieError};
use crate::key;

const CHILDREN: [&str; 3] = ["left", "middle", "right"];

impl HybridTrie {
    pub fn to_json(&self) -> Value {
        fold(&self.root, node_to_json).unwrap_or(Value::Null)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        codec::render(&self.to_json(), pretty)
    }

    /// Rebuild a trie from its JSON tree. Fails without returning a partial
    /// trie if any node record is malformed.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut root = read_tree(value)?;
        number_markers(&mut root);
        let trie = HybridTrie::from_root(root);
        debug!(words = trie.len(), "loaded hybrid trie");
        Ok(trie)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_json(&codec::parse(bytes)?)
    }
}

fn node_to_json(node: &HybridNode, children: [Option<Value>; 3]) -> Value {
    let mut obj = Map::new();
    obj.insert("char".into(), Value::String((node.label as char).to_string()));
    obj.insert("is_end_of_word".into(), Value::Bool(node.marker.is_some()));
    for (name, child) in CHILDREN.into_iter().zip(children) {
        obj.insert(name.into(), child.unwrap_or(Value::Null));
    }
    Value::Object(obj)
}

/// A node record that passed validation, in document pre-order.
struct Record {
    parent: Option<usize>,
    name: &'static str,
    label: u8,
    terminal: bool,
    present: [bool; 3],
}

/// JSON path of the child `name` under record `parent`, `$` for the root.
fn json_path(records: &[Record], mut parent: Option<usize>, name: &str) -> String {
    let mut names = vec![name];
    while let Some(at) = parent {
        names.push(records[at].name);
        parent = records[at].parent;
    }
    let mut path = String::from("$");
    for name in names.iter().rev().filter(|name| !name.is_empty()) {
        path.push('.');
        path.push_str(name);
    }
    path
}

/// Validate every record top-down, then assemble the nodes bottom-up. Neither
/// pass recurses.
fn read_tree(value: &Value) -> Result<Link> {
    let mut records: Vec<Record> = Vec::new();
    let mut pending: Vec<(&Value, Option<usize>, &'static str)> = Vec::new();
    if !value.is_null() {
        pending.push((value, None, ""));
    }
    while let Some((value, parent, name)) = pending.pop() {
        let (label, terminal, children) = read_record(value)
            .map_err(|err| err.within(&json_path(&records, parent, name)))?;
        let at = records.len();
        let present = children.map(|child| !child.is_null());
        records.push(Record {
            parent,
            name,
            label,
            terminal,
            present,
        });
        // Pushed right to left so records are checked in document order.
        for (child, name) in children.into_iter().zip(CHILDREN).rev() {
            if !child.is_null() {
                pending.push((child, Some(at), name));
            }
        }
    }

    // Reversed pre-order finishes the `left`, `middle` and `right` subtrees
    // of a record before the record itself.
    let mut built: Vec<Box<HybridNode>> = Vec::new();
    for record in records.iter().rev() {
        let [has_inf, has_eq, has_sup] = record.present;
        let inf = if has_inf { built.pop() } else { None };
        let eq = if has_eq { built.pop() } else { None };
        let sup = if has_sup { built.pop() } else { None };
        built.push(Box::new(HybridNode {
            label: record.label,
            marker: record.terminal.then_some(NonZeroU64::MIN),
            inf,
            eq,
            sup,
        }));
    }
    Ok(built.pop())
}

/// Check one node record. Error paths are relative to the record.
fn read_record(value: &Value) -> Result<(u8, bool, [&Value; 3])> {
    let obj = value.as_object().ok_or_else(|| {
        TrieError::malformed(
            "",
            format!("expected object or null, found {}", codec::kind(value)),
        )
    })?;
    let label = match codec::str_field(obj, "char", "")?.as_bytes() {
        &[c] if key::is_symbol(c) => c,
        _ => return Err(TrieError::malformed(".char", "expected a single ASCII symbol")),
    };
    let terminal = codec::bool_field(obj, "is_end_of_word", "")?;
    let children = [
        codec::field(obj, "left", "")?,
        codec::field(obj, "middle", "")?,
        codec::field(obj, "right", "")?,
    ];
    Ok((label, terminal, children))
}

enum Slot<'a> {
    Node(&'a mut Link),
    Marker(&'a mut Option<NonZeroU64>),
}

/// Renumber terminal markers `1..=n` in alphabetical key order.
fn number_markers(root: &mut Link) {
    let mut next = NonZeroU64::MIN;
    let mut stack = vec![Slot::Node(root)];
    while let Some(slot) = stack.pop() {
        match slot {
            Slot::Node(link) => {
                let Some(node) = link.as_deref_mut() else {
                    continue;
                };
                let HybridNode {
                    marker,
                    inf,
                    eq,
                    sup,
                    ..
                } = node;
                stack.push(Slot::Node(sup));
                stack.push(Slot::Node(eq));
                stack.push(Slot::Marker(marker));
                stack.push(Slot::Node(inf));
            }
            Slot::Marker(marker) => {
                if marker.is_some() {
                    *marker = Some(next);
                    next = next.saturating_add(1);
                }
            }
        }
    }
}
