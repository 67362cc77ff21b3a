//! JSON codec for [`PatriciaTrie`].
//!
//! A node is written together with the label of the edge leading to it:
//! `{"label": "test", "is_end_of_word": true, "children": {"i": .., "e": ..}}`.
//! The root has the empty label and `children` is keyed by the first symbol of
//! each edge. A leafless edge is a terminal record with no children.

use serde_json::{Map, Value};
use tracing::debug;

use super::{Edge, Label, PatriciaNode, PatriciaTrie};
use crate::codec;
use crate::error::{Result, TrieError};
use crate::key;

impl PatriciaTrie {
    pub fn to_json(&self) -> Value {
        record(String::new(), self.root.terminal, Some(&*self.root))
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        codec::render(&self.to_json(), pretty)
    }

    /// Rebuild a trie from its JSON tree. Fails without returning a partial
    /// trie if any record is malformed.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = codec::as_object(value, "$")?;
        if !codec::str_field(obj, "label", "$")?.is_empty() {
            return Err(TrieError::malformed("$.label", "root label must be empty"));
        }
        if codec::bool_field(obj, "is_end_of_word", "$")? {
            return Err(TrieError::malformed(
                "$.is_end_of_word",
                "the empty key cannot be stored",
            ));
        }
        let mut root = Box::new(PatriciaNode::new());
        let mut trail = Vec::new();
        read_children(obj, &mut trail, &mut root)?;
        let trie = PatriciaTrie::from_root(root);
        debug!(words = trie.len(), "loaded patricia trie");
        Ok(trie)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_json(&codec::parse(bytes)?)
    }
}

/// The record of a node reached through an edge labelled `label`. A leafless
/// edge has no node and is written with empty `children`.
fn record(label: String, terminal: bool, node: Option<&PatriciaNode>) -> Value {
    let mut children = Map::new();
    for edge in node.into_iter().flat_map(|node| node.edges.iter().flatten()) {
        let child = match edge.child.as_deref() {
            Some(child) => record(key::to_string(&edge.label), child.terminal, Some(child)),
            None => record(key::to_string(&edge.label), true, None),
        };
        children.insert((edge.label[0] as char).to_string(), child);
    }
    let mut obj = Map::new();
    obj.insert("label".into(), Value::String(label));
    obj.insert("is_end_of_word".into(), Value::Bool(terminal));
    obj.insert("children".into(), Value::Object(children));
    Value::Object(obj)
}

/// JSON path of the record reached through the `children` keys in `trail`.
fn json_path(trail: &[&str]) -> String {
    let mut path = String::from("$");
    for name in trail {
        path.push_str(".children.");
        path.push_str(name);
    }
    path
}

/// Codec helpers report paths relative to the record; `trail` holds the
/// `children` keys leading to it and is only formatted when a record fails.
fn read_children<'a>(
    obj: &'a Map<String, Value>,
    trail: &mut Vec<&'a str>,
    node: &mut PatriciaNode,
) -> Result<()> {
    let children = codec::object_field(obj, "children", "")
        .map_err(|err| err.within(&json_path(trail)))?;
    for (name, value) in children {
        trail.push(name);
        let edge = read_edge(value, trail)?;
        if name.as_bytes() != &edge.label[..1] {
            return Err(TrieError::malformed(
                json_path(trail),
                format!(
                    "key does not match the first symbol of {:?}",
                    key::to_string(&edge.label)
                ),
            ));
        }
        trail.pop();
        let slot = edge.label[0] as usize;
        node.edges[slot] = Some(Box::new(edge));
    }
    Ok(())
}

fn read_edge<'a>(value: &'a Value, trail: &mut Vec<&'a str>) -> Result<Edge> {
    let obj = codec::as_object(value, "").map_err(|err| err.within(&json_path(trail)))?;
    let text = codec::str_field(obj, "label", "").map_err(|err| err.within(&json_path(trail)))?;
    if text.is_empty() || !text.bytes().all(key::is_symbol) {
        return Err(TrieError::malformed(
            format!("{}.label", json_path(trail)),
            "expected a non-empty string of ASCII symbols",
        ));
    }
    let label = Label::from_slice(text.as_bytes());
    let terminal = codec::bool_field(obj, "is_end_of_word", "")
        .map_err(|err| err.within(&json_path(trail)))?;

    let mut child = Box::new(PatriciaNode::new());
    read_children(obj, trail, &mut child)?;
    if child.edge_count() == 0 {
        if !terminal {
            return Err(TrieError::malformed(json_path(trail), "edge leads to no key"));
        }
        return Ok(Edge { label, child: None });
    }
    child.terminal = terminal;
    Ok(Edge {
        label,
        child: Some(child),
    })
}
