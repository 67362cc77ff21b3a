//! Debug utilities for patricia trie troubleshooting.

use std::fmt::Write;

use super::{PatriciaNode, PatriciaTrie};
use crate::key;

impl PatriciaTrie {
    /// Render the edges as an indented tree, one edge per line. Edges at which
    /// a key ends are marked with `*`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("(empty)\n");
            return out;
        }
        out.push_str("(root)\n");
        dump_node(&self.root, 1, &mut out);
        out
    }

    /// Verify trie integrity - returns list of issues found.
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.root.terminal {
            issues.push("root marks the empty key".to_string());
        }
        let mut path = Vec::new();
        let words = verify_node(&self.root, &mut path, &mut issues);
        if words != self.len {
            issues.push(format!(
                "word count mismatch: cached {} vs reachable {}",
                self.len, words
            ));
        }
        issues
    }
}

fn dump_node(node: &PatriciaNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for edge in node.edges.iter().flatten() {
        let ends = edge.child.as_deref().map_or(true, |child| child.terminal);
        let _ = writeln!(
            out,
            "{indent}{}{}",
            key::to_string(&edge.label),
            if ends { " *" } else { "" }
        );
        if let Some(child) = edge.child.as_deref() {
            dump_node(child, depth + 1, out);
        }
    }
}

/// Check the edge table of `node` and every child below it. Returns the number
/// of keys ending in this subtrie.
fn verify_node(node: &PatriciaNode, path: &mut Vec<u8>, issues: &mut Vec<String>) -> usize {
    let mut words = usize::from(node.terminal);
    let at = key::to_string(path);

    if node.edges[key::EOE_INDEX].is_some() {
        issues.push(format!("{at:?}: edge stored in the end-of-word slot"));
    }
    let labels: Vec<&[u8]> = node
        .edges
        .iter()
        .flatten()
        .map(|edge| edge.label.as_slice())
        .collect();
    for (i, a) in labels.iter().enumerate() {
        for b in &labels[i + 1..] {
            if a.starts_with(b) || b.starts_with(a) {
                issues.push(format!(
                    "{at:?}: sibling labels {:?} and {:?} share a prefix relation",
                    key::to_string(a),
                    key::to_string(b)
                ));
            }
        }
    }

    for (slot, edge) in node.edges.iter().enumerate() {
        let Some(edge) = edge else {
            continue;
        };
        let label = key::to_string(&edge.label);
        if edge.label.first().map(|&c| c as usize) != Some(slot) {
            issues.push(format!("{at:?}: edge {label:?} stored in slot {slot}"));
        }
        if !edge.label.iter().all(|&c| key::is_symbol(c)) {
            issues.push(format!("{at:?}: edge {label:?} has symbols outside the key alphabet"));
        }

        let Some(child) = edge.child.as_deref() else {
            words += 1;
            continue;
        };
        match (child.edge_count(), child.terminal) {
            (0, true) => issues.push(format!(
                "{at:?}: edge {label:?} leads to a terminal node with no edges"
            )),
            (0, false) => issues.push(format!("{at:?}: edge {label:?} leads to no key")),
            (1, false) => issues.push(format!(
                "{at:?}: edge {label:?} leads to an uncompressed single-edge node"
            )),
            _ => {}
        }
        path.extend_from_slice(&edge.label);
        words += verify_node(child, path, issues);
        path.truncate(path.len() - edge.label.len());
    }
    words
}
