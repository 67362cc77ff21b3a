//! Debug utilities for hybrid trie troubleshooting.

use std::fmt::Write;

use super::{HybridNode, HybridTrie};
use crate::key;

impl HybridTrie {
    /// Render the node structure, one node per line.
    ///
    /// Each line shows the link it hangs from (`<` inf, `=` eq, `>` sup), the
    /// label and the marker of terminal nodes.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let Some(root) = self.root.as_deref() else {
            out.push_str("(empty)\n");
            return out;
        };
        let mut stack = vec![(root, 0, '*')];
        while let Some((node, depth, via)) = stack.pop() {
            let indent = "  ".repeat(depth);
            let _ = match node.marker {
                Some(marker) => {
                    writeln!(out, "{indent}{via} '{}' [{}]", node.label as char, marker)
                }
                None => writeln!(out, "{indent}{via} '{}'", node.label as char),
            };
            stack.extend(node.sup.as_deref().map(|n| (n, depth + 1, '>')));
            stack.extend(node.eq.as_deref().map(|n| (n, depth + 1, '=')));
            stack.extend(node.inf.as_deref().map(|n| (n, depth + 1, '<')));
        }
        out
    }

    /// Verify trie integrity - returns list of issues found.
    pub fn verify(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let words = verify_levels(self.root.as_deref(), &mut issues);
        if words != self.len {
            issues.push(format!(
                "word count mismatch: cached {} vs reachable {}",
                self.len, words
            ));
        }
        issues
    }
}

enum Check<'a> {
    /// A node with the exclusive label bounds of its sibling level
    Node(&'a HybridNode, Option<u8>, Option<u8>),
    /// Consume the node's label and check its `eq` continuation
    Descend(&'a HybridNode),
    Ascend,
}

/// Check every sibling level. Returns the number of terminal nodes.
fn verify_levels(root: Option<&HybridNode>, issues: &mut Vec<String>) -> usize {
    let mut words = 0;
    let mut path = Vec::new();
    let mut stack: Vec<Check<'_>> = root.map(|n| Check::Node(n, None, None)).into_iter().collect();
    while let Some(check) = stack.pop() {
        let (node, lo, hi) = match check {
            Check::Node(node, lo, hi) => (node, lo, hi),
            Check::Descend(node) => {
                path.push(node.label);
                stack.push(Check::Ascend);
                stack.extend(node.eq.as_deref().map(|n| Check::Node(n, None, None)));
                continue;
            }
            Check::Ascend => {
                path.pop();
                continue;
            }
        };
        let at = || format!("{:?}+'{}'", key::to_string(&path), node.label as char);

        if !key::is_symbol(node.label) {
            issues.push(format!("{}: label outside the key alphabet", at()));
        }
        if lo.is_some_and(|lo| node.label <= lo) || hi.is_some_and(|hi| node.label >= hi) {
            issues.push(format!("{}: label out of sibling order", at()));
        }
        if node.marker.is_none() && node.eq.is_none() {
            issues.push(format!("{}: node neither ends a key nor continues one", at()));
        }
        words += usize::from(node.marker.is_some());

        stack.push(Check::Descend(node));
        stack.extend(node.sup.as_deref().map(|n| Check::Node(n, Some(node.label), hi)));
        stack.extend(node.inf.as_deref().map(|n| Check::Node(n, lo, Some(node.label))));
    }
    words
}
