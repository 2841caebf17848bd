//! Radix tree node implementation.
//!
//! The tree is a compressed trie over route skeletons. Node prefixes are raw
//! bytes, and a `*` byte inside a prefix stands for one whole path segment.
//! Literal children of a node have pairwise-distinct first bytes, so at most
//! one child can start with `*`.
//!
//! ```text
//!   insert "/users", "/users/me", "/users/*/posts"
//!
//!   (root)
//!     └── "/users"            [leaf]
//!           └── "/"
//!                 ├── "me"         [leaf]
//!                 └── "*/posts"    [leaf]
//! ```

use crate::pattern::WILDCARD;
use crate::router::EntryId;

/// A node in the radix tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    prefix: Vec<u8>,
    children: Vec<Node>,
    entries: Vec<EntryId>,
    is_leaf: bool,
}

impl Node {
    /// Creates an empty root node.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    fn leaf(key: &[u8], id: EntryId) -> Self {
        Self {
            prefix: key.to_vec(),
            children: Vec::new(),
            entries: vec![id],
            is_leaf: true,
        }
    }

    /// The bytes this node consumes.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Child nodes in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Entries registered at this node, in registration order.
    #[must_use]
    pub fn entries(&self) -> &[EntryId] {
        &self.entries
    }

    /// Returns true if a skeleton ends at this node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Inserts `id` under `key`.
    ///
    /// An exact match appends to the existing leaf, so several entries can
    /// share one skeleton. A partial match splits the child at the longest
    /// common prefix.
    pub fn insert(&mut self, key: &[u8], id: EntryId) {
        let Some(&first) = key.first() else {
            self.is_leaf = true;
            self.entries.push(id);
            return;
        };

        let Some(idx) = self
            .children
            .iter()
            .position(|child| child.prefix.first() == Some(&first))
        else {
            self.children.push(Self::leaf(key, id));
            return;
        };

        let child = &mut self.children[idx];
        let lcp = common_prefix_len(&child.prefix, key);
        if lcp < child.prefix.len() {
            child.split_at(lcp);
        }
        child.insert(&key[lcp..], id);
    }

    fn split_at(&mut self, at: usize) {
        let tail = Self {
            prefix: self.prefix.split_off(at),
            children: std::mem::take(&mut self.children),
            entries: std::mem::take(&mut self.entries),
            is_leaf: self.is_leaf,
        };
        self.children.push(tail);
        self.is_leaf = false;
    }

    /// Collects every entry whose skeleton structurally matches `path`.
    ///
    /// Literal children are searched before the wildcard child, and all
    /// leaves reached by consuming the whole path contribute their entries.
    /// Returns true if at least one leaf was reached.
    pub fn search(&self, path: &[u8], out: &mut Vec<EntryId>) -> bool {
        if path.is_empty() {
            if self.is_leaf {
                out.extend_from_slice(&self.entries);
            }
            return self.is_leaf;
        }

        let mut found = false;

        for child in self.children.iter().filter(|c| {
            c.prefix.first().is_some_and(|&b| b != WILDCARD && b == path[0])
        }) {
            if let Some(consumed) = match_prefix(&child.prefix, path) {
                found |= child.search(&path[consumed..], out);
            }
        }

        for child in self
            .children
            .iter()
            .filter(|c| c.prefix.first() == Some(&WILDCARD))
        {
            if let Some(consumed) = match_prefix(&child.prefix, path) {
                found |= child.search(&path[consumed..], out);
            }
        }

        found
    }

    /// Counts the nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Matches a stored prefix against the front of `path`, returning the
/// number of path bytes consumed.
///
/// A `*` consumes at least one byte, up to the next `/`.
fn match_prefix(prefix: &[u8], path: &[u8]) -> Option<usize> {
    let mut j = 0;
    for &b in prefix {
        if b == WILDCARD {
            let start = j;
            while j < path.len() && path[j] != b'/' {
                j += 1;
            }
            if j == start {
                return None;
            }
        } else {
            if path.get(j) != Some(&b) {
                return None;
            }
            j += 1;
        }
    }
    Some(j)
}
