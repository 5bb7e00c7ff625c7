use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrieError {
    #[error("Operation not supported by PrefixTrie.")]
    Unsupported,
}

type NodeIndex = usize;

/// Index of the root, which stands for the empty prefix.
const ROOT: NodeIndex = 0;

#[derive(Clone, Debug, Default)]
struct TrieNode {
    children: FxHashMap<char, NodeIndex>,
    /// A key ends here.
    is_key: bool,
}

/// Character trie over string keys.
///
/// Keys are taken verbatim, normalising case or punctuation is up to the
/// caller. Nodes live in an arena and refer to their children by index, so
/// no operation recurses on key length, dropping and cloning included.
#[derive(Clone, Debug)]
pub struct PrefixTrie {
    /// Arena of nodes, the root always at `ROOT`.
    nodes: Vec<TrieNode>,
    len: usize,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            len: 0,
        }
    }
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds `key`. Empty keys are ignored.
    pub fn add(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        let mut current = ROOT;
        for c in key.chars() {
            current = match self.nodes[current].children.get(&c) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[current].children.insert(c, child);
                    child
                }
            };
        }
        let node = &mut self.nodes[current];
        if !node.is_key {
            node.is_key = true;
            self.len += 1;
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        self.find(key).is_some_and(|i| self.nodes[i].is_key)
    }

    /// Every key starting with `prefix`, in no particular order.
    ///
    /// A `prefix` that leaves the trie yields no keys.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys = vec![];
        let Some(start) = self.find(prefix) else {
            return keys;
        };

        // Depth-first over a single key buffer. Each entry holds the buffer
        // length at its parent and the character leading into it.
        let mut key = prefix.to_string();
        let mut stack: Vec<(NodeIndex, usize, Option<char>)> = vec![(start, key.len(), None)];
        while let Some((index, parent_len, c)) = stack.pop() {
            key.truncate(parent_len);
            if let Some(c) = c {
                key.push(c);
            }
            let node = &self.nodes[index];
            if node.is_key {
                keys.push(key.clone());
            }
            for (&c, &child) in &node.children {
                stack.push((child, key.len(), Some(c)));
            }
        }
        keys
    }

    pub fn longest_prefix_of(&self, _key: &str) -> Result<String, TrieError> {
        Err(TrieError::Unsupported)
    }

    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[ROOT] = TrieNode::default();
        self.len = 0;
    }

    fn find(&self, prefix: &str) -> Option<NodeIndex> {
        let mut current = ROOT;
        for c in prefix.chars() {
            current = *self.nodes[current].children.get(&c)?;
        }
        Some(current)
    }
}

impl<S: AsRef<str>> Extend<S> for PrefixTrie {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for key in iter {
            self.add(key.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for PrefixTrie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Self::new();
        trie.extend(iter);
        trie
    }
}
