// Succinct level-order trie over byte strings
//
// The tree shape is a LOUDS bit sequence: "10" for a virtual super root,
// then for every node in breadth-first order one 1 per child followed by
// a 0. Node ids are breadth-first positions (root = 0), so the children of
// a node form a contiguous id range and labels can be stored in one array
// indexed by node id.
//
// Key ids are the ranks of terminal nodes in breadth-first order.

use std::collections::VecDeque;
use std::ops::Range;

use crate::bits::{BitVector, BitVectorBuilder};
use crate::bytes::{ByteWriter, Cursor};
use crate::{DictError, SECTION_ALIGNMENT};

/// Immutable trie mapping byte keys to dense ids `0..len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoudsTrie {
    louds: BitVector,
    terminal: BitVector,
    labels: Vec<u8>,
}

/// Pointer-based trie used only during construction.
#[derive(Default)]
struct BuildNode {
    children: Vec<(u8, usize)>,
    terminal: bool,
}

impl LoudsTrie {
    /// Build a trie from keys in any order; duplicates collapse.
    pub fn build<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut nodes = vec![BuildNode::default()];
        for key in keys {
            let mut current = 0;
            for &byte in key.as_ref() {
                current = match nodes[current].children.binary_search_by_key(&byte, |c| c.0) {
                    Ok(i) => nodes[current].children[i].1,
                    Err(i) => {
                        let id = nodes.len();
                        nodes.push(BuildNode::default());
                        nodes[current].children.insert(i, (byte, id));
                        id
                    }
                };
            }
            nodes[current].terminal = true;
        }

        let mut louds = BitVectorBuilder::new();
        let mut terminal = BitVectorBuilder::new();
        let mut labels = vec![0u8];
        louds.push(true);
        louds.push(false);

        let mut queue = VecDeque::from([0usize]);
        while let Some(index) = queue.pop_front() {
            let node = &nodes[index];
            terminal.push(node.terminal);
            for &(label, child) in &node.children {
                louds.push(true);
                labels.push(label);
                queue.push_back(child);
            }
            louds.push(false);
        }

        LoudsTrie {
            louds: louds.finish(),
            terminal: terminal.finish(),
            labels,
        }
    }

    /// Read a trie written by [`LoudsTrie::serialize`].
    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let node_count = cursor.read_count()?;
        let _reserved: i32 = cursor.read()?;
        let louds = BitVector::read_from(cursor)?;
        let terminal = BitVector::read_from(cursor)?;
        let labels = cursor.read_array::<u8>(node_count)?;
        cursor.skip_padding(SECTION_ALIGNMENT)?;

        if node_count == 0
            || louds.len() != 2 * node_count + 1
            || louds.count_ones() != node_count
            || terminal.len() != node_count
        {
            return Err(DictError::Corrupt(format!(
                "trie shape mismatch: {node_count} nodes, {} tree bits, {} terminal bits",
                louds.len(),
                terminal.len()
            )));
        }
        Ok(LoudsTrie {
            louds,
            terminal,
            labels,
        })
    }

    /// Serialized form: `i32 nodeCount`, `i32 reserved`, tree bits,
    /// terminal bits, `nodeCount` label bytes, padding to 8 bytes.
    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        out.put_count(self.labels.len())?;
        out.put(0i32);
        self.louds.serialize(out)?;
        self.terminal.serialize(out)?;
        out.put_slice(&self.labels);
        out.pad_to(SECTION_ALIGNMENT);
        Ok(())
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.terminal.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Ids of the children of `node`, in label order.
    fn children(&self, node: usize) -> Option<Range<usize>> {
        let begin = self.louds.select0(node)? + 1;
        let end = self.louds.select0(node + 1)?;
        let first = self.louds.rank1(begin);
        Some(first..first + (end - begin))
    }

    fn child(&self, node: usize, label: u8) -> Option<usize> {
        let range = self.children(node)?;
        let labels = self.labels.get(range.clone())?;
        labels
            .binary_search(&label)
            .ok()
            .map(|offset| range.start + offset)
    }

    fn parent(&self, node: usize) -> Option<usize> {
        let pos = self.louds.select1(node)?;
        self.louds.rank0(pos).checked_sub(1)
    }

    fn find_node(&self, key: &[u8]) -> Option<usize> {
        key.iter()
            .try_fold(0usize, |node, &label| self.child(node, label))
    }

    fn key_id_of_node(&self, node: usize) -> Option<usize> {
        match self.terminal.get(node) {
            Some(true) => Some(self.terminal.rank1(node)),
            _ => None,
        }
    }

    /// Id of `key`, or `None` when it is not stored.
    pub fn lookup(&self, key: &[u8]) -> Option<usize> {
        self.key_id_of_node(self.find_node(key)?)
    }

    /// The key stored under `id`.
    pub fn reverse(&self, id: usize) -> Result<Vec<u8>, DictError> {
        let mut node = self.terminal.select1(id).ok_or(DictError::IndexOutOfBounds {
            index: id,
            len: self.len(),
        })?;
        let mut key = Vec::new();
        while node != 0 {
            key.push(self.labels[node]);
            node = self
                .parent(node)
                .ok_or_else(|| DictError::Corrupt(format!("trie node {node} has no parent")))?;
        }
        key.reverse();
        Ok(key)
    }

    /// Every key starting with `prefix`, with its id, in byte order.
    pub fn prefix_iter(&self, prefix: &[u8]) -> PrefixIter<'_> {
        let stack = match self.find_node(prefix) {
            Some(node) => vec![Frame {
                node,
                parent_len: prefix.len(),
                labeled: false,
            }],
            None => Vec::new(),
        };
        PrefixIter {
            trie: self,
            stack,
            key: prefix.to_vec(),
        }
    }

    /// Every key with its id, in byte order.
    pub fn iter(&self) -> PrefixIter<'_> {
        self.prefix_iter(&[])
    }
}

struct Frame {
    node: usize,
    /// Key length before this node's label is appended.
    parent_len: usize,
    labeled: bool,
}

/// Depth-first walk below a prefix node.
pub struct PrefixIter<'a> {
    trie: &'a LoudsTrie,
    stack: Vec<Frame>,
    key: Vec<u8>,
}

impl Iterator for PrefixIter<'_> {
    type Item = (Vec<u8>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            self.key.truncate(frame.parent_len);
            if frame.labeled {
                self.key.push(self.trie.labels[frame.node]);
            }
            let len = self.key.len();
            if let Some(children) = self.trie.children(frame.node) {
                self.stack.extend(children.rev().map(|node| Frame {
                    node,
                    parent_len: len,
                    labeled: true,
                }));
            }
            if let Some(id) = self.trie.key_id_of_node(frame.node) {
                return Some((self.key.clone(), id));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> LoudsTrie {
        LoudsTrie::build(["cat", "cats", "car", "dog", "", "do"])
    }

    #[test]
    fn lookup_and_reverse() {
        let trie = sample();
        assert_eq!(trie.len(), 6);
        for key in ["cat", "cats", "car", "dog", "", "do"] {
            let id = trie.lookup(key.as_bytes()).unwrap();
            assert_eq!(trie.reverse(id).unwrap(), key.as_bytes());
        }
        assert_eq!(trie.lookup(b"ca"), None);
        assert_eq!(trie.lookup(b"cow"), None);
        assert_eq!(trie.lookup(b"catsup"), None);
    }

    #[test]
    fn ids_are_breadth_first() {
        let trie = sample();
        // Shorter keys sit higher in the tree and get smaller ids
        assert_eq!(trie.lookup(b""), Some(0));
        assert_eq!(trie.lookup(b"do"), Some(1));
        assert!(trie.lookup(b"cat").unwrap() < trie.lookup(b"cats").unwrap());
    }

    #[test]
    fn reverse_out_of_range() {
        let trie = sample();
        assert!(matches!(
            trie.reverse(6),
            Err(DictError::IndexOutOfBounds { index: 6, len: 6 })
        ));
    }

    #[test]
    fn prefix_iteration_is_lexicographic() {
        let trie = sample();
        let keys: Vec<Vec<u8>> = trie.prefix_iter(b"ca").map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"car".to_vec(), b"cat".to_vec(), b"cats".to_vec()]);

        let all: Vec<Vec<u8>> = trie.iter().map(|(k, _)| k).collect();
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
        assert_eq!(all.len(), 6);

        assert_eq!(trie.prefix_iter(b"x").count(), 0);
        // Restartable
        assert_eq!(trie.prefix_iter(b"ca").count(), 3);
    }

    #[test]
    fn empty_trie() {
        let trie = LoudsTrie::build(Vec::<&[u8]>::new());
        assert!(trie.is_empty());
        assert_eq!(trie.node_count(), 1);
        assert_eq!(trie.lookup(b""), None);
        assert_eq!(trie.iter().count(), 0);
    }

    #[test]
    fn serialize_round_trip() {
        let trie = sample();
        let mut w = ByteWriter::new();
        trie.serialize(&mut w).unwrap();
        assert_eq!(w.position() % SECTION_ALIGNMENT, 0);
        let reread = LoudsTrie::read_from(&mut Cursor::new(w.into_view())).unwrap();
        assert_eq!(reread, trie);
    }

    #[test]
    fn corrupt_shape_rejected() {
        let mut w = ByteWriter::new();
        w.put(5i32);
        w.put(0i32);
        BitVector::default().serialize(&mut w).unwrap();
        BitVector::default().serialize(&mut w).unwrap();
        w.put_slice(&[0u8; 5]);
        w.pad_to(SECTION_ALIGNMENT);
        assert!(matches!(
            LoudsTrie::read_from(&mut Cursor::new(w.into_view())),
            Err(DictError::Corrupt(_))
        ));
    }

    proptest! {
        #[test]
        fn matches_sorted_set(keys in prop::collection::btree_set(prop::collection::vec(any::<u8>(), 0..8), 0..60)) {
            let trie = LoudsTrie::build(&keys);
            prop_assert_eq!(trie.len(), keys.len());
            let mut ids = std::collections::BTreeSet::new();
            for key in &keys {
                let id = trie.lookup(key).unwrap();
                prop_assert!(id < keys.len());
                prop_assert_eq!(&trie.reverse(id).unwrap(), key);
                ids.insert(id);
            }
            prop_assert_eq!(ids.len(), keys.len());
            let walked: Vec<Vec<u8>> = trie.iter().map(|(k, _)| k).collect();
            let expected: Vec<Vec<u8>> = keys.iter().cloned().collect();
            prop_assert_eq!(walked, expected);
        }
    }
}
