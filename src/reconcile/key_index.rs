//! Key index over the unreconciled part of an old child list.

use std::collections::HashMap;

use crate::types::Key;
use crate::vnode::VNode;

/// Mapping from key to position in the old child list.
#[derive(Debug, Default)]
pub struct KeyIndex {
    positions: HashMap<Key, usize>,
    shadowed: usize,
}

impl KeyIndex {
    pub fn get(&self, key: &Key) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of entries overwritten by a later sibling with the same key.
    pub fn shadowed(&self) -> usize {
        self.shadowed
    }
}

/// Index the keyed children in `children[begin..end]`.
///
/// Consumed slots (`None`) and keyless children are skipped. When a key
/// occurs twice, the later position wins and the earlier one is counted in
/// [`KeyIndex::shadowed`].
pub fn build_key_index<H>(children: &[Option<&VNode<H>>], begin: usize, end: usize) -> KeyIndex {
    let mut index = KeyIndex::default();

    for (position, child) in children.iter().enumerate().take(end).skip(begin) {
        let Some(key) = child.and_then(|c| c.key()) else {
            continue;
        };
        if index.positions.insert(key.clone(), position).is_some() {
            index.shadowed += 1;
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    type Node = VNode<u32>;

    fn li(key: &str) -> Node {
        Node::element("li").key(key).build()
    }

    #[test]
    fn test_indexes_range_only() {
        let nodes = [li("a"), li("b"), li("c"), li("d")];
        let slots: Vec<Option<&Node>> = nodes.iter().map(Some).collect();

        let index = build_key_index(&slots, 1, 3);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&Key::from("a")), None);
        assert_eq!(index.get(&Key::from("b")), Some(1));
        assert_eq!(index.get(&Key::from("c")), Some(2));
        assert_eq!(index.get(&Key::from("d")), None);
    }

    #[test]
    fn test_skips_keyless_and_consumed() {
        let nodes = [li("a"), Node::text("plain"), li("c")];
        let slots = vec![Some(&nodes[0]), Some(&nodes[1]), None];

        let index = build_key_index(&slots, 0, 3);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&Key::from("a")), Some(0));
        assert_eq!(index.get(&Key::from("c")), None);
    }

    #[test]
    fn test_duplicate_key_later_wins() {
        let nodes = [li("x"), li("y"), li("x")];
        let slots: Vec<Option<&Node>> = nodes.iter().map(Some).collect();

        let index = build_key_index(&slots, 0, 3);
        assert_eq!(index.get(&Key::from("x")), Some(2));
        assert_eq!(index.shadowed(), 1);
    }

    #[test]
    fn test_empty_range() {
        let nodes = [li("a")];
        let slots: Vec<Option<&Node>> = nodes.iter().map(Some).collect();
        assert!(build_key_index(&slots, 1, 1).is_empty());
    }
}
