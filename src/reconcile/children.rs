//! Keyed child-list diff.
//!
//! Aligns an old and a new child list with four cursors and patches the host
//! children of `parent` so their order matches the new list exactly.
//!
//! ```text
//! old:  [old_start ............ old_end)
//! new:  [new_start ............ new_end)
//!
//! 1. head/head   same → patch, no move
//! 2. tail/tail   same → patch, no move
//! 3. tail/head   same → patch, move before old head
//! 4. head/tail   same → patch, move after old tail
//! 5. otherwise        → look up new head's key among old children
//!                       hit:  patch, move before old head, consume slot
//!                       miss: create before old head
//! ```
//!
//! Everything outside the two cursor ranges is already in its final host
//! position. Leftover new children are inserted at the tail; leftover old
//! children are removed.
//!
//! Cases 1-4 handle appends, removals, swaps and rotations without an index.
//! The key index is built at most once per call, the first time case 5 is
//! reached.

use tracing::{trace, warn};

use crate::host::HostRenderer;
use crate::vnode::same_identity;

use super::key_index::{build_key_index, KeyIndex};
use super::{Error, Node, Reconciler};

impl<R: HostRenderer> Reconciler<R> {
    pub(super) fn diff_children(
        &mut self,
        parent: R::Handle,
        old_children: &[Node<R>],
        new_children: &[Node<R>],
    ) -> Result<(), Error<R>> {
        // `None` marks an old child already reused out of order
        let mut old: Vec<Option<&Node<R>>> = old_children.iter().map(Some).collect();
        let mut key_index: Option<KeyIndex> = None;

        let (mut old_start, mut old_end) = (0, old.len());
        let (mut new_start, mut new_end) = (0, new_children.len());

        while old_start < old_end && new_start < new_end {
            let Some(old_first) = old[old_start] else {
                old_start += 1;
                continue;
            };
            let Some(old_last) = old[old_end - 1] else {
                old_end -= 1;
                continue;
            };
            let new_first = &new_children[new_start];
            let new_last = &new_children[new_end - 1];

            if same_identity(old_first, new_first) {
                trace!(old = old_start, new = new_start, "head match");
                self.patch_node(old_first, new_first)?;
                old_start += 1;
                new_start += 1;
            } else if same_identity(old_last, new_last) {
                trace!(old = old_end - 1, new = new_end - 1, "tail match");
                self.patch_node(old_last, new_last)?;
                old_end -= 1;
                new_end -= 1;
            } else if same_identity(old_last, new_first) {
                trace!(old = old_end - 1, new = new_start, "tail moved to head");
                self.patch_node(old_last, new_first)?;
                let moved = self.bound(new_first)?;
                let anchor = self.bound(old_first)?;
                self.move_before(parent, moved, Some(anchor))?;
                old_end -= 1;
                new_start += 1;
            } else if same_identity(old_first, new_last) {
                trace!(old = old_start, new = new_end - 1, "head moved to tail");
                self.patch_node(old_first, new_last)?;
                let moved = self.bound(new_last)?;
                let after = self.bound(old_last)?;
                let anchor = self.host.next_sibling_of(after);
                self.move_before(parent, moved, anchor)?;
                old_start += 1;
                new_end -= 1;
            } else {
                let index = key_index
                    .get_or_insert_with(|| self.index_old_children(&old, old_start, old_end));
                let reusable = new_first
                    .key()
                    .and_then(|key| index.get(key))
                    .filter(|&i| (old_start..old_end).contains(&i))
                    .and_then(|i| old[i].map(|candidate| (i, candidate)))
                    .filter(|&(_, candidate)| same_identity(candidate, new_first));

                let anchor = self.bound(old_first)?;
                match reusable {
                    Some((i, candidate)) => {
                        trace!(old = i, new = new_start, "keyed move");
                        self.patch_node(candidate, new_first)?;
                        let moved = self.bound(new_first)?;
                        self.move_before(parent, moved, Some(anchor))?;
                        old[i] = None;
                    }
                    None => {
                        trace!(new = new_start, "fresh insert");
                        let created = self.create(new_first)?;
                        self.insert(parent, created, Some(anchor))?;
                    }
                }
                new_start += 1;
            }
        }

        if old_start >= old_end {
            if new_start < new_end {
                let reference = match new_children.get(new_end) {
                    Some(next) => Some(self.bound(next)?),
                    None => None,
                };
                self.add_nodes(parent, &new_children[new_start..new_end], reference)?;
            }
        } else if new_start >= new_end {
            for node in old[old_start..old_end].iter().flatten() {
                self.remove_node(parent, node)?;
            }
        }

        Ok(())
    }

    fn index_old_children(&mut self, old: &[Option<&Node<R>>], begin: usize, end: usize) -> KeyIndex {
        let index = build_key_index(old, begin, end);
        self.stats.key_index_builds += 1;
        trace!(begin, end, entries = index.len(), "built key index");

        if index.shadowed() > 0 && self.config.warn_duplicate_keys {
            warn!(
                shadowed = index.shadowed(),
                "duplicate sibling keys; later siblings shadow earlier ones"
            );
        }
        index
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::host::{ArenaHost, HostRenderer, NodeId};
    use crate::reconcile::Reconciler;
    use crate::vnode::VNode;

    type Node = VNode<NodeId>;

    fn item(key: &str) -> Node {
        Node::element("li").key(key).child(Node::text(key)).build()
    }

    fn list(keys: &[&str]) -> Node {
        Node::element("ul").children(keys.iter().map(|k| item(k))).build()
    }

    fn mounted(old: &Node) -> Reconciler<ArenaHost> {
        let mut host = ArenaHost::new();
        let container = host.create_element("root").unwrap();
        let mut reconciler = Reconciler::new(host);
        reconciler.mount(container, old).unwrap();
        reconciler.host_mut().take_mutations();
        reconciler
    }

    /// Text of each host child of the list, in host order.
    fn host_order(reconciler: &Reconciler<ArenaHost>, list: &Node) -> Vec<String> {
        let host = reconciler.host();
        host.children(list.handle().unwrap())
            .iter()
            .map(|&li| {
                let text = host.children(li)[0];
                host.text(text).unwrap().to_string()
            })
            .collect()
    }

    fn handles(list: &Node) -> Vec<NodeId> {
        list.children().iter().map(|c| c.handle().unwrap()).collect()
    }

    fn patch(old_keys: &[&str], new_keys: &[&str]) -> (Reconciler<ArenaHost>, Node, Node) {
        let old = list(old_keys);
        let mut reconciler = mounted(&old);
        let new = list(new_keys);
        reconciler.reconcile(Some(&old), Some(&new)).unwrap();
        (reconciler, old, new)
    }

    #[test]
    fn test_unchanged_list_is_noop() {
        let (reconciler, old, new) = patch(&["a", "b", "c"], &["a", "b", "c"]);
        assert!(reconciler.stats().is_noop());
        assert_eq!(reconciler.stats().patched, 7);
        assert_eq!(handles(&old), handles(&new));
    }

    #[test]
    fn test_tail_moved_to_head() {
        let (reconciler, old, new) = patch(&["a", "b", "c"], &["c", "a", "b"]);
        assert_eq!(host_order(&reconciler, &new), ["c", "a", "b"]);

        let stats = reconciler.stats();
        assert_eq!((stats.created, stats.removed, stats.moved), (0, 0, 1));
        assert_eq!(stats.key_index_builds, 0);

        let old_handles = handles(&old);
        assert_eq!(handles(&new), [old_handles[2], old_handles[0], old_handles[1]]);
    }

    #[test]
    fn test_head_moved_to_tail() {
        let (reconciler, _, new) = patch(&["a", "b", "c"], &["b", "c", "a"]);
        assert_eq!(host_order(&reconciler, &new), ["b", "c", "a"]);

        let stats = reconciler.stats();
        assert_eq!((stats.created, stats.removed, stats.moved), (0, 0, 1));
    }

    #[test]
    fn test_reversal() {
        let (reconciler, _, new) = patch(&["a", "b", "c", "d"], &["d", "c", "b", "a"]);
        assert_eq!(host_order(&reconciler, &new), ["d", "c", "b", "a"]);

        let stats = reconciler.stats();
        assert_eq!((stats.created, stats.removed, stats.moved), (0, 0, 3));
        assert_eq!(stats.key_index_builds, 0);
    }

    #[test]
    fn test_keyed_move_consumes_slot_at_head() {
        let (reconciler, old, new) = patch(&["a", "b", "c", "d"], &["b", "d", "a", "c"]);
        assert_eq!(host_order(&reconciler, &new), ["b", "d", "a", "c"]);

        let stats = reconciler.stats();
        assert_eq!((stats.created, stats.removed, stats.moved), (0, 0, 2));
        assert_eq!(stats.key_index_builds, 1);

        let mut old_handles = handles(&old);
        let mut new_handles = handles(&new);
        old_handles.sort_by_key(|h| h.index());
        new_handles.sort_by_key(|h| h.index());
        assert_eq!(old_handles, new_handles);
    }

    #[test]
    fn test_keyed_move_consumes_slot_at_tail() {
        let (reconciler, _, new) = patch(&["a", "b", "c", "d"], &["c", "a", "d", "b"]);
        assert_eq!(host_order(&reconciler, &new), ["c", "a", "d", "b"]);

        let stats = reconciler.stats();
        assert_eq!((stats.created, stats.removed, stats.moved), (0, 0, 2));
        assert_eq!(stats.key_index_builds, 1);
    }

    #[test]
    fn test_fresh_and_keyed_mix() {
        let (reconciler, old, new) = patch(&["a", "b", "c"], &["x", "b", "y"]);
        assert_eq!(host_order(&reconciler, &new), ["x", "b", "y"]);

        let stats = reconciler.stats();
        // two new <li> with a text child each
        assert_eq!(stats.created, 4);
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.key_index_builds, 1);
        assert_eq!(new.children()[1].handle(), old.children()[1].handle());
        assert!(!reconciler.host().is_alive(old.children()[0].handle().unwrap()));
    }

    #[test]
    fn test_insert_in_middle_uses_next_sibling() {
        let (reconciler, old, new) = patch(&["a", "c"], &["a", "b", "c"]);
        assert_eq!(host_order(&reconciler, &new), ["a", "b", "c"]);
        assert_eq!(reconciler.stats().inserted, 1);
        assert_eq!(reconciler.stats().moved, 0);
        assert_eq!(new.children()[2].handle(), old.children()[1].handle());
    }

    #[test]
    fn test_append_at_end() {
        let (reconciler, _, new) = patch(&["a"], &["a", "b", "c"]);
        assert_eq!(host_order(&reconciler, &new), ["a", "b", "c"]);
        assert_eq!(reconciler.stats().inserted, 2);
    }

    #[test]
    fn test_delete_from_middle() {
        let (reconciler, old, new) = patch(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(host_order(&reconciler, &new), ["a", "c"]);

        let stats = reconciler.stats();
        assert_eq!((stats.created, stats.removed, stats.moved), (0, 1, 0));
        assert!(!reconciler.host().is_alive(old.children()[1].handle().unwrap()));
    }

    #[test]
    fn test_disjoint_keys_replace_everything_without_moves() {
        let (reconciler, _, new) = patch(&["a", "b"], &["c", "d"]);
        assert_eq!(host_order(&reconciler, &new), ["c", "d"]);

        let stats = reconciler.stats();
        assert_eq!(stats.moved, 0);
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.inserted, 2);
    }

    #[test]
    fn test_duplicate_keys_keep_new_order() {
        let (reconciler, _, new) = patch(&["a", "b", "a"], &["b", "a", "a", "x"]);
        assert_eq!(host_order(&reconciler, &new), ["b", "a", "a", "x"]);
        assert_eq!(reconciler.stats().created, 2);
    }

    #[test]
    fn test_key_matched_by_scan_is_not_reused_again() {
        let (reconciler, _, new) = patch(&["p", "q", "a"], &["z", "a", "a", "w"]);
        assert_eq!(host_order(&reconciler, &new), ["z", "a", "a", "w"]);

        let mut new_handles = handles(&new);
        new_handles.sort_by_key(|h| h.index());
        new_handles.dedup();
        assert_eq!(new_handles.len(), 4);
        assert_eq!(reconciler.host().children(new.handle().unwrap()), handles(&new).as_slice());
    }

    #[test]
    fn test_keyless_children_patch_in_place() {
        let old = Node::element("p")
            .child(Node::text("x"))
            .child(Node::text("y"))
            .build();
        let mut reconciler = mounted(&old);
        let new = Node::element("p")
            .child(Node::text("y"))
            .child(Node::text("z"))
            .child(Node::text("w"))
            .build();
        reconciler.reconcile(Some(&old), Some(&new)).unwrap();

        let stats = reconciler.stats();
        assert_eq!(stats.text_updates, 2);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.moved, 0);
        assert_eq!(new.children()[0].handle(), old.children()[0].handle());

        let host = reconciler.host();
        let texts: Vec<_> = host
            .children(new.handle().unwrap())
            .iter()
            .map(|&c| host.text(c).unwrap())
            .collect();
        assert_eq!(texts, ["y", "z", "w"]);
    }

    #[test]
    fn test_tag_change_under_same_key_is_recreated() {
        let old = Node::element("ul")
            .child(item("a"))
            .child(Node::element("li").key("b").build())
            .child(item("c"))
            .build();
        let mut reconciler = mounted(&old);
        let new = Node::element("ul")
            .child(Node::element("p").key("b").build())
            .child(item("c"))
            .child(item("a"))
            .build();
        reconciler.reconcile(Some(&old), Some(&new)).unwrap();

        let host = reconciler.host();
        let ul = new.handle().unwrap();
        assert_eq!(host.children(ul), handles(&new).as_slice());
        assert_eq!(host.tag(new.children()[0].handle().unwrap()), Some("p"));
        assert!(!host.is_alive(old.children()[1].handle().unwrap()));
    }
}
