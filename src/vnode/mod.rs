//! Virtual nodes - the per-render description of a tree.
//!
//! A [`VNode`] is either a text leaf or an element with a tag, props and an
//! ordered child list. Nodes are shared through `Rc`, so handing the same node
//! to both sides of a reconcile is cheap and recognised as "nothing changed".
//!
//! # Handles
//!
//! Each node carries a slot for the host handle it currently represents. The
//! slot starts empty; the reconciler fills it when the node is materialized, or
//! copies it from the previous render's matching node when the host node is
//! reused. The node never owns the host node, it only records which one it
//! stands for.
//!
//! ```text
//! render 1:  VNode(li, key=a) ──handle──▶ host #7
//! render 2:  VNode(li, key=a) ──handle──▶ host #7   (inherited, not recreated)
//! ```

mod builder;
mod node;

pub use builder::ElementBuilder;
pub use node::{same_identity, NodeKind, VNode};
