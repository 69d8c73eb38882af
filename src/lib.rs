//! # spark-vdom
//!
//! Keyed virtual-node reconciler for retained host trees.
//!
//! Describe the UI as an immutable [`VNode`] tree, then hand the previous and
//! the next tree to a [`Reconciler`]. It works out the smallest practical set
//! of host operations (create, insert, move, remove, text and property
//! updates) and drives them through an injected [`HostRenderer`].
//!
//! ## Architecture
//!
//! ```text
//! VNode tree (old) ─┐
//!                   ├─ Reconciler ─ patch_node ─ diff_children ─→ HostRenderer
//! VNode tree (new) ─┘        identity = key + tag     keyed four-pointer scan
//! ```
//!
//! Host handles live inside the virtual nodes: after a call every node of the
//! new tree carries the handle of the host node that represents it, so the new
//! tree becomes the "old" tree of the next call.
//!
//! ## Modules
//!
//! - [`types`] - Keys, property values, property maps, dimensions
//! - [`vnode`] - Virtual nodes, element builder, identity comparator
//! - [`reconcile`] - Patch dispatcher, child diff, key index, statistics
//! - [`host`] - Host renderer trait plus an in-memory and a Taffy-backed host

pub mod host;
pub mod reconcile;
pub mod types;
pub mod vnode;

// Re-export commonly used items
pub use host::{HostError, HostRenderer};
pub use reconcile::{Config, Mutations, PatchStats, ReconcileError, Reconciler};
pub use types::{Dimension, Key, PropValue, Props};
pub use vnode::{same_identity, ElementBuilder, NodeKind, VNode};
