//! Reconciler - turns the host tree for an old virtual tree into the host
//! tree for a new one.
//!
//! # Algorithm
//!
//! ```text
//! reconcile(old, new)
//!   ├─ no old (or never mounted) → create new subtree
//!   ├─ same identity             → patch_node(old, new)
//!   │     ├─ text changed        → set_text_content
//!   │     ├─ props changed       → set/remove attribute, style
//!   │     └─ children            → diff_children (keyed four-pointer scan)
//!   └─ otherwise                 → create new, put it where old was, drop old
//! ```
//!
//! Host nodes are reused wherever identity (key + tag) allows. Every host
//! mutation goes through the injected [`HostRenderer`] and is counted in
//! [`PatchStats`].
//!
//! # Example
//!
//! ```
//! use spark_vdom::host::ArenaHost;
//! use spark_vdom::{Reconciler, VNode};
//!
//! let mut reconciler = Reconciler::new(ArenaHost::new());
//!
//! let first = VNode::element("ul")
//!     .child(VNode::element("li").key("a").child(VNode::text("A")).build())
//!     .build();
//! let first = reconciler.reconcile(None, Some(&first)).unwrap().unwrap();
//!
//! let second = VNode::element("ul")
//!     .child(VNode::element("li").key("a").child(VNode::text("A!")).build())
//!     .build();
//! let second = reconciler.reconcile(Some(&first), Some(&second)).unwrap().unwrap();
//!
//! assert_eq!(first.handle(), second.handle());
//! assert_eq!(reconciler.stats().text_updates, 1);
//! ```

mod children;
mod key_index;
mod stats;

pub use key_index::{build_key_index, KeyIndex};
pub use stats::{Mutations, PatchStats};

use tracing::{debug, debug_span};

use crate::host::HostRenderer;
use crate::types::{diff_map, PropChange, Props};
use crate::vnode::{same_identity, NodeKind, VNode};

type Node<R> = VNode<<R as HostRenderer>::Handle>;
type Error<R> = ReconcileError<<R as HostRenderer>::Error>;

// =============================================================================
// Config / Errors
// =============================================================================

/// Reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Diff attributes and style of reused elements.
    pub patch_props: bool,
    /// Log a warning when a key index finds duplicate sibling keys.
    pub warn_duplicate_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patch_props: true,
            warn_duplicate_keys: cfg!(debug_assertions),
        }
    }
}

/// Failure of a reconcile call.
///
/// There is no rollback: a failed call leaves the host tree partially
/// patched.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError<E: std::error::Error + 'static> {
    /// A host operation failed.
    #[error(transparent)]
    Host(E),

    /// A node that must already be mounted has no host handle.
    #[error("{node} is not mounted")]
    Unbound { node: String },
}

fn describe<H>(node: &VNode<H>) -> String {
    let name = node.tag().unwrap_or("#text");
    match node.key() {
        Some(key) => format!("<{name} key={key}>"),
        None => format!("<{name}>"),
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Diff engine bound to one host.
pub struct Reconciler<R: HostRenderer> {
    host: R,
    config: Config,
    stats: PatchStats,
}

impl<R: HostRenderer> Reconciler<R> {
    pub fn new(host: R) -> Self {
        Self::with_config(host, Config::default())
    }

    pub fn with_config(host: R, config: Config) -> Self {
        Self {
            host,
            config,
            stats: PatchStats::default(),
        }
    }

    pub fn host(&self) -> &R {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut R {
        &mut self.host
    }

    pub fn into_host(self) -> R {
        self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Statistics of the last `reconcile`, `mount` or `unmount` call.
    pub fn stats(&self) -> PatchStats {
        self.stats
    }

    // -------------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------------

    /// Make the host tree of `old` represent `new`.
    ///
    /// - `old` absent or never mounted: `new` is created from scratch; the
    ///   caller attaches its root (see [`mount`](Self::mount)).
    /// - `new` absent: nothing happens. Removal is always driven by a parent's
    ///   child diff.
    /// - same identity: `old`'s host node is patched in place.
    /// - otherwise: a fresh subtree takes `old`'s place among its host
    ///   siblings and `old`'s host node is removed.
    ///
    /// Returns `new` with every handle bound.
    pub fn reconcile(
        &mut self,
        old: Option<&Node<R>>,
        new: Option<&Node<R>>,
    ) -> Result<Option<Node<R>>, Error<R>> {
        self.stats = PatchStats::default();
        let _span = debug_span!("reconcile").entered();

        let Some(new) = new else {
            return Ok(None);
        };

        match old {
            Some(old) if old.handle().is_some() => {
                if same_identity(old, new) {
                    self.patch_node(old, new)?;
                } else {
                    self.replace(old, new)?;
                }
            }
            _ => {
                self.create(new)?;
            }
        }

        debug!(stats = ?self.stats, "reconcile finished");
        Ok(Some(new.clone()))
    }

    /// Create `vnode` and append it under the host node `container`.
    pub fn mount(&mut self, container: R::Handle, vnode: &Node<R>) -> Result<R::Handle, Error<R>> {
        self.stats = PatchStats::default();
        let _span = debug_span!("mount").entered();

        let handle = self.create(vnode)?;
        self.insert(container, handle, None)?;

        debug!(stats = ?self.stats, "mount finished");
        Ok(handle)
    }

    /// Remove a mounted root from its host parent.
    pub fn unmount(&mut self, vnode: &Node<R>) -> Result<(), Error<R>> {
        self.stats = PatchStats::default();

        let handle = self.bound(vnode)?;
        if let Some(parent) = self.host.parent_of(handle) {
            self.remove_node(parent, vnode)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Patch dispatch
    // -------------------------------------------------------------------------

    /// Patch `old`'s host node to represent `new`. Both must share identity
    /// and `old` must be mounted; `new` inherits its handle.
    fn patch_node(&mut self, old: &Node<R>, new: &Node<R>) -> Result<(), Error<R>> {
        if VNode::ptr_eq(old, new) {
            return Ok(());
        }

        let handle = self.bound(old)?;
        new.bind(handle);
        self.stats.patched += 1;

        match new.kind() {
            NodeKind::Text(text) => {
                if old.text_content() != Some(text.as_str()) {
                    self.host
                        .set_text_content(handle, text)
                        .map_err(ReconcileError::Host)?;
                    self.stats.record(Mutations::TEXT);
                }
            }
            NodeKind::Element {
                props, children, ..
            } => {
                if self.config.patch_props {
                    if let Some(old_props) = old.props() {
                        self.patch_props(handle, old_props, props)?;
                    }
                }

                let old_children = old.children();
                match (old_children.is_empty(), children.is_empty()) {
                    (false, false) => self.diff_children(handle, old_children, children)?,
                    (true, false) => self.add_nodes(handle, children, None)?,
                    (false, true) => {
                        for child in old_children {
                            self.remove_node(handle, child)?;
                        }
                    }
                    (true, true) => {}
                }
            }
        }

        Ok(())
    }

    fn patch_props(&mut self, handle: R::Handle, old: &Props, new: &Props) -> Result<(), Error<R>> {
        for change in diff_map(&old.attrs, &new.attrs) {
            let result = match change {
                PropChange::Set(name, value) => self.host.set_attribute(handle, name, value),
                PropChange::Remove(name) => self.host.remove_attribute(handle, name),
            };
            result.map_err(ReconcileError::Host)?;
            self.stats.record(Mutations::PROPS);
        }

        for change in diff_map(&old.style, &new.style) {
            let result = match change {
                PropChange::Set(name, value) => self.host.set_style_property(handle, name, value),
                PropChange::Remove(name) => self.host.remove_style_property(handle, name),
            };
            result.map_err(ReconcileError::Host)?;
            self.stats.record(Mutations::PROPS);
        }

        Ok(())
    }

    /// Swap `old`'s host node for a freshly created one in the same position.
    fn replace(&mut self, old: &Node<R>, new: &Node<R>) -> Result<(), Error<R>> {
        let old_handle = self.bound(old)?;
        let new_handle = self.create(new)?;

        if let Some(parent) = self.host.parent_of(old_handle) {
            self.insert(parent, new_handle, Some(old_handle))?;
            self.remove_node(parent, old)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Host plumbing
    // -------------------------------------------------------------------------

    fn bound(&self, node: &Node<R>) -> Result<R::Handle, Error<R>> {
        node.handle().ok_or_else(|| ReconcileError::Unbound {
            node: describe(node),
        })
    }

    /// Materialize `vnode` and its whole subtree; children are attached
    /// before the root is returned.
    fn create(&mut self, vnode: &Node<R>) -> Result<R::Handle, Error<R>> {
        let handle = match vnode.kind() {
            NodeKind::Text(text) => self.host.create_text(text).map_err(ReconcileError::Host)?,
            NodeKind::Element {
                tag,
                props,
                children,
            } => {
                let handle = self.host.create_element(tag).map_err(ReconcileError::Host)?;
                for (name, value) in &props.attrs {
                    self.host
                        .set_attribute(handle, name, value)
                        .map_err(ReconcileError::Host)?;
                }
                for (name, value) in &props.style {
                    self.host
                        .set_style_property(handle, name, value)
                        .map_err(ReconcileError::Host)?;
                }
                for child in children {
                    let child_handle = self.create(child)?;
                    self.host
                        .insert_before(handle, child_handle, None)
                        .map_err(ReconcileError::Host)?;
                }
                handle
            }
        };

        vnode.bind(handle);
        self.stats.record(Mutations::CREATE);
        Ok(handle)
    }

    /// Create each of `nodes` and insert it before `reference` (or append).
    fn add_nodes(
        &mut self,
        parent: R::Handle,
        nodes: &[Node<R>],
        reference: Option<R::Handle>,
    ) -> Result<(), Error<R>> {
        for node in nodes {
            let handle = self.create(node)?;
            self.insert(parent, handle, reference)?;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        parent: R::Handle,
        child: R::Handle,
        reference: Option<R::Handle>,
    ) -> Result<(), Error<R>> {
        self.host
            .insert_before(parent, child, reference)
            .map_err(ReconcileError::Host)?;
        self.stats.record(Mutations::INSERT);
        Ok(())
    }

    fn move_before(
        &mut self,
        parent: R::Handle,
        child: R::Handle,
        reference: Option<R::Handle>,
    ) -> Result<(), Error<R>> {
        self.host
            .insert_before(parent, child, reference)
            .map_err(ReconcileError::Host)?;
        self.stats.record(Mutations::MOVE);
        Ok(())
    }

    fn remove_node(&mut self, parent: R::Handle, node: &Node<R>) -> Result<(), Error<R>> {
        let handle = self.bound(node)?;
        self.host
            .remove_child(parent, handle)
            .map_err(ReconcileError::Host)?;
        self.stats.record(Mutations::REMOVE);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
