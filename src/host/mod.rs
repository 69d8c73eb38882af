//! Host renderers - the primitive tree operations the reconciler drives.
//!
//! The reconciler never touches a host tree directly. Every creation, move,
//! removal and attribute write goes through [`HostRenderer`], so the same
//! diff runs against any retained tree:
//!
//! - [`ArenaHost`] - in-memory tree with a mutation journal
//! - [`LayoutHost`] - taffy-backed flexbox tree measured in terminal cells
//!
//! # Tree semantics
//!
//! Implementations follow DOM-like rules:
//! - `insert_before` with a node that already has a parent moves it
//! - `insert_before` with `None` as reference appends
//! - `remove_child` detaches the node and releases its whole subtree
//! - `set_text_content` on an element replaces all of its children

pub mod arena;
pub mod layout;
mod text_measure;

use std::fmt;

use crate::types::PropValue;

pub use arena::{ArenaHost, HostTree, Mutation, NodeId};
pub use layout::{LayoutHost, NodeLayout};

/// Error shared by the bundled hosts.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Element creation with an empty or malformed tag.
    #[error("invalid element tag {0:?}")]
    InvalidTag(String),

    /// The handle does not refer to a live node.
    #[error("unknown host node {0}")]
    UnknownNode(String),

    /// A reference or removed node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    /// Attribute or style operation on a text node.
    #[error("node {0} is a text node")]
    TextNode(String),

    /// Style value that cannot be applied.
    #[error("invalid value {value:?} for style property {name:?}")]
    InvalidStyleValue { name: String, value: String },

    /// Error from the layout engine.
    #[error("layout: {0}")]
    Layout(taffy::TaffyError),
}

/// Primitive mutation interface of a host tree.
///
/// Handles are small copyable ids owned by the host. The reconciler stores
/// them in virtual nodes but never interprets them.
pub trait HostRenderer {
    type Handle: Copy + Eq + fmt::Debug;
    type Error: std::error::Error + 'static;

    fn create_element(&mut self, tag: &str) -> Result<Self::Handle, Self::Error>;

    fn create_text(&mut self, text: &str) -> Result<Self::Handle, Self::Error>;

    fn set_attribute(
        &mut self,
        node: Self::Handle,
        name: &str,
        value: &PropValue,
    ) -> Result<(), Self::Error>;

    fn remove_attribute(&mut self, node: Self::Handle, name: &str) -> Result<(), Self::Error>;

    fn set_style_property(
        &mut self,
        node: Self::Handle,
        name: &str,
        value: &str,
    ) -> Result<(), Self::Error>;

    fn remove_style_property(&mut self, node: Self::Handle, name: &str)
    -> Result<(), Self::Error>;

    /// Replace the node's content with `text`.
    ///
    /// On an element this drops every existing child.
    fn set_text_content(&mut self, node: Self::Handle, text: &str) -> Result<(), Self::Error>;

    /// Insert `child` under `parent` before `reference`, or append when
    /// `reference` is `None`. A child that is already attached is moved.
    fn insert_before(
        &mut self,
        parent: Self::Handle,
        child: Self::Handle,
        reference: Option<Self::Handle>,
    ) -> Result<(), Self::Error>;

    /// Detach `child` from `parent` and release its subtree.
    fn remove_child(&mut self, parent: Self::Handle, child: Self::Handle)
    -> Result<(), Self::Error>;

    fn parent_of(&self, node: Self::Handle) -> Option<Self::Handle>;

    fn next_sibling_of(&self, node: Self::Handle) -> Option<Self::Handle>;
}
