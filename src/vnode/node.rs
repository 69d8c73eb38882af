//! VNode - shared, immutable node description with a bound host handle.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::types::{Key, Props};

use super::ElementBuilder;

// =============================================================================
// Node Data
// =============================================================================

/// What a node describes: text content or an element.
pub enum NodeKind<H> {
    Text(String),
    Element {
        tag: String,
        props: Props,
        children: Vec<VNode<H>>,
    },
}

struct NodeData<H> {
    key: Option<Key>,
    kind: NodeKind<H>,
    handle: Cell<Option<H>>,
}

/// Declarative description of one tree node for one render pass.
///
/// `H` is the host handle type (see [`HostRenderer::Handle`]). Cloning a
/// `VNode` shares the same underlying node, which is what makes
/// [`VNode::ptr_eq`] meaningful.
///
/// A node object stands for exactly one host node, so it may appear at most
/// once in a tree. Reusing the same object under a different parent in the
/// next tree rebinds its handle while the old position still refers to it;
/// build a fresh node for content that changes parent.
///
/// [`HostRenderer::Handle`]: crate::host::HostRenderer::Handle
pub struct VNode<H> {
    data: Rc<NodeData<H>>,
}

impl<H> Clone for VNode<H> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}

impl<H: Copy> VNode<H> {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_parts(None, NodeKind::Text(text.into()))
    }

    /// Create a keyed text node.
    pub fn keyed_text(key: impl Into<Key>, text: impl Into<String>) -> Self {
        Self::from_parts(Some(key.into()), NodeKind::Text(text.into()))
    }

    /// Start building an element node.
    pub fn element(tag: impl Into<String>) -> ElementBuilder<H> {
        ElementBuilder::new(tag)
    }

    pub(crate) fn from_parts(key: Option<Key>, kind: NodeKind<H>) -> Self {
        Self {
            data: Rc::new(NodeData {
                key,
                kind,
                handle: Cell::new(None),
            }),
        }
    }

    /// Host handle this node currently stands for, if materialized.
    pub fn handle(&self) -> Option<H> {
        self.data.handle.get()
    }

    pub(crate) fn bind(&self, handle: H) {
        self.data.handle.set(Some(handle));
    }
}

impl<H> VNode<H> {
    pub fn key(&self) -> Option<&Key> {
        self.data.key.as_ref()
    }

    pub fn kind(&self) -> &NodeKind<H> {
        &self.data.kind
    }

    /// Tag of an element node, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match &self.data.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Content of a text node, `None` for elements.
    pub fn text_content(&self) -> Option<&str> {
        match &self.data.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data.kind, NodeKind::Text(_))
    }

    /// Element props. Text nodes have none and return `None`.
    pub fn props(&self) -> Option<&Props> {
        match &self.data.kind {
            NodeKind::Element { props, .. } => Some(props),
            NodeKind::Text(_) => None,
        }
    }

    /// Ordered child list (empty for text nodes).
    pub fn children(&self) -> &[VNode<H>] {
        match &self.data.kind {
            NodeKind::Element { children, .. } => children,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// True if both values are the very same node object.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.data, &b.data)
    }

    /// Same logical node as `other`; see [`same_identity`].
    pub fn same_identity(&self, other: &Self) -> bool {
        same_identity(self, other)
    }
}

impl<H: Copy + fmt::Debug> fmt::Debug for NodeKind<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Element {
                tag,
                props,
                children,
            } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("props", props)
                .field("children", children)
                .finish(),
        }
    }
}

impl<H: Copy + fmt::Debug> fmt::Debug for VNode<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        if let Some(key) = self.key() {
            s.field("key", key);
        }
        match self.kind() {
            NodeKind::Text(text) => s.field("text", text),
            NodeKind::Element {
                tag,
                props,
                children,
            } => s
                .field("tag", tag)
                .field("props", props)
                .field("children", children),
        };
        s.field("handle", &self.handle()).finish()
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Decide whether `old` and `new` describe the same logical node.
///
/// Keys must be equal (both absent counts as equal) and tags must be equal
/// (both text counts as equal). Text content, props and children are never
/// looked at: two sibling text nodes always match and differ only in content.
pub fn same_identity<H>(old: &VNode<H>, new: &VNode<H>) -> bool {
    old.key() == new.key() && old.tag() == new.tag()
}

// =============================================================================
// Tests
// =============================================================================
