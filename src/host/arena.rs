//! Arena Host - in-memory host tree with a mutation journal.
//!
//! Nodes live in a slot vector addressed by generational [`NodeId`]s:
//! - Free slot pool for O(1) reuse
//! - Generation bump on release, so stale ids never alias a new node
//! - Parent / ordered children links per node
//! - Journal of every mutation, for tests and debugging
//!
//! Nothing here is rendered anywhere; the arena is the reference host that
//! makes every reconciler decision observable.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::PropValue;
use crate::vnode::{NodeKind, VNode};

use super::{HostError, HostRenderer};

// =============================================================================
// Node Id
// =============================================================================

/// Handle of an arena node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Journal
// =============================================================================

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    SetAttribute { node: NodeId, name: String, value: PropValue },
    RemoveAttribute { node: NodeId, name: String },
    SetStyle { node: NodeId, name: String, value: String },
    RemoveStyle { node: NodeId, name: String },
    SetText { node: NodeId, text: String },
    InsertBefore { parent: NodeId, child: NodeId, reference: Option<NodeId> },
    RemoveChild { parent: NodeId, child: NodeId },
}

// =============================================================================
// Snapshot
// =============================================================================

/// Owned copy of a host subtree, comparable with the tree a [`VNode`]
/// describes.
#[derive(Debug, Clone, PartialEq)]
pub enum HostTree {
    Text(String),
    Element {
        tag: String,
        attrs: BTreeMap<String, PropValue>,
        style: BTreeMap<String, String>,
        children: Vec<HostTree>,
    },
}

impl HostTree {
    /// The host tree a fully materialized `vnode` should produce.
    pub fn expected<H>(vnode: &VNode<H>) -> Self {
        match vnode.kind() {
            NodeKind::Text(text) => Self::Text(text.clone()),
            NodeKind::Element {
                tag,
                props,
                children,
            } => Self::Element {
                tag: tag.clone(),
                attrs: props.attrs.clone(),
                style: props.style.clone(),
                children: children.iter().map(Self::expected).collect(),
            },
        }
    }
}

// =============================================================================
// Arena State
// =============================================================================

#[derive(Debug)]
enum Content {
    Element {
        tag: String,
        attrs: BTreeMap<String, PropValue>,
        style: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct ArenaNode {
    content: Content,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<ArenaNode>,
}

/// In-memory host tree.
#[derive(Debug, Default)]
pub struct ArenaHost {
    slots: Vec<Slot>,
    free: Vec<u32>,
    journal: Vec<Mutation>,
}

impl ArenaHost {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    fn allocate(&mut self, content: Content) -> NodeId {
        let node = ArenaNode {
            content,
            parent: None,
            children: Vec::new(),
        };

        // Reuse free slot or grow
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Release a node and everything below it.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let slot = &mut self.slots[id.index()];
            if slot.generation != id.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    fn node(&self, id: NodeId) -> Result<&ArenaNode, HostError> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or_else(|| HostError::UnknownNode(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ArenaNode, HostError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| HostError::UnknownNode(id.to_string()))
    }

    fn element_maps(
        &mut self,
        id: NodeId,
    ) -> Result<(&mut BTreeMap<String, PropValue>, &mut BTreeMap<String, String>), HostError> {
        match &mut self.node_mut(id)?.content {
            Content::Element { attrs, style, .. } => Ok((attrs, style)),
            Content::Text(_) => Err(HostError::TextNode(id.to_string())),
        }
    }

    /// Unlink `child` from its current parent, if any.
    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.content {
            Content::Text(text) => Some(text),
            Content::Element { .. } => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        match &self.node(id).ok()?.content {
            Content::Element { attrs, .. } => attrs.get(name),
            Content::Text(_) => None,
        }
    }

    pub fn style_property(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).ok()?.content {
            Content::Element { style, .. } => style.get(name).map(String::as_str),
            Content::Text(_) => None,
        }
    }

    /// Owned copy of the subtree rooted at `id`.
    pub fn snapshot(&self, id: NodeId) -> Option<HostTree> {
        let node = self.node(id).ok()?;
        Some(match &node.content {
            Content::Text(text) => HostTree::Text(text.clone()),
            Content::Element { tag, attrs, style } => HostTree::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                style: style.clone(),
                children: node
                    .children
                    .iter()
                    .filter_map(|&c| self.snapshot(c))
                    .collect(),
            },
        })
    }

    // -------------------------------------------------------------------------
    // Journal
    // -------------------------------------------------------------------------

    pub fn mutations(&self) -> &[Mutation] {
        &self.journal
    }

    /// Drain the journal.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }
}

// =============================================================================
// HostRenderer
// =============================================================================

impl HostRenderer for ArenaHost {
    type Handle = NodeId;
    type Error = HostError;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(HostError::InvalidTag(tag.to_string()));
        }
        let node = self.allocate(Content::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            style: BTreeMap::new(),
        });
        self.journal.push(Mutation::CreateElement {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId, HostError> {
        let node = self.allocate(Content::Text(text.to_string()));
        self.journal.push(Mutation::CreateText {
            node,
            text: text.to_string(),
        });
        Ok(node)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &PropValue) -> Result<(), HostError> {
        let (attrs, _) = self.element_maps(node)?;
        attrs.insert(name.to_string(), value.clone());
        self.journal.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        let (attrs, _) = self.element_maps(node)?;
        attrs.remove(name);
        self.journal.push(Mutation::RemoveAttribute {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), HostError> {
        let (_, style) = self.element_maps(node)?;
        style.insert(name.to_string(), value.to_string());
        self.journal.push(Mutation::SetStyle {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_style_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        let (_, style) = self.element_maps(node)?;
        style.remove(name);
        self.journal.push(Mutation::RemoveStyle {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), HostError> {
        let target = self.node_mut(node)?;
        if let Content::Text(content) = &mut target.content {
            *content = text.to_string();
        } else {
            // Element content is replaced by a single text child
            let old_children = std::mem::take(&mut target.children);
            for child in old_children {
                self.release(child);
            }
            if !text.is_empty() {
                let child = self.allocate(Content::Text(text.to_string()));
                self.node_mut(child)?.parent = Some(node);
                self.node_mut(node)?.children.push(child);
            }
        }
        self.journal.push(Mutation::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), HostError> {
        if let Content::Text(_) = self.node(parent)?.content {
            return Err(HostError::TextNode(parent.to_string()));
        }
        self.node(child)?;

        // Inserting a node before itself keeps it in place
        let reference = match reference {
            Some(r) if r == child => self.next_sibling_of(child),
            other => other,
        };

        self.detach(child)?;

        let siblings = &self.node(parent)?.children;
        let position = match reference {
            Some(r) => siblings
                .iter()
                .position(|&c| c == r)
                .ok_or_else(|| HostError::NotAChild {
                    parent: parent.to_string(),
                    child: r.to_string(),
                })?,
            None => siblings.len(),
        };

        self.node_mut(parent)?.children.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        self.journal.push(Mutation::InsertBefore {
            parent,
            child,
            reference,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        if self.node(child)?.parent != Some(parent) {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.detach(child)?;
        self.release(child);
        self.journal.push(Mutation::RemoveChild { parent, child });
        Ok(())
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok()?.parent
    }

    fn next_sibling_of(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = &self.node(parent).ok()?.children;
        let position = siblings.iter().position(|&c| c == node)?;
        siblings.get(position + 1).copied()
    }
}

// =============================================================================
// Tests
// =============================================================================
