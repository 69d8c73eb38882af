//! Layout Host - host tree backed by the Taffy layout engine.
//!
//! Every host node is a Taffy node. Style properties written by the
//! reconciler are translated into Taffy `Style` fields, text nodes become
//! measured leaves, and [`LayoutHost::compute_layout`] produces cell
//! rectangles for a terminal renderer.
//!
//! # Style properties
//!
//! | property | values |
//! |----------|--------|
//! | `display` | `flex`, `block`, `none` |
//! | `position` | `relative`, `absolute` |
//! | `flex-direction` | `row`, `column`, `row-reverse`, `column-reverse` |
//! | `flex-wrap` | `nowrap`, `wrap`, `wrap-reverse` |
//! | `flex-grow`, `flex-shrink` | number |
//! | `flex-basis`, `width`, `height`, `min-*`, `max-*` | `auto`, cells, `N%` |
//! | `justify-content`, `align-items` | `flex-start`, `center`, `flex-end`, ... |
//! | `gap`, `padding`, `padding-*`, `border` | cells |
//! | `margin`, `margin-*` | `auto`, cells, `N%` |
//! | `overflow` | `visible`, `hidden`, `scroll` |
//!
//! Unknown properties are ignored (logged at debug level).

use std::collections::BTreeMap;

use taffy::{
    AlignItems as TaffyAlignItems, AvailableSpace, Dimension as TaffyDimension, Display,
    FlexDirection, FlexWrap, JustifyContent, LengthPercentage, LengthPercentageAuto, NodeId,
    Overflow, Position, Rect, Size, Style, TaffyTree,
};

use crate::types::{Dimension, PropValue};

use super::text_measure::{measure_text_height, string_width};
use super::{HostError, HostRenderer};

// =============================================================================
// Node Context
// =============================================================================

/// Content stored with each Taffy node.
#[derive(Debug, Clone)]
enum HostNode {
    Element {
        tag: String,
        attrs: BTreeMap<String, PropValue>,
    },
    Text(String),
}

/// Position and size of a node in terminal cells, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeLayout {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

// =============================================================================
// Dimension Conversion
// =============================================================================

fn to_taffy_dimension(dim: Dimension) -> TaffyDimension {
    match dim {
        Dimension::Auto => TaffyDimension::Auto,
        Dimension::Cells(n) => TaffyDimension::Length(n as f32),
        Dimension::Percent(p) => TaffyDimension::Percent(p / 100.0),
    }
}

fn to_taffy_lpa(dim: Dimension) -> LengthPercentageAuto {
    match dim {
        Dimension::Auto => LengthPercentageAuto::Auto,
        Dimension::Cells(n) => LengthPercentageAuto::Length(n as f32),
        Dimension::Percent(p) => LengthPercentageAuto::Percent(p / 100.0),
    }
}

// =============================================================================
// Style Parsing
// =============================================================================

fn parse_dimension(value: &str) -> Option<TaffyDimension> {
    value.parse::<Dimension>().ok().map(to_taffy_dimension)
}

fn parse_lpa(value: &str) -> Option<LengthPercentageAuto> {
    value.parse::<Dimension>().ok().map(to_taffy_lpa)
}

fn parse_cells(value: &str) -> Option<LengthPercentage> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .map(|n| LengthPercentage::Length(n as f32))
}

fn parse_number(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}

fn parse_display(value: &str) -> Option<Display> {
    match value.trim() {
        "flex" => Some(Display::Flex),
        "block" => Some(Display::Block),
        "none" => Some(Display::None),
        _ => None,
    }
}

fn parse_position(value: &str) -> Option<Position> {
    match value.trim() {
        "relative" => Some(Position::Relative),
        "absolute" => Some(Position::Absolute),
        _ => None,
    }
}

fn parse_flex_direction(value: &str) -> Option<FlexDirection> {
    match value.trim() {
        "row" => Some(FlexDirection::Row),
        "column" => Some(FlexDirection::Column),
        "row-reverse" => Some(FlexDirection::RowReverse),
        "column-reverse" => Some(FlexDirection::ColumnReverse),
        _ => None,
    }
}

fn parse_flex_wrap(value: &str) -> Option<FlexWrap> {
    match value.trim() {
        "nowrap" => Some(FlexWrap::NoWrap),
        "wrap" => Some(FlexWrap::Wrap),
        "wrap-reverse" => Some(FlexWrap::WrapReverse),
        _ => None,
    }
}

fn parse_justify_content(value: &str) -> Option<Option<JustifyContent>> {
    Some(Some(match value.trim() {
        "flex-start" => JustifyContent::FlexStart,
        "center" => JustifyContent::Center,
        "flex-end" => JustifyContent::FlexEnd,
        "space-between" => JustifyContent::SpaceBetween,
        "space-around" => JustifyContent::SpaceAround,
        "space-evenly" => JustifyContent::SpaceEvenly,
        _ => return None,
    }))
}

fn parse_align_items(value: &str) -> Option<Option<TaffyAlignItems>> {
    Some(Some(match value.trim() {
        "stretch" => TaffyAlignItems::Stretch,
        "flex-start" => TaffyAlignItems::FlexStart,
        "center" => TaffyAlignItems::Center,
        "flex-end" => TaffyAlignItems::FlexEnd,
        "baseline" => TaffyAlignItems::Baseline,
        _ => return None,
    }))
}

fn parse_overflow(value: &str) -> Option<Overflow> {
    match value.trim() {
        "visible" => Some(Overflow::Visible),
        "hidden" => Some(Overflow::Clip),
        "scroll" => Some(Overflow::Scroll),
        _ => None,
    }
}

/// Parse `value` with `parse`, or fall back to `default` when the property is
/// being removed.
fn parse_or<T>(
    name: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    default: T,
) -> Result<T, HostError> {
    match value {
        None => Ok(default),
        Some(v) => parse(v).ok_or_else(|| HostError::InvalidStyleValue {
            name: name.to_string(),
            value: v.to_string(),
        }),
    }
}

/// Write one style property into `style`. `None` resets it to the default.
///
/// Returns `false` for properties this host does not know.
fn apply_style(style: &mut Style, name: &str, value: Option<&str>) -> Result<bool, HostError> {
    let d = Style::default();

    match name {
        "display" => style.display = parse_or(name, value, parse_display, d.display)?,
        "position" => style.position = parse_or(name, value, parse_position, d.position)?,
        "flex-direction" => {
            style.flex_direction = parse_or(name, value, parse_flex_direction, d.flex_direction)?
        }
        "flex-wrap" => style.flex_wrap = parse_or(name, value, parse_flex_wrap, d.flex_wrap)?,
        "flex-grow" => style.flex_grow = parse_or(name, value, parse_number, d.flex_grow)?,
        "flex-shrink" => style.flex_shrink = parse_or(name, value, parse_number, d.flex_shrink)?,
        "flex-basis" => style.flex_basis = parse_or(name, value, parse_dimension, d.flex_basis)?,
        "justify-content" => {
            style.justify_content =
                parse_or(name, value, parse_justify_content, d.justify_content)?
        }
        "align-items" => {
            style.align_items = parse_or(name, value, parse_align_items, d.align_items)?
        }

        // Dimensions
        "width" => style.size.width = parse_or(name, value, parse_dimension, d.size.width)?,
        "height" => style.size.height = parse_or(name, value, parse_dimension, d.size.height)?,
        "min-width" => {
            style.min_size.width = parse_or(name, value, parse_dimension, d.min_size.width)?
        }
        "min-height" => {
            style.min_size.height = parse_or(name, value, parse_dimension, d.min_size.height)?
        }
        "max-width" => {
            style.max_size.width = parse_or(name, value, parse_dimension, d.max_size.width)?
        }
        "max-height" => {
            style.max_size.height = parse_or(name, value, parse_dimension, d.max_size.height)?
        }

        // Spacing
        "gap" => {
            let gap = parse_or(name, value, parse_cells, d.gap.width)?;
            style.gap = Size {
                width: gap,
                height: gap,
            };
        }
        "padding" => {
            let p = parse_or(name, value, parse_cells, d.padding.top)?;
            style.padding = Rect {
                top: p,
                right: p,
                bottom: p,
                left: p,
            };
        }
        "padding-top" => style.padding.top = parse_or(name, value, parse_cells, d.padding.top)?,
        "padding-right" => {
            style.padding.right = parse_or(name, value, parse_cells, d.padding.right)?
        }
        "padding-bottom" => {
            style.padding.bottom = parse_or(name, value, parse_cells, d.padding.bottom)?
        }
        "padding-left" => style.padding.left = parse_or(name, value, parse_cells, d.padding.left)?,
        "margin" => {
            let m = parse_or(name, value, parse_lpa, d.margin.top)?;
            style.margin = Rect {
                top: m,
                right: m,
                bottom: m,
                left: m,
            };
        }
        "margin-top" => style.margin.top = parse_or(name, value, parse_lpa, d.margin.top)?,
        "margin-right" => style.margin.right = parse_or(name, value, parse_lpa, d.margin.right)?,
        "margin-bottom" => {
            style.margin.bottom = parse_or(name, value, parse_lpa, d.margin.bottom)?
        }
        "margin-left" => style.margin.left = parse_or(name, value, parse_lpa, d.margin.left)?,

        // Border width only (style and color belong to the painter)
        "border" => {
            let b = parse_or(name, value, parse_cells, d.border.top)?;
            style.border = Rect {
                top: b,
                right: b,
                bottom: b,
                left: b,
            };
        }
        "overflow" => {
            let o = parse_or(name, value, parse_overflow, d.overflow.x)?;
            style.overflow = taffy::Point { x: o, y: o };
        }

        _ => return Ok(false),
    }

    Ok(true)
}

// =============================================================================
// Layout Host
// =============================================================================

/// Host tree whose nodes are Taffy layout nodes.
pub struct LayoutHost {
    tree: TaffyTree<HostNode>,
}

impl Default for LayoutHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutHost {
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
        }
    }

    /// Content of a live node. Every node is created with a context, so a
    /// missing context means the id is stale.
    fn context(&self, node: NodeId) -> Result<&HostNode, HostError> {
        self.tree
            .get_node_context(node)
            .ok_or_else(|| HostError::UnknownNode(format!("{node:?}")))
    }

    fn context_mut(&mut self, node: NodeId) -> Result<&mut HostNode, HostError> {
        self.tree
            .get_node_context_mut(node)
            .ok_or_else(|| HostError::UnknownNode(format!("{node:?}")))
    }

    fn element_attrs(&mut self, node: NodeId) -> Result<&mut BTreeMap<String, PropValue>, HostError> {
        match self.context_mut(node)? {
            HostNode::Element { attrs, .. } => Ok(attrs),
            HostNode::Text(_) => Err(HostError::TextNode(format!("{node:?}"))),
        }
    }

    fn update_style(&mut self, node: NodeId, name: &str, value: Option<&str>) -> Result<(), HostError> {
        if let HostNode::Text(_) = self.context(node)? {
            return Err(HostError::TextNode(format!("{node:?}")));
        }

        let mut style = self.tree.style(node).map_err(HostError::Layout)?.clone();
        if apply_style(&mut style, name, value)? {
            self.tree.set_style(node, style).map_err(HostError::Layout)?;
        } else {
            tracing::debug!(?node, property = name, "ignoring unknown style property");
        }
        Ok(())
    }

    /// Free `node` and all of its descendants.
    fn release(&mut self, node: NodeId) -> Result<(), HostError> {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            stack.extend(self.tree.children(node).map_err(HostError::Layout)?);
            self.tree.set_node_context(node, None).map_err(HostError::Layout)?;
            self.tree.remove(node).map_err(HostError::Layout)?;
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        if let Some(parent) = self.tree.parent(child) {
            self.tree.remove_child(parent, child).map_err(HostError::Layout)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.context(node).is_ok()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        if !self.is_alive(node) {
            return Vec::new();
        }
        self.tree.children(node).unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.context(node).ok()? {
            HostNode::Element { tag, .. } => Some(tag),
            HostNode::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.context(node).ok()? {
            HostNode::Text(text) => Some(text),
            HostNode::Element { .. } => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        match self.context(node).ok()? {
            HostNode::Element { attrs, .. } => attrs.get(name),
            HostNode::Text(_) => None,
        }
    }

    /// Resolved Taffy style of a node.
    pub fn style(&self, node: NodeId) -> Option<&Style> {
        self.context(node).ok()?;
        self.tree.style(node).ok()
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Lay out the tree rooted at `root`.
    ///
    /// # Arguments
    ///
    /// * `width` - Available width in terminal columns
    /// * `height` - Available height in rows, `None` to size by content
    pub fn compute_layout(&mut self, root: NodeId, width: u16, height: Option<u16>) -> Result<(), HostError> {
        self.context(root)?;

        let available = Size {
            width: AvailableSpace::Definite(width as f32),
            height: match height {
                Some(h) => AvailableSpace::Definite(h as f32),
                None => AvailableSpace::MaxContent,
            },
        };

        let mut measure_fn = |known_dimensions: Size<Option<f32>>,
                              available_space: Size<AvailableSpace>,
                              _node_id: NodeId,
                              context: Option<&mut HostNode>,
                              _style: &Style| {
            match context {
                Some(HostNode::Text(content)) => measure_text(content, known_dimensions, available_space),
                _ => Size::ZERO,
            }
        };

        self.tree
            .compute_layout_with_measure(root, available, &mut measure_fn)
            .map_err(HostError::Layout)
    }

    /// Computed rectangle of `node`; valid after [`compute_layout`](Self::compute_layout).
    pub fn layout(&self, node: NodeId) -> Result<NodeLayout, HostError> {
        self.context(node)?;
        let layout = self.tree.layout(node).map_err(HostError::Layout)?;
        Ok(NodeLayout {
            x: layout.location.x.round() as u16,
            y: layout.location.y.round() as u16,
            width: layout.size.width.round() as u16,
            height: layout.size.height.round() as u16,
        })
    }
}

/// Measure function for text leaves.
fn measure_text(
    content: &str,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    if content.is_empty() {
        return Size::ZERO;
    }

    let text_width = string_width(content);
    let avail_width = match available_space.width {
        AvailableSpace::Definite(w) => w.max(0.0) as usize,
        AvailableSpace::MinContent => text_width,
        AvailableSpace::MaxContent => usize::MAX,
    };

    let width = text_width.min(avail_width.max(1));
    let height = measure_text_height(content, avail_width.max(1));

    Size {
        width: known_dimensions.width.unwrap_or(width as f32),
        height: known_dimensions.height.unwrap_or(height as f32),
    }
}

// =============================================================================
// HostRenderer
// =============================================================================

impl HostRenderer for LayoutHost {
    type Handle = NodeId;
    type Error = HostError;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(HostError::InvalidTag(tag.to_string()));
        }
        let context = HostNode::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        };
        self.tree
            .new_leaf_with_context(Style::default(), context)
            .map_err(HostError::Layout)
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId, HostError> {
        self.tree
            .new_leaf_with_context(Style::default(), HostNode::Text(text.to_string()))
            .map_err(HostError::Layout)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &PropValue) -> Result<(), HostError> {
        self.element_attrs(node)?.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        self.element_attrs(node)?.remove(name);
        Ok(())
    }

    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), HostError> {
        self.update_style(node, name, Some(value))
    }

    fn remove_style_property(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        self.update_style(node, name, None)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<(), HostError> {
        if let HostNode::Text(content) = self.context_mut(node)? {
            *content = text.to_string();
            return self.tree.mark_dirty(node).map_err(HostError::Layout);
        }

        // Element content is replaced by a single text child
        for child in self.tree.children(node).map_err(HostError::Layout)? {
            self.release(child)?;
        }
        if !text.is_empty() {
            let child = self.create_text(text)?;
            self.tree.add_child(node, child).map_err(HostError::Layout)?;
        }
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), HostError> {
        if let HostNode::Text(_) = self.context(parent)? {
            return Err(HostError::TextNode(format!("{parent:?}")));
        }
        self.context(child)?;

        let reference = match reference {
            Some(r) if r == child => self.next_sibling_of(child),
            other => other,
        };

        self.detach(child)?;

        match reference {
            None => self.tree.add_child(parent, child).map_err(HostError::Layout),
            Some(r) => {
                let siblings = self.tree.children(parent).map_err(HostError::Layout)?;
                let index = siblings
                    .iter()
                    .position(|&c| c == r)
                    .ok_or_else(|| HostError::NotAChild {
                        parent: format!("{parent:?}"),
                        child: format!("{r:?}"),
                    })?;
                self.tree
                    .insert_child_at_index(parent, index, child)
                    .map_err(HostError::Layout)
            }
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.context(parent)?;
        self.context(child)?;
        if self.tree.parent(child) != Some(parent) {
            return Err(HostError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{child:?}"),
            });
        }
        self.tree.remove_child(parent, child).map_err(HostError::Layout)?;
        self.release(child)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.context(node).ok()?;
        self.tree.parent(node)
    }

    fn next_sibling_of(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = self.tree.children(parent).ok()?;
        let position = siblings.iter().position(|&c| c == node)?;
        siblings.get(position + 1).copied()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_order_and_move() {
        let mut host = LayoutHost::new();
        let root = host.create_element("box").unwrap();
        let a = host.create_text("a").unwrap();
        let b = host.create_text("b").unwrap();
        let c = host.create_text("c").unwrap();
        host.insert_before(root, a, None).unwrap();
        host.insert_before(root, c, None).unwrap();
        host.insert_before(root, b, Some(c)).unwrap();
        assert_eq!(host.children(root), vec![a, b, c]);

        host.insert_before(root, c, Some(a)).unwrap();
        assert_eq!(host.children(root), vec![c, a, b]);
        assert_eq!(host.next_sibling_of(a), Some(b));
        assert_eq!(host.parent_of(b), Some(root));
    }

    #[test]
    fn test_remove_child_releases_subtree() {
        let mut host = LayoutHost::new();
        let root = host.create_element("box").unwrap();
        let inner = host.create_element("box").unwrap();
        let leaf = host.create_text("leaf").unwrap();
        host.insert_before(root, inner, None).unwrap();
        host.insert_before(inner, leaf, None).unwrap();

        host.remove_child(root, inner).unwrap();
        assert!(!host.is_alive(inner));
        assert!(!host.is_alive(leaf));
        assert!(host.children(root).is_empty());
        assert_eq!(host.parent_of(leaf), None);
    }

    #[test]
    fn test_style_properties() {
        let mut host = LayoutHost::new();
        let node = host.create_element("box").unwrap();
        host.set_style_property(node, "flex-direction", "row").unwrap();
        host.set_style_property(node, "width", "50%").unwrap();
        host.set_style_property(node, "padding", "1").unwrap();

        let style = host.style(node).unwrap();
        assert_eq!(style.flex_direction, FlexDirection::Row);
        assert_eq!(style.size.width, TaffyDimension::Percent(0.5));
        assert_eq!(style.padding.left, LengthPercentage::Length(1.0));

        host.remove_style_property(node, "flex-direction").unwrap();
        assert_eq!(host.style(node).unwrap().flex_direction, Style::default().flex_direction);
    }

    #[test]
    fn test_invalid_and_unknown_style() {
        let mut host = LayoutHost::new();
        let node = host.create_element("box").unwrap();
        assert!(matches!(
            host.set_style_property(node, "width", "wide"),
            Err(HostError::InvalidStyleValue { .. })
        ));
        assert!(host.set_style_property(node, "color", "red").is_ok());
    }

    #[test]
    fn test_row_layout() {
        let mut host = LayoutHost::new();
        let root = host.create_element("box").unwrap();
        host.set_style_property(root, "flex-direction", "row").unwrap();
        let left = host.create_text("hello").unwrap();
        let right = host.create_text("hi").unwrap();
        host.insert_before(root, left, None).unwrap();
        host.insert_before(root, right, None).unwrap();

        host.compute_layout(root, 80, Some(24)).unwrap();
        let left_layout = host.layout(left).unwrap();
        let right_layout = host.layout(right).unwrap();
        assert_eq!((left_layout.x, left_layout.width), (0, 5));
        assert_eq!((right_layout.x, right_layout.width), (5, 2));
    }

    #[test]
    fn test_text_measured_by_grapheme() {
        let mut host = LayoutHost::new();
        let root = host.create_element("box").unwrap();
        host.set_style_property(root, "flex-direction", "row").unwrap();
        let accented = host.create_text("e\u{301}x").unwrap();
        let wide = host.create_text("日本").unwrap();
        host.insert_before(root, accented, None).unwrap();
        host.insert_before(root, wide, None).unwrap();

        host.compute_layout(root, 80, Some(24)).unwrap();
        assert_eq!(host.layout(accented).unwrap().width, 2);
        let wide_layout = host.layout(wide).unwrap();
        assert_eq!((wide_layout.x, wide_layout.width), (2, 4));
    }

    #[test]
    fn test_text_content_update() {
        let mut host = LayoutHost::new();
        let text = host.create_text("old").unwrap();
        host.set_text_content(text, "new").unwrap();
        assert_eq!(host.text(text), Some("new"));

        let elem = host.create_element("box").unwrap();
        let child = host.create_text("child").unwrap();
        host.insert_before(elem, child, None).unwrap();
        host.set_text_content(elem, "flat").unwrap();
        assert!(!host.is_alive(child));
        let children = host.children(elem);
        assert_eq!(children.len(), 1);
        assert_eq!(host.text(children[0]), Some("flat"));
    }

    #[test]
    fn test_attributes_on_text_rejected() {
        let mut host = LayoutHost::new();
        let text = host.create_text("t").unwrap();
        assert!(host.set_attribute(text, "id", &PropValue::from("x")).is_err());
    }
}
