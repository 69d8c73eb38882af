//! Element builder.

use crate::types::{Key, PropValue, Props};

use super::node::{NodeKind, VNode};

/// Builder returned by [`VNode::element`].
///
/// # Example
///
/// ```
/// use spark_vdom::VNode;
///
/// let list: VNode<u32> = VNode::element("ul")
///     .attr("role", "list")
///     .style("flex-direction", "column")
///     .child(VNode::element("li").key("a").child(VNode::text("A")).build())
///     .child(VNode::element("li").key("b").child(VNode::text("B")).build())
///     .build();
///
/// assert_eq!(list.children().len(), 2);
/// ```
pub struct ElementBuilder<H> {
    tag: String,
    key: Option<Key>,
    props: Props,
    children: Vec<VNode<H>>,
}

impl<H: Copy> ElementBuilder<H> {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            key: None,
            props: Props::default(),
            children: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.attrs.insert(name.into(), value.into());
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.style.insert(name.into(), value.into());
        self
    }

    /// Replace all props at once.
    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn child(mut self, child: VNode<H>) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode<H>>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> VNode<H> {
        VNode::from_parts(
            self.key,
            NodeKind::Element {
                tag: self.tag,
                props: self.props,
                children: self.children,
            },
        )
    }
}
