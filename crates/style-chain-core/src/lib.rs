//! Core domain types for the host node graph that style controllers attach to.
//!
//! The host graph is owned by the surrounding editor. Controllers never
//! create or destroy nodes; they read topology through [`HostGraph`] and
//! write widget values and labels back into it.

mod error;
mod graph;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::{GraphError, GraphResult};
pub use graph::{HostGraph, StyleGraph};

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier for nodes within a [`StyleGraph`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier for links between sockets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u64);

/// Identifier for a nested subgraph.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubgraphId(pub u64);

// =============================================================================
// Widgets
// =============================================================================

/// Value held by a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValue {
    /// No value (spacers, dividers).
    #[default]
    Null,
    /// Toggle value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text or combo selection.
    Text(String),
}

impl WidgetValue {
    /// Returns the boolean value, if this is a toggle.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WidgetValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text value, if this is a text or combo widget.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WidgetValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True when the value is the toggle `true`.
    pub fn is_selected(&self) -> bool {
        matches!(self, WidgetValue::Bool(true))
    }
}

impl fmt::Display for WidgetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetValue::Null => write!(f, "null"),
            WidgetValue::Bool(b) => write!(f, "{b}"),
            WidgetValue::Number(n) => write!(f, "{n}"),
            WidgetValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for WidgetValue {
    fn from(b: bool) -> Self {
        WidgetValue::Bool(b)
    }
}

impl From<&str> for WidgetValue {
    fn from(s: &str) -> Self {
        WidgetValue::Text(s.to_string())
    }
}

impl From<String> for WidgetValue {
    fn from(s: String) -> Self {
        WidgetValue::Text(s)
    }
}

/// Points a proxy widget at the interior widget it stands in for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTarget {
    /// Subgraph containing the interior node.
    pub subgraph: SubgraphId,
    /// Interior node that owns the original widget.
    pub node: NodeId,
    /// Name of the original widget on the interior node.
    pub widget: String,
}

/// A named value-holding widget on a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Widget name, unique within its node.
    pub name: String,
    /// Current value.
    #[serde(default)]
    pub value: WidgetValue,
    /// Display label. `None` means the name is displayed.
    #[serde(default)]
    pub label: Option<String>,
    /// Allowed values for combo widgets.
    #[serde(default)]
    pub options: Vec<String>,
    /// Set when this widget proxies a widget inside a subgraph.
    #[serde(default)]
    pub proxy: Option<ProxyTarget>,
}

impl Widget {
    /// Create a widget with a value.
    pub fn new(name: impl Into<String>, value: impl Into<WidgetValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Create a toggle widget.
    pub fn toggle(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, value)
    }

    /// Create a combo widget with its options.
    pub fn combo(name: impl Into<String>, value: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value: WidgetValue::Text(value.into()),
            options,
            ..Default::default()
        }
    }

    /// Mark this widget as a proxy for an interior widget.
    pub fn with_proxy(mut self, proxy: ProxyTarget) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// The text currently displayed for this widget.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

// =============================================================================
// Sockets, links and nodes
// =============================================================================

/// An input socket. Holds at most one link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSocket {
    /// Socket name.
    pub name: String,
    /// Data type carried by the socket ("STRING", "TOP_STYLES", ...).
    #[serde(default)]
    pub kind: String,
    /// Connected link, if any.
    #[serde(default)]
    pub link: Option<LinkId>,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Widget backing this input, when the input doubles as a widget.
    #[serde(default)]
    pub widget: Option<String>,
}

impl InputSocket {
    /// Create an unconnected input socket.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Bind this input to a widget of the same node.
    pub fn for_widget(mut self, widget: impl Into<String>) -> Self {
        self.widget = Some(widget.into());
        self
    }
}

/// An output socket. Fans out to any number of links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSocket {
    /// Socket name.
    pub name: String,
    /// Data type carried by the socket.
    #[serde(default)]
    pub kind: String,
    /// Outgoing links, in connection order.
    #[serde(default)]
    pub links: Vec<LinkId>,
}

impl OutputSocket {
    /// Create an unconnected output socket.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            links: Vec::new(),
        }
    }
}

/// A connection from an output socket to an input socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link identifier.
    pub id: LinkId,
    /// Node owning the output socket.
    pub origin_id: NodeId,
    /// Output socket index on the origin node.
    pub origin_slot: usize,
    /// Node owning the input socket.
    pub target_id: NodeId,
    /// Input socket index on the target node.
    pub target_slot: usize,
}

/// A node of the host graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// Node class name as registered by the host ("MyTop10Styles //ZImage").
    pub class: String,
    /// Human readable title.
    #[serde(default)]
    pub title: String,
    /// Input sockets in declaration order.
    #[serde(default)]
    pub inputs: Vec<InputSocket>,
    /// Output sockets in declaration order.
    #[serde(default)]
    pub outputs: Vec<OutputSocket>,
    /// Widgets in declaration order.
    #[serde(default)]
    pub widgets: Vec<Widget>,
    /// Bumped on every forced redraw.
    #[serde(default)]
    pub revision: u64,
}

impl Node {
    /// Create an empty node of the given class.
    pub fn new(id: NodeId, class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            id,
            title: class.clone(),
            class,
            ..Default::default()
        }
    }

    /// Add an input socket (builder pattern).
    pub fn with_input(mut self, input: InputSocket) -> Self {
        self.inputs.push(input);
        self
    }

    /// Add an output socket (builder pattern).
    pub fn with_output(mut self, output: OutputSocket) -> Self {
        self.outputs.push(output);
        self
    }

    /// Add a widget (builder pattern).
    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    /// Find a widget by name.
    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// Find a widget by name, mutably.
    pub fn widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.name == name)
    }

    /// Names of all widgets whose name starts with `prefix`, in declaration order.
    pub fn widget_names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.widgets
            .iter()
            .filter(|w| w.name.starts_with(prefix))
            .map(|w| w.name.clone())
            .collect()
    }

    /// Index of the input socket with the given name.
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.name == name)
    }

    /// Index of the output socket with the given name.
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|o| o.name == name)
    }

    /// Request a redraw of this node.
    pub fn mark_dirty(&mut self) {
        self.revision += 1;
    }

    /// First token of the class name ("MyTop10Styles //ZImage" -> "MyTop10Styles").
    pub fn base_class(&self) -> &str {
        self.class.split_whitespace().next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_value_display() {
        assert_eq!(WidgetValue::from("\"Anime\"").to_string(), "\"Anime\"");
        assert_eq!(WidgetValue::Bool(true).to_string(), "true");
        assert_eq!(WidgetValue::Null.to_string(), "null");
        assert!(WidgetValue::Bool(true).is_selected());
        assert!(!WidgetValue::from("true").is_selected());
    }

    #[test]
    fn test_node_widget_prefix_order() {
        let node = Node::new(NodeId(1), "MyTop10Styles //ZImage")
            .with_widget(Widget::toggle("style_1", false))
            .with_widget(Widget::new("divider", WidgetValue::Null))
            .with_widget(Widget::toggle("style_2", false))
            .with_widget(Widget::combo("output_to", "custom_1", vec![]));

        assert_eq!(node.widget_names_with_prefix("style_"), vec!["style_1", "style_2"]);
        assert_eq!(node.base_class(), "MyTop10Styles");
    }

    #[test]
    fn test_display_label_falls_back_to_name() {
        let mut widget = Widget::toggle("style_1", false);
        assert_eq!(widget.display_label(), "style_1");
        widget.label = Some("1 - Anime".into());
        assert_eq!(widget.display_label(), "1 - Anime");
    }
}
