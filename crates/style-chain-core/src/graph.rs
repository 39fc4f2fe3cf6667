//! Graph query interface and the in-memory host graph.
//!
//! [`HostGraph`] is everything the synchronization layer needs from the
//! surrounding editor: pure topology reads plus widget access. Nothing is
//! cached; every query reflects the graph as it is right now.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::{InputSocket, Link, LinkId, Node, NodeId, SubgraphId, Widget, WidgetValue};

/// Read/write access to a host graph.
pub trait HostGraph {
    /// Get a node by ID.
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Get a mutable node by ID.
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// All node IDs in insertion order.
    fn node_ids(&self) -> Vec<NodeId>;

    /// Nodes connected to the outputs of `id`.
    ///
    /// When `slot` is given only outputs with that name are considered.
    /// Targets are returned in output order, then link order.
    fn output_nodes(&self, id: NodeId, slot: Option<&str>) -> Vec<NodeId>;

    /// ID of the node connected to an input of `id`.
    ///
    /// When `slot` is given the first input with that name is inspected,
    /// otherwise only the first input. Returns `None` when unconnected.
    fn input_origin(&self, id: NodeId, slot: Option<&str>) -> Option<NodeId>;

    /// Set or clear (`None` or empty) the display label of a widget and of
    /// the input backed by it. Proxy widgets rename their interior widget too.
    fn rename_widget(&mut self, id: NodeId, widget: &str, label: Option<&str>) -> GraphResult<()>;

    /// Groups of nodes that form cycles over links leaving `output`.
    ///
    /// Hosts that cannot analyse their topology report no cycles.
    fn chain_cycles(&self, _output: &str) -> Vec<Vec<NodeId>> {
        Vec::new()
    }

    /// Check whether a node exists.
    fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Rename a widget and force the node to redraw.
    ///
    /// The node is marked dirty even when the rename fails.
    fn force_rename_widget(
        &mut self,
        id: NodeId,
        widget: &str,
        label: Option<&str>,
    ) -> GraphResult<()> {
        let result = self.rename_widget(id, widget, label);
        if let Some(node) = self.node_mut(id) {
            node.mark_dirty();
        }
        result
    }
}

/// A nested graph that proxy widgets can point into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    /// Subgraph identifier.
    pub id: SubgraphId,
    /// Interior graph.
    pub graph: StyleGraph,
}

/// In-memory host graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleGraph {
    /// All nodes, in insertion order.
    nodes: Vec<Node>,
    /// All links.
    links: Vec<Link>,
    /// Nested subgraphs.
    #[serde(default)]
    subgraphs: Vec<Subgraph>,
    /// Next link identifier to hand out.
    #[serde(default)]
    next_link_id: u64,
}

impl StyleGraph {
    /// Creates an empty graph with no nodes or links.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes currently tracked.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of links currently tracked.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Iterate over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All links.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Get a link by ID.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Add a node. Fails if a node with the same ID exists.
    pub fn add_node(&mut self, node: Node) -> GraphResult<NodeId> {
        let id = node.id;
        if self.contains(id) {
            return Err(GraphError::DuplicateNode { node_id: id });
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// Remove a node together with every link attached to it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(GraphError::NodeNotFound { node_id: id })?;

        let attached: Vec<LinkId> = self
            .links
            .iter()
            .filter(|l| l.origin_id == id || l.target_id == id)
            .map(|l| l.id)
            .collect();
        for link_id in attached {
            self.unlink(link_id);
        }

        Ok(self.nodes.remove(pos))
    }

    /// Connect output `output` of `origin` to input `input` of `target`.
    ///
    /// An input holds at most one link; an existing link on `input` is
    /// replaced.
    pub fn connect(
        &mut self,
        origin: NodeId,
        output: &str,
        target: NodeId,
        input: &str,
    ) -> GraphResult<LinkId> {
        let origin_slot = self
            .node(origin)
            .ok_or(GraphError::NodeNotFound { node_id: origin })?
            .output_index(output)
            .ok_or_else(|| GraphError::SocketNotFound {
                node_id: origin,
                socket: output.to_string(),
            })?;
        let target_slot = self
            .node(target)
            .ok_or(GraphError::NodeNotFound { node_id: target })?
            .input_index(input)
            .ok_or_else(|| GraphError::SocketNotFound {
                node_id: target,
                socket: input.to_string(),
            })?;

        self.disconnect_input(target, input)?;

        self.next_link_id += 1;
        let id = LinkId(self.next_link_id);
        self.links.push(Link {
            id,
            origin_id: origin,
            origin_slot,
            target_id: target,
            target_slot,
        });

        if let Some(node) = self.node_mut(origin) {
            node.outputs[origin_slot].links.push(id);
        }
        if let Some(node) = self.node_mut(target) {
            node.inputs[target_slot].link = Some(id);
        }
        Ok(id)
    }

    /// Disconnect whatever is linked to input `input` of `target`.
    ///
    /// Returns the removed link, if there was one.
    pub fn disconnect_input(&mut self, target: NodeId, input: &str) -> GraphResult<Option<LinkId>> {
        let node = self
            .node(target)
            .ok_or(GraphError::NodeNotFound { node_id: target })?;
        let socket = node
            .inputs
            .iter()
            .find(|i| i.name == input)
            .ok_or_else(|| GraphError::SocketNotFound {
                node_id: target,
                socket: input.to_string(),
            })?;

        let Some(link_id) = socket.link else {
            return Ok(None);
        };
        self.unlink(link_id);
        Ok(Some(link_id))
    }

    /// Set a widget value, returning the previous one.
    pub fn set_widget_value(
        &mut self,
        id: NodeId,
        widget: &str,
        value: WidgetValue,
    ) -> GraphResult<WidgetValue> {
        let node = self
            .node_mut(id)
            .ok_or(GraphError::NodeNotFound { node_id: id })?;
        let w = node
            .widget_mut(widget)
            .ok_or_else(|| GraphError::WidgetNotFound {
                node_id: id,
                widget: widget.to_string(),
            })?;
        Ok(std::mem::replace(&mut w.value, value))
    }

    /// Get a widget by node and name.
    pub fn widget(&self, id: NodeId, widget: &str) -> Option<&Widget> {
        self.node(id)?.widget(widget)
    }

    /// Add a nested subgraph.
    pub fn add_subgraph(&mut self, id: SubgraphId, graph: StyleGraph) {
        self.subgraphs.retain(|s| s.id != id);
        self.subgraphs.push(Subgraph { id, graph });
    }

    /// Get a nested subgraph.
    pub fn subgraph(&self, id: SubgraphId) -> Option<&StyleGraph> {
        self.subgraphs.iter().find(|s| s.id == id).map(|s| &s.graph)
    }

    fn subgraph_mut(&mut self, id: SubgraphId) -> Option<&mut StyleGraph> {
        self.subgraphs
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| &mut s.graph)
    }

    /// Convert to petgraph StableDiGraph for analysis.
    /// Edge weights are the origin output socket names.
    pub fn to_petgraph(&self) -> (StableDiGraph<NodeId, String>, HashMap<NodeId, NodeIndex>) {
        self.project(|_| true)
    }

    /// Serialize the graph snapshot to pretty JSON.
    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a graph snapshot from JSON.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // Internal helpers

    fn project(
        &self,
        keep: impl Fn(&str) -> bool,
    ) -> (StableDiGraph<NodeId, String>, HashMap<NodeId, NodeIndex>) {
        let mut graph = StableDiGraph::new();
        let mut id_to_index = HashMap::new();

        for node in &self.nodes {
            let idx = graph.add_node(node.id);
            id_to_index.insert(node.id, idx);
        }

        for link in &self.links {
            let Some(socket) = self
                .node(link.origin_id)
                .and_then(|n| n.outputs.get(link.origin_slot))
            else {
                continue;
            };
            if !keep(&socket.name) {
                continue;
            }
            if let (Some(&from), Some(&to)) = (
                id_to_index.get(&link.origin_id),
                id_to_index.get(&link.target_id),
            ) {
                graph.add_edge(from, to, socket.name.clone());
            }
        }

        (graph, id_to_index)
    }

    fn unlink(&mut self, link_id: LinkId) {
        let Some(pos) = self.links.iter().position(|l| l.id == link_id) else {
            return;
        };
        let link = self.links.remove(pos);

        if let Some(output) = self
            .node_mut(link.origin_id)
            .and_then(|n| n.outputs.get_mut(link.origin_slot))
        {
            output.links.retain(|&l| l != link_id);
        }
        if let Some(input) = self
            .node_mut(link.target_id)
            .and_then(|n| n.inputs.get_mut(link.target_slot))
        {
            if input.link == Some(link_id) {
                input.link = None;
            }
        }
    }
}

fn label_input(inputs: &mut [InputSocket], widget: &str, label: Option<&String>) {
    if let Some(input) = inputs
        .iter_mut()
        .find(|i| i.widget.as_deref() == Some(widget))
    {
        input.label = label.cloned();
    }
}

impl HostGraph for StyleGraph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    fn output_nodes(&self, id: NodeId, slot: Option<&str>) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        for output in &node.outputs {
            if slot.is_some_and(|name| name != output.name) {
                continue;
            }
            for link_id in &output.links {
                let Some(link) = self.link(*link_id) else {
                    continue;
                };
                if self.contains(link.target_id) {
                    result.push(link.target_id);
                }
            }
        }
        result
    }

    fn input_origin(&self, id: NodeId, slot: Option<&str>) -> Option<NodeId> {
        let node = self.node(id)?;
        let input = match slot {
            Some(name) => node.inputs.iter().find(|i| i.name == name)?,
            None => node.inputs.first()?,
        };
        input
            .link
            .and_then(|link_id| self.link(link_id))
            .map(|link| link.origin_id)
    }

    /// Each group is a strongly connected component with more than one
    /// node, or a single node linked to itself, sorted by ID.
    fn chain_cycles(&self, output: &str) -> Vec<Vec<NodeId>> {
        let (graph, _) = self.project(|socket| socket == output);

        petgraph::algo::tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| graph.find_edge(idx, idx).is_some())
            })
            .map(|component| {
                let mut ids: Vec<NodeId> = component.iter().map(|&idx| graph[idx]).collect();
                ids.sort();
                ids
            })
            .collect()
    }

    fn rename_widget(&mut self, id: NodeId, widget: &str, label: Option<&str>) -> GraphResult<()> {
        let label = label.filter(|l| !l.is_empty()).map(str::to_string);

        let proxy = self
            .node(id)
            .ok_or(GraphError::NodeNotFound { node_id: id })?
            .widget(widget)
            .ok_or_else(|| GraphError::WidgetNotFound {
                node_id: id,
                widget: widget.to_string(),
            })?
            .proxy
            .clone();

        // proxy widgets rename the interior widget first
        if let Some(proxy) = proxy {
            let subgraph = self
                .subgraph_mut(proxy.subgraph)
                .ok_or(GraphError::SubgraphNotFound {
                    subgraph_id: proxy.subgraph,
                })?;
            let interior = subgraph
                .node_mut(proxy.node)
                .ok_or_else(|| GraphError::ProxyTargetNotFound {
                    node_id: proxy.node,
                    widget: proxy.widget.clone(),
                })?;
            let original = interior
                .widget_mut(&proxy.widget)
                .ok_or_else(|| GraphError::ProxyTargetNotFound {
                    node_id: proxy.node,
                    widget: proxy.widget.clone(),
                })?;
            original.label = label.clone();
            label_input(&mut interior.inputs, &proxy.widget, label.as_ref());
        }

        let node = self
            .node_mut(id)
            .ok_or(GraphError::NodeNotFound { node_id: id })?;
        if let Some(w) = node.widget_mut(widget) {
            w.label = label.clone();
        }
        label_input(&mut node.inputs, widget, label.as_ref());
        Ok(())
    }
}
