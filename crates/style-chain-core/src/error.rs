//! Error types for host graph operations.

use thiserror::Error;

use crate::{LinkId, NodeId, SubgraphId};

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while querying or mutating the host graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node referenced by ID was not found in the graph.
    #[error("node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    /// A node with the same ID already exists.
    #[error("duplicate node id: {node_id}")]
    DuplicateNode { node_id: NodeId },

    /// A socket referenced by name was not found on a node.
    #[error("socket '{socket}' not found on node {node_id}")]
    SocketNotFound { node_id: NodeId, socket: String },

    /// A widget referenced by name was not found on a node.
    #[error("widget '{widget}' not found on node {node_id}")]
    WidgetNotFound { node_id: NodeId, widget: String },

    /// A link referenced by ID was not found.
    #[error("link not found: {link_id:?}")]
    LinkNotFound { link_id: LinkId },

    /// A proxy widget points into a subgraph that does not exist.
    #[error("subgraph not found for proxy widget: {subgraph_id:?}")]
    SubgraphNotFound { subgraph_id: SubgraphId },

    /// A proxy widget points at an interior node or widget that does not exist.
    #[error("proxy target not found: node {node_id}, widget '{widget}'")]
    ProxyTargetNotFound { node_id: NodeId, widget: String },

    /// Snapshot serialization/deserialization error.
    #[error("graph serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
