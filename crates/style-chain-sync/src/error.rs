//! Error types for the synchronization layer.

use style_chain_core::{GraphError, NodeId};
use thiserror::Error;

/// Result type alias for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while attaching or driving controllers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The node has no widgets carrying the style prefix.
    #[error("node {node_id} has no widgets whose name starts with \"{prefix}\"")]
    MissingStyleWidgets { node_id: NodeId, prefix: String },

    /// The node has none of the widgets a category controller needs.
    #[error("node {node_id} is missing widget '{widget}'")]
    MissingWidget { node_id: NodeId, widget: String },

    /// A category controller was requested without any category data.
    #[error("no styles by category available for node {node_id}")]
    MissingCategoryData { node_id: NodeId },

    /// The node class does not map to any controller kind.
    #[error("node {node_id} of class '{class}' has no controller kind")]
    UnsupportedNode { node_id: NodeId, class: String },

    /// A node referenced by ID was not found in the host graph.
    #[error("node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    /// A node has no controller attached.
    #[error("no controller attached to node {node_id}")]
    ControllerNotFound { node_id: NodeId },

    /// A style slot index is past the controller's widgets.
    #[error("style index {index} out of range for node {node_id}")]
    StyleIndexOutOfRange { node_id: NodeId, index: usize },

    /// A channel value could not be parsed or is out of range.
    #[error("invalid channel: '{value}'")]
    InvalidChannel { value: String },

    /// The configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Host graph error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// I/O error (config files).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
