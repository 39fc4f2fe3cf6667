//! Top-styles broadcast.
//!
//! A producer pushes an ordered list of style names to every controller
//! connected to its top-styles output. Push only: no acknowledgment, no
//! retry, and the last list a consumer receives wins.

use serde::{Deserialize, Serialize};
use style_chain_core::{HostGraph, NodeId};
use tracing::debug;

use crate::config::SyncConfig;
use crate::controller::{Effects, NodeController};
use crate::names::{LabelFormat, NameRule};
use crate::registry::ControllerRegistry;

/// Ordered style names; rank is position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopStylesList {
    names: Vec<String>,
}

impl TopStylesList {
    /// Create a list from names in rank order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Names in rank order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name at rank position `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the list holds no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label for slot `index`: the formatted name when it passes `rule`,
    /// otherwise `placeholder`.
    pub fn slot_label(
        &self,
        index: usize,
        rule: NameRule,
        format: LabelFormat,
        placeholder: &str,
    ) -> String {
        match self.get(index) {
            Some(name) if rule.accepts(name) => format.label(index, name),
            _ => placeholder.to_string(),
        }
    }
}

/// Push `list` from `producer` to every controller on its top-styles output.
///
/// Returns the consumers that accepted the list, in connection order.
/// Connected nodes without a consumer controller are skipped.
pub fn publish_top_styles(
    registry: &mut ControllerRegistry,
    graph: &mut dyn HostGraph,
    config: &SyncConfig,
    producer: NodeId,
    list: &TopStylesList,
    fx: &mut Effects,
) -> Vec<NodeId> {
    let targets = graph.output_nodes(producer, Some(&config.top_styles_output));

    let mut reached = Vec::new();
    for target in targets {
        let Some(consumer) = registry.get_mut(target) else {
            continue;
        };
        if consumer.receive_top_styles(graph, config, list, fx) {
            reached.push(target);
        }
    }

    debug!(
        producer = producer.0,
        names = list.len(),
        consumers = reached.len(),
        "top_styles_published"
    );
    reached
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_labels() {
        let list = TopStylesList::new(["Alpha", "none", "  ", "Beta"]);
        let label = |i| list.slot_label(i, NameRule::Standard, LabelFormat::Ranked, "-");

        assert_eq!(label(0), "1 - Alpha");
        assert_eq!(label(1), "-");
        assert_eq!(label(2), "-");
        assert_eq!(label(3), "4 - Beta");
        assert_eq!(label(4), "-");
    }

    #[test]
    fn test_quoted_slot_labels() {
        let list = TopStylesList::new(["\"Anime\"", "Anime"]);
        assert_eq!(
            list.slot_label(0, NameRule::Quoted, LabelFormat::Raw, "-"),
            "\"Anime\""
        );
        assert_eq!(list.slot_label(1, NameRule::Quoted, LabelFormat::Raw, "-"), "-");
    }
}
