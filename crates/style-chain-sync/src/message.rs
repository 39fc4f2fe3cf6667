//! Chain messages.
//!
//! A message is created, delivered and discarded within one synchronous
//! traversal. While it travels toward the chain head its type carries the
//! `launch:` marker; the marker is dropped once the head is reached.

use std::collections::BTreeSet;
use std::fmt;

use style_chain_core::NodeId;

use crate::channel::Channel;

/// Directional marker prefixed to the type of head-bound messages.
pub const LAUNCH_PREFIX: &str = "launch:";

/// Direction a message is currently traveling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Still relayed toward the chain head (type carries [`LAUNCH_PREFIX`]).
    TowardHead,
    /// Delivered head-to-tail.
    TowardTail,
}

/// Payload of a chain message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Every other controller on the message channel drops its selection.
    DeselectAllStyles,
    /// Each controller claims its channel in visit order; later claimants
    /// of an already claimed channel drop their selection.
    ForceNoRepeatChannels {
        /// Channels claimed so far in this pass.
        channels: BTreeSet<Channel>,
    },
}

impl MessageKind {
    /// Wire-style name of the message type.
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::DeselectAllStyles => "deselectAllStyles",
            MessageKind::ForceNoRepeatChannels { .. } => "forceNoRepeatChannels",
        }
    }
}

/// A structured message propagated along a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMessage {
    /// Message payload.
    pub kind: MessageKind,
    /// Current travel direction.
    pub direction: Direction,
    /// Node that launched the message.
    pub sender_id: NodeId,
    /// Channel the message is scoped to, if any.
    pub channel: Option<Channel>,
}

impl ChainMessage {
    /// A message that first travels to the chain head.
    pub fn launch(kind: MessageKind, sender_id: NodeId, channel: Option<Channel>) -> Self {
        Self {
            kind,
            direction: Direction::TowardHead,
            sender_id,
            channel,
        }
    }

    /// A message delivered tail-ward starting at the node it is routed from.
    pub fn forward(kind: MessageKind, sender_id: NodeId, channel: Option<Channel>) -> Self {
        Self {
            kind,
            direction: Direction::TowardTail,
            sender_id,
            channel,
        }
    }

    /// `launch:deselectAllStyles` scoped to `channel`.
    pub fn deselect_all_styles(sender_id: NodeId, channel: Channel) -> Self {
        Self::launch(MessageKind::DeselectAllStyles, sender_id, Some(channel))
    }

    /// `launch:forceNoRepeatChannels` with an empty claim set.
    pub fn force_no_repeat_channels(sender_id: NodeId) -> Self {
        Self::launch(
            MessageKind::ForceNoRepeatChannels {
                channels: BTreeSet::new(),
            },
            sender_id,
            None,
        )
    }

    /// True while the message still travels toward the chain head.
    pub fn is_launch(&self) -> bool {
        self.direction == Direction::TowardHead
    }

    /// Drop the directional marker; the message now travels tail-ward.
    pub fn land(&mut self) {
        self.direction = Direction::TowardTail;
    }

    /// Full type string, including the marker while head-bound.
    pub fn type_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChainMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::TowardHead => write!(f, "{LAUNCH_PREFIX}{}", self.kind.name()),
            Direction::TowardTail => write!(f, "{}", self.kind.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_marker() {
        let mut msg = ChainMessage::deselect_all_styles(NodeId(1), Channel::FIRST);
        assert!(msg.is_launch());
        assert_eq!(msg.type_name(), "launch:deselectAllStyles");

        msg.land();
        assert!(!msg.is_launch());
        assert_eq!(msg.type_name(), "deselectAllStyles");
    }

    #[test]
    fn test_force_no_repeat_starts_empty() {
        let msg = ChainMessage::force_no_repeat_channels(NodeId(4));
        assert_eq!(msg.type_name(), "launch:forceNoRepeatChannels");
        assert_eq!(msg.channel, None);
        match msg.kind {
            MessageKind::ForceNoRepeatChannels { channels } => assert!(channels.is_empty()),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
