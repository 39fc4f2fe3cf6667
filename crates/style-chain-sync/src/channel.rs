//! Exclusivity channels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Grouping value scoping cross-node exclusivity.
///
/// Only controllers sharing a channel must avoid simultaneous selection.
/// Channels are 1-based and displayed as `custom_N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Channel(u8);

impl Channel {
    /// Channel used when a node has no channel widget.
    pub const FIRST: Channel = Channel(1);

    /// Prefix of the textual channel form.
    pub const PREFIX: &'static str = "custom_";

    /// Create a channel, checking it against the channel count.
    pub fn new(number: u8, channel_count: u8) -> SyncResult<Self> {
        if number == 0 || number > channel_count {
            return Err(SyncError::InvalidChannel {
                value: number.to_string(),
            });
        }
        Ok(Self(number))
    }

    /// Parse `custom_N` (or a bare `N`).
    pub fn parse(value: &str, channel_count: u8) -> SyncResult<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix(Self::PREFIX).unwrap_or(trimmed);
        let number: u8 = digits.parse().map_err(|_| SyncError::InvalidChannel {
            value: value.to_string(),
        })?;
        Self::new(number, channel_count).map_err(|_| SyncError::InvalidChannel {
            value: value.to_string(),
        })
    }

    /// The 1-based channel number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// All valid channel names for a channel count.
    pub fn names(channel_count: u8) -> Vec<String> {
        (1..=channel_count)
            .map(|n| format!("{}{n}", Self::PREFIX))
            .collect()
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}
