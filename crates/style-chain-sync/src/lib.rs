//! Polling-based synchronization of style controllers across a mutable node chain.
//!
//! Controllers attach to nodes of a user-editable host graph. Each one owns
//! a small piece of exclusive-choice state (the selected style) and must stay
//! consistent with the controllers it is transitively connected to, even
//! though the topology changes without reliable notifications.
//!
//! ## Core Concepts
//!
//! - **Connection watcher**: polls named input slots once per tick and
//!   reports each actual change of the connected origin node exactly once
//! - **Style selection**: at most one style widget selected per controller,
//!   with a reentrancy guard around the enforcement pass
//! - **Chain router**: walks a message toward the chain head, then delivers
//!   it head-to-tail, exactly once per controller
//! - **Top-styles broadcast**: pushes a ranked list of style names from one
//!   producer to every consumer connected to its output
//!
//! ## Flow
//!
//! ```text
//! poll tick ──> connection change ──> launch:forceNoRepeatChannels ─┐
//! user selects style ──> local exclusivity ──> launch:deselectAllStyles ─┤
//!                                                                      v
//!                                         backward walk ──> forward delivery
//! editor change ──> top-styles list ──> every consumer relabels its slots
//! ```
//!
//! Everything runs on one logical thread. A poll round, and every traversal
//! it triggers, completes before the next callback runs.

mod broadcast;
mod channel;
pub mod config;
mod controller;
mod detector;
mod error;
mod message;
mod names;
mod observer;
mod registry;
mod router;
mod scheduler;
mod selection;
mod sync;

pub use broadcast::{publish_top_styles, TopStylesList};
pub use channel::Channel;
pub use config::{ClassNames, SyncConfig};
pub use controller::{
    CategoryController, Controller, ControllerKind, Delivery, EditorController, Effects,
    NodeController, SelectorController, StylesController,
};
pub use detector::{ConnectionChange, ConnectionWatcher};
pub use error::{SyncError, SyncResult};
pub use message::{ChainMessage, Direction, MessageKind, LAUNCH_PREFIX};
pub use names::{
    is_quoted_style_name, is_valid_style_name, normalize_style_name, LabelFormat, NameRule,
};
pub use observer::{ConnectionEvent, ObserverId, ObserverList, Origin, WidgetEvent};
pub use registry::ControllerRegistry;
pub use router::{ChainRouter, RouteReport};
pub use scheduler::PollScheduler;
pub use selection::{StyleSelection, ToggleOutcome};
pub use sync::{StyleSync, TickReport};

pub use style_chain_core::{HostGraph, NodeId, StyleGraph, WidgetValue};
