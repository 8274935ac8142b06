//! Actor model implementation for the Bridge Controller.
//!
//! ```text
//! BridgeControllerActor (singleton per front end)
//! ├── mailbox: admissions, status queries, shutdown
//! ├── event buffer: ChannelEnteredBridge / ChannelLeftBridge from the engine
//! └── SubscriptionRegistry (one entry per managed bridge)
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single serialization point**: lookup-or-create runs inside the actor, so
//!   concurrent admissions never create a second mixing bridge
//! - **Snapshot membership**: member counts come from the bridge snapshot in
//!   each event; the actor keeps no counter of its own
//! - **Explicit cleanup**: subscriptions are released when their bridge is
//!   retired and when the actor exits
//! - **CancellationToken propagation**: `shutdown()` cancels the actor
//!
//! # Modules
//!
//! - [`controller`] - `BridgeControllerActor` and its handle
//! - [`messages`] - Message and state types
//! - [`metrics`] - Mailbox monitoring and actor metrics
//! - [`subscriptions`] - Per-bridge subscription registry

pub mod controller;
pub mod messages;
pub mod metrics;
pub mod subscriptions;

// Re-export primary types
pub use controller::{BridgeControllerActor, BridgeControllerHandle};
pub use messages::*;
pub use metrics::{ActorMetrics, MailboxLevel, MailboxMonitor};
pub use subscriptions::{BridgeSubscription, SubscriptionRegistry};
