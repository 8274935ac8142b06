//! Bridge Controller (BC) Library
//!
//! This library provides the mixing-bridge lifecycle for the Dark Tower
//! call-control front end:
//!
//! - Locating a reusable mixing bridge or creating one when none exists
//! - Admitting inbound call legs (channels) into the bridge
//! - Join/leave announcements and music-on-hold for a lone caller
//! - Destroying the bridge when the last channel leaves
//!
//! # Architecture
//!
//! ```text
//! BridgeControllerActor (singleton per front end)
//! ├── serializes admissions and bridge events through one mailbox
//! ├── SubscriptionRegistry (one entry per managed bridge)
//! │   └── ChannelEntered / ChannelLeft subscriptions, pending admissions
//! └── ChannelAdmission (add channel + join announcement)
//! ```
//!
//! The telephony engine and the configuration store are external
//! collaborators reached through the [`engine::CallControlEngine`] and
//! [`settings::SettingsStore`] traits.
//!
//! # Modules
//!
//! - [`actors`] - Controller actor, messages, subscription registry
//! - [`admission`] - Channel admission and announcements
//! - [`config`] - Service configuration from environment
//! - [`engine`] - Call-control engine interface and bridge types
//! - [`errors`] - Error types
//! - [`locator`] - Mixing bridge lookup
//! - [`observability`] - Metrics and log setup
//! - [`settings`] - Bridge settings cache

pub mod actors;
pub mod admission;
pub mod config;
pub mod engine;
pub mod errors;
pub mod locator;
pub mod observability;
pub mod settings;
