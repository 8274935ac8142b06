//! # BC Test Utilities
//!
//! Shared test utilities for the Bridge Controller (BC).
//!
//! This crate provides mock collaborators and fixtures for testing the
//! controller without a telephony engine or configuration store.
//!
//! ## Modules
//!
//! - `mock_engine` - In-memory call-control engine that records every request
//! - `mock_settings` - Settings store returning fixed settings or failing
//! - `fixtures` - Settings presets, test config, polling helper
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let engine = MockEngine::new();
//!     let ctl = spawn_controller(&engine, chatty_settings());
//!
//!     ctl.handle.admit_channel(channel("chan-a")).await.unwrap();
//!     ctl.settle().await; // let queued events settle
//!
//!     assert_eq!(engine.count(|call| matches!(call, EngineCall::CreateBridge(_))), 1);
//! }
//! ```
//!
//! ## Event Ordering
//!
//! The mock delivers events synchronously from inside the request that
//! caused them (`add_channel`, `hangup`). The controller drains events before
//! mailbox messages, so a `get_status()` round trip after an admission
//! guarantees every event produced so far has been handled.

pub mod fixtures;
pub mod mock_engine;
pub mod mock_settings;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_engine::*;
pub use mock_settings::*;
