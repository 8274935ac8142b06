//! Bridge Controller error types.
//!
//! None of these errors terminate the process. Callers of the controller
//! receive them so the call-routing front end can decide what to do with an
//! unbridged channel; everything else is logged and degraded.

use crate::engine::EngineError;
use thiserror::Error;

/// Bridge Controller error type.
#[derive(Debug, Error)]
pub enum BcError {
    /// Listing bridges on the engine failed.
    #[error("Bridge lookup failed: {0}")]
    BridgeLookup(EngineError),

    /// The engine refused or failed to create the mixing bridge.
    #[error("Bridge creation failed: {0}")]
    BridgeCreation(EngineError),

    /// Registering for bridge events failed.
    #[error("Bridge subscription failed: {0}")]
    Subscription(EngineError),

    /// Adding the channel to the bridge failed; the channel is unbridged.
    #[error("Channel admission failed: {0}")]
    Admission(EngineError),

    /// The controller is shutting down and no longer admits channels.
    #[error("Bridge controller is draining")]
    Draining,

    /// Internal error (actor mailbox closed, response dropped).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BcError {
    /// Returns a bounded label for logs and metrics.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            BcError::BridgeLookup(_) => "bridge_lookup",
            BcError::BridgeCreation(_) => "bridge_creation",
            BcError::Subscription(_) => "subscription",
            BcError::Admission(_) => "admission",
            BcError::Draining => "draining",
            BcError::Internal(_) => "internal",
        }
    }

    /// Whether the failure left the channel outside any bridge.
    #[must_use]
    pub const fn channel_unbridged(&self) -> bool {
        !matches!(self, BcError::Internal(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_labels() {
        assert_eq!(
            BcError::BridgeLookup(EngineError::Unavailable("down".to_string())).error_type(),
            "bridge_lookup"
        );
        assert_eq!(
            BcError::BridgeCreation(EngineError::Rejected("no".to_string())).error_type(),
            "bridge_creation"
        );
        assert_eq!(
            BcError::Subscription(EngineError::Unavailable("down".to_string())).error_type(),
            "subscription"
        );
        assert_eq!(
            BcError::Admission(EngineError::NotFound("chan".to_string())).error_type(),
            "admission"
        );
        assert_eq!(BcError::Draining.error_type(), "draining");
        assert_eq!(
            BcError::Internal("closed".to_string()).error_type(),
            "internal"
        );
    }

    #[test]
    fn test_channel_unbridged() {
        assert!(BcError::Draining.channel_unbridged());
        assert!(BcError::Admission(EngineError::Rejected("busy".to_string())).channel_unbridged());
        assert!(!BcError::Internal("closed".to_string()).channel_unbridged());
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!(
                "{}",
                BcError::BridgeCreation(EngineError::Rejected("quota".to_string()))
            ),
            "Bridge creation failed: Engine rejected request: quota"
        );
        assert_eq!(
            format!("{}", BcError::Draining),
            "Bridge controller is draining"
        );
    }
}
