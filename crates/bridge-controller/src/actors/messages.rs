//! Message types for the controller actor.
//!
//! Requests use `tokio::sync::oneshot` for request-reply semantics.

use crate::admission::AdmissionOutcome;
use crate::engine::{BridgeId, Channel};
use crate::errors::BcError;
use tokio::sync::oneshot;

/// Messages sent to `BridgeControllerActor`.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Place an inbound channel into the mixing bridge, creating it if needed.
    AdmitChannel {
        channel: Channel,
        /// Response channel for the admission outcome.
        respond_to: oneshot::Sender<Result<AdmissionOutcome, BcError>>,
    },

    /// Get current controller status.
    GetStatus {
        respond_to: oneshot::Sender<ControllerStatus>,
    },

    /// Stop accepting admissions and release engine subscriptions.
    Shutdown {
        /// Response channel for confirmation.
        respond_to: oneshot::Sender<Result<(), BcError>>,
    },
}

/// Lifecycle of the mixing bridge as seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BridgeState {
    /// No managed mixing bridge.
    #[default]
    Absent,
    /// A create request is in flight.
    Creating,
    /// A managed bridge exists with the given membership (last reported).
    Active { bridge_id: BridgeId, members: usize },
    /// A destroy request is in flight.
    Destroying { bridge_id: BridgeId },
}

impl BridgeState {
    /// Label for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Absent => "absent",
            BridgeState::Creating => "creating",
            BridgeState::Active { .. } => "active",
            BridgeState::Destroying { .. } => "destroying",
        }
    }

    /// Bridge id, when one is known.
    #[must_use]
    pub fn bridge_id(&self) -> Option<&BridgeId> {
        match self {
            BridgeState::Active { bridge_id, .. } | BridgeState::Destroying { bridge_id } => {
                Some(bridge_id)
            }
            BridgeState::Absent | BridgeState::Creating => None,
        }
    }
}

/// Controller status (for health checks and tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Current lifecycle state.
    pub state: BridgeState,
    /// Bridges with live subscriptions.
    pub managed_bridges: usize,
    /// Whether the controller is draining.
    pub is_draining: bool,
    /// Current mailbox depth.
    pub mailbox_depth: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_state_labels() {
        assert_eq!(BridgeState::default(), BridgeState::Absent);
        assert_eq!(BridgeState::Creating.as_str(), "creating");

        let active = BridgeState::Active {
            bridge_id: BridgeId::new("bridge-1"),
            members: 2,
        };
        assert_eq!(active.as_str(), "active");
        assert_eq!(active.bridge_id(), Some(&BridgeId::new("bridge-1")));

        let destroying = BridgeState::Destroying {
            bridge_id: BridgeId::new("bridge-1"),
        };
        assert_eq!(destroying.as_str(), "destroying");
        assert!(BridgeState::Absent.bridge_id().is_none());
    }
}
