//! Call-control engine interface.
//!
//! The engine owns bridges, channels and media; the controller only issues
//! requests and consumes the `ChannelEnteredBridge` / `ChannelLeftBridge`
//! notifications it subscribed to. Bridge snapshots carried by events are the
//! source of truth for membership.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Prefix for media references resolved by the engine's sound store.
pub const SOUND_MEDIA_PREFIX: &str = "sound:";

/// Engine-assigned bridge identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeId(String);

impl BridgeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Engine-assigned channel (call leg) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bridge type as reported by the engine.
///
/// Only `Mixing` bridges are created or reused by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeType {
    Mixing,
    Holding,
    #[serde(other)]
    Other,
}

impl BridgeType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeType::Mixing => "mixing",
            BridgeType::Holding => "holding",
            BridgeType::Other => "other",
        }
    }
}

/// Snapshot of a bridge as known by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub id: BridgeId,
    pub bridge_type: BridgeType,
    /// Channels currently in the bridge, in join order.
    #[serde(default)]
    pub channels: Vec<ChannelId>,
}

impl Bridge {
    /// Create an empty bridge snapshot.
    #[must_use]
    pub fn new(id: impl Into<String>, bridge_type: BridgeType) -> Self {
        Self {
            id: BridgeId::new(id),
            bridge_type,
            channels: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_mixing(&self) -> bool {
        self.bridge_type == BridgeType::Mixing
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn contains(&self, channel_id: &ChannelId) -> bool {
        self.channels.contains(channel_id)
    }
}

/// One call leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
}

impl Channel {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ChannelId::new(id),
        }
    }
}

/// Opaque media reference understood by the engine (`sound:<name>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    /// Reference a sound by its configured name.
    #[must_use]
    pub fn sound(name: &str) -> Self {
        Self(format!("{SOUND_MEDIA_PREFIX}{name}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token for a single play request. A fresh handle is created for every play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackHandle(Uuid);

impl PlaybackHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaybackHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback-{}", self.0)
    }
}

/// Identifier of one event subscription held with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Bridge notification kinds the controller subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeEventKind {
    ChannelEnteredBridge,
    ChannelLeftBridge,
}

impl BridgeEventKind {
    /// Both kinds, in subscription order.
    pub const ALL: [BridgeEventKind; 2] = [
        BridgeEventKind::ChannelEnteredBridge,
        BridgeEventKind::ChannelLeftBridge,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeEventKind::ChannelEnteredBridge => "ChannelEnteredBridge",
            BridgeEventKind::ChannelLeftBridge => "ChannelLeftBridge",
        }
    }
}

/// A bridge notification with the bridge snapshot taken when it fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeEvent {
    pub kind: BridgeEventKind,
    pub bridge: Bridge,
    pub channel: Channel,
}

/// Errors reported by the call-control engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Bridge, channel or subscription does not exist.
    #[error("Engine resource not found: {0}")]
    NotFound(String),

    /// Engine refused the request.
    #[error("Engine rejected request: {0}")]
    Rejected(String),

    /// Engine could not be reached.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

/// Event delivery failures seen by the engine side of an [`EventSink`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EventDeliveryError {
    #[error("event receiver closed")]
    Closed,
}

/// Where the engine pushes events for a subscription.
///
/// The buffer is unbounded: delivery never blocks the engine and never loses
/// an event while the controller is running. Membership changes drive bridge
/// teardown, so every one of them has to arrive.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<BridgeEvent>,
}

impl EventSink {
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        Self { sender }
    }

    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns `Closed` when the controller is gone; the event is discarded.
    pub fn deliver(&self, event: BridgeEvent) -> Result<(), EventDeliveryError> {
        self.sender
            .send(event)
            .map_err(|_| EventDeliveryError::Closed)
    }
}

/// Call-control engine operations consumed by the controller.
#[async_trait]
pub trait CallControlEngine: Send + Sync {
    /// List all bridges currently known to the engine.
    async fn list_bridges(&self) -> Result<Vec<Bridge>, EngineError>;

    /// Create a bridge of the given type.
    async fn create_bridge(&self, bridge_type: BridgeType) -> Result<Bridge, EngineError>;

    /// Destroy a bridge.
    async fn destroy_bridge(&self, bridge_id: &BridgeId) -> Result<(), EngineError>;

    /// Add a channel to a bridge.
    async fn add_channel(
        &self,
        bridge_id: &BridgeId,
        channel_id: &ChannelId,
    ) -> Result<(), EngineError>;

    /// Start music-on-hold on a bridge.
    async fn start_moh(&self, bridge_id: &BridgeId) -> Result<(), EngineError>;

    /// Stop music-on-hold on a bridge.
    async fn stop_moh(&self, bridge_id: &BridgeId) -> Result<(), EngineError>;

    /// Play media on a bridge using the given playback handle.
    async fn play_media(
        &self,
        bridge_id: &BridgeId,
        media: &MediaRef,
        playback: PlaybackHandle,
    ) -> Result<PlaybackHandle, EngineError>;

    /// Register for one kind of bridge event on a bridge.
    async fn subscribe(
        &self,
        bridge_id: &BridgeId,
        kind: BridgeEventKind,
        sink: EventSink,
    ) -> Result<SubscriptionId, EngineError>;

    /// Release a subscription.
    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), EngineError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn event(bridge: Bridge) -> BridgeEvent {
        BridgeEvent {
            kind: BridgeEventKind::ChannelEnteredBridge,
            bridge,
            channel: Channel::new("chan-1"),
        }
    }

    #[test]
    fn test_media_ref_sound() {
        assert_eq!(MediaRef::sound("welcome").as_str(), "sound:welcome");
        assert_eq!(MediaRef::sound("bye").to_string(), "sound:bye");
    }

    #[test]
    fn test_playback_handles_are_unique() {
        let first = PlaybackHandle::new();
        let second = PlaybackHandle::new();
        assert_ne!(first, second);
        assert!(first.to_string().starts_with("playback-"));
    }

    #[test]
    fn test_bridge_membership() {
        let mut bridge = Bridge::new("bridge-1", BridgeType::Mixing);
        assert!(bridge.is_mixing());
        assert_eq!(bridge.member_count(), 0);

        bridge.channels.push(ChannelId::new("chan-1"));
        assert!(bridge.contains(&ChannelId::new("chan-1")));
        assert!(!bridge.contains(&ChannelId::new("chan-2")));
        assert_eq!(bridge.member_count(), 1);
    }

    #[test]
    fn test_bridge_type_deserializes_unknown_as_other() {
        let bridge: Bridge = serde_json::from_str(
            r#"{"id":"b-1","bridge_type":"video_sfu","channels":["c-1"]}"#,
        )
        .unwrap();
        assert_eq!(bridge.bridge_type, BridgeType::Other);
        assert_eq!(bridge.channels, vec![ChannelId::new("c-1")]);

        let bridge: Bridge = serde_json::from_str(r#"{"id":"b-2","bridge_type":"mixing"}"#).unwrap();
        assert!(bridge.is_mixing());
        assert!(bridge.channels.is_empty());
    }

    #[test]
    fn test_event_kind_labels() {
        assert_eq!(
            BridgeEventKind::ChannelEnteredBridge.as_str(),
            "ChannelEnteredBridge"
        );
        assert_eq!(
            BridgeEventKind::ChannelLeftBridge.as_str(),
            "ChannelLeftBridge"
        );
        assert_eq!(BridgeEventKind::ALL.len(), 2);
    }

    #[tokio::test]
    async fn test_event_sink_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);

        let sent = event(Bridge::new("bridge-1", BridgeType::Mixing));
        sink.deliver(sent.clone()).unwrap();

        assert_eq!(rx.recv().await.unwrap(), sent);
    }

    #[tokio::test]
    async fn test_event_sink_keeps_bursts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);

        for _ in 0..5000 {
            sink.deliver(event(Bridge::new("bridge-1", BridgeType::Mixing)))
                .unwrap();
        }

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 5000);
    }

    #[tokio::test]
    async fn test_event_sink_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = EventSink::new(tx);

        let result = sink.deliver(event(Bridge::new("bridge-1", BridgeType::Mixing)));
        assert_eq!(result, Err(EventDeliveryError::Closed));
    }
}
