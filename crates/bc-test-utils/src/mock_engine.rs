//! In-memory call-control engine.
//!
//! Keeps a bridge list, records every request in order and pushes
//! `ChannelEnteredBridge` / `ChannelLeftBridge` events into the sinks
//! registered through `subscribe`. Failures can be switched on per request
//! kind at any point in a test.
//!
//! # Example
//!
//! ```rust,ignore
//! use bc_test_utils::{EngineCall, Failure, MockEngine};
//!
//! let engine = MockEngine::new();
//! engine.fail(Failure::DestroyBridge);
//!
//! // ... drive the controller ...
//!
//! engine.hangup("chan-a");
//! assert_eq!(engine.count(|call| matches!(call, EngineCall::DestroyBridge(_))), 1);
//! ```

use async_trait::async_trait;
use bridge_controller::engine::{
    Bridge, BridgeEvent, BridgeEventKind, BridgeId, BridgeType, CallControlEngine, Channel,
    ChannelId, EngineError, EventSink, MediaRef, PlaybackHandle, SubscriptionId,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// One request received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    ListBridges,
    CreateBridge(BridgeType),
    DestroyBridge(BridgeId),
    AddChannel {
        bridge_id: BridgeId,
        channel_id: ChannelId,
    },
    StartMoh(BridgeId),
    StopMoh(BridgeId),
    PlayMedia {
        bridge_id: BridgeId,
        media: MediaRef,
        playback: PlaybackHandle,
    },
    Subscribe {
        bridge_id: BridgeId,
        kind: BridgeEventKind,
    },
    Unsubscribe(SubscriptionId),
}

/// Compact form for sequence assertions; playback handles and subscription
/// ids are left out since they are random.
impl fmt::Display for EngineCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCall::ListBridges => write!(f, "list"),
            EngineCall::CreateBridge(bridge_type) => write!(f, "create {}", bridge_type.as_str()),
            EngineCall::DestroyBridge(bridge_id) => write!(f, "destroy {bridge_id}"),
            EngineCall::AddChannel {
                bridge_id,
                channel_id,
            } => write!(f, "add {channel_id} to {bridge_id}"),
            EngineCall::StartMoh(bridge_id) => write!(f, "start_moh {bridge_id}"),
            EngineCall::StopMoh(bridge_id) => write!(f, "stop_moh {bridge_id}"),
            EngineCall::PlayMedia {
                bridge_id, media, ..
            } => write!(f, "play {media} on {bridge_id}"),
            EngineCall::Subscribe { bridge_id, kind } => {
                write!(f, "subscribe {} on {bridge_id}", kind.as_str())
            }
            EngineCall::Unsubscribe(_) => write!(f, "unsubscribe"),
        }
    }
}

/// Request kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    ListBridges,
    CreateBridge,
    DestroyBridge,
    AddChannel,
    PlayMedia,
    Subscribe,
    /// Both `start_moh` and `stop_moh`.
    Moh,
}

struct Subscription {
    id: SubscriptionId,
    bridge_id: BridgeId,
    kind: BridgeEventKind,
    sink: EventSink,
}

#[derive(Default)]
struct Inner {
    bridges: Vec<Bridge>,
    next_bridge: usize,
    subscriptions: Vec<Subscription>,
    calls: Vec<EngineCall>,
    failures: HashSet<Failure>,
    broadcast_events: bool,
    held_events: Option<Vec<BridgeEvent>>,
}

impl Inner {
    fn check(&self, failure: Failure) -> Result<(), EngineError> {
        if self.failures.contains(&failure) {
            Err(EngineError::Rejected(format!("mock failure: {failure:?}")))
        } else {
            Ok(())
        }
    }

    fn bridge_mut(&mut self, bridge_id: &BridgeId) -> Option<&mut Bridge> {
        self.bridges.iter_mut().find(|bridge| &bridge.id == bridge_id)
    }

    /// Sinks that should see `event`, or `None` if events are held.
    fn route(&mut self, event: &BridgeEvent) -> Option<Vec<EventSink>> {
        if let Some(held) = self.held_events.as_mut() {
            held.push(event.clone());
            return None;
        }

        let broadcast = self.broadcast_events;
        Some(
            self.subscriptions
                .iter()
                .filter(|sub| sub.kind == event.kind)
                .filter(|sub| broadcast || sub.bridge_id == event.bridge.id)
                .map(|sub| sub.sink.clone())
                .collect(),
        )
    }
}

/// In-memory call-control engine.
pub struct MockEngine {
    inner: Mutex<Inner>,
    create_gate: watch::Sender<bool>,
}

impl Default for MockEngine {
    fn default() -> Self {
        let (create_gate, _) = watch::channel(true);
        Self {
            inner: Mutex::new(Inner::default()),
            create_gate,
        }
    }
}

impl MockEngine {
    /// Create an engine with no bridges.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver every event to every subscriber of its kind, whatever bridge
    /// the subscription was made for.
    pub fn broadcast_events(&self) {
        self.lock().broadcast_events = true;
    }

    /// Add a bridge that exists before the controller starts.
    pub fn seed_bridge(&self, bridge: Bridge) {
        self.lock().bridges.push(bridge);
    }

    /// Make requests of the given kind fail.
    pub fn fail(&self, failure: Failure) {
        self.lock().failures.insert(failure);
    }

    /// Make requests of the given kind succeed again.
    pub fn succeed(&self, failure: Failure) {
        self.lock().failures.remove(&failure);
    }

    /// Park `create_bridge` requests until `release_creates` is called.
    pub fn hold_creates(&self) {
        self.create_gate.send_replace(false);
    }

    pub fn release_creates(&self) {
        self.create_gate.send_replace(true);
    }

    /// Queue events instead of delivering them.
    pub fn hold_events(&self) {
        let mut inner = self.lock();
        if inner.held_events.is_none() {
            inner.held_events = Some(Vec::new());
        }
    }

    /// Deliver queued events in order and resume normal delivery.
    pub fn release_events(&self) {
        let held = self.lock().held_events.take().unwrap_or_default();
        for event in held {
            self.emit(event);
        }
    }

    /// Remove a channel from whichever bridge holds it and emit
    /// `ChannelLeftBridge`. Returns false if no bridge held it.
    pub fn hangup(&self, channel_id: &str) -> bool {
        let channel_id = ChannelId::new(channel_id);
        let snapshot = {
            let mut inner = self.lock();
            let Some(bridge) = inner
                .bridges
                .iter_mut()
                .find(|bridge| bridge.contains(&channel_id))
            else {
                return false;
            };
            bridge.channels.retain(|id| id != &channel_id);
            bridge.clone()
        };

        self.emit(BridgeEvent {
            kind: BridgeEventKind::ChannelLeftBridge,
            bridge: snapshot,
            channel: Channel {
                id: channel_id,
            },
        });
        true
    }

    /// Deliver an arbitrary event as if the engine raised it.
    pub fn inject_event(&self, event: BridgeEvent) {
        self.emit(event);
    }

    /// Every request received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    /// Every request so far in display form.
    pub fn call_log(&self) -> Vec<String> {
        self.lock().calls.iter().map(ToString::to_string).collect()
    }

    /// Number of requests matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Forget recorded requests.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Media played, in order.
    pub fn played_media(&self) -> Vec<MediaRef> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::PlayMedia { media, .. } => Some(media.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current bridges.
    pub fn bridges(&self) -> Vec<Bridge> {
        self.lock().bridges.clone()
    }

    /// Current snapshot of one bridge.
    pub fn bridge(&self, bridge_id: &BridgeId) -> Option<Bridge> {
        self.lock()
            .bridges
            .iter()
            .find(|bridge| &bridge.id == bridge_id)
            .cloned()
    }

    /// Subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscriptions.len()
    }

    fn emit(&self, event: BridgeEvent) {
        let Some(sinks) = self.lock().route(&event) else {
            return;
        };
        for sink in sinks {
            // Only fails once the controller is gone
            let _ = sink.deliver(event.clone());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl CallControlEngine for MockEngine {
    async fn list_bridges(&self) -> Result<Vec<Bridge>, EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::ListBridges);
        inner.check(Failure::ListBridges)?;
        Ok(inner.bridges.clone())
    }

    async fn create_bridge(&self, bridge_type: BridgeType) -> Result<Bridge, EngineError> {
        self.lock().calls.push(EngineCall::CreateBridge(bridge_type));

        let mut gate = self.create_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut inner = self.lock();
        inner.check(Failure::CreateBridge)?;
        inner.next_bridge += 1;
        let bridge = Bridge::new(format!("bridge-{}", inner.next_bridge), bridge_type);
        inner.bridges.push(bridge.clone());
        Ok(bridge)
    }

    async fn destroy_bridge(&self, bridge_id: &BridgeId) -> Result<(), EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::DestroyBridge(bridge_id.clone()));
        inner.check(Failure::DestroyBridge)?;

        let before = inner.bridges.len();
        inner.bridges.retain(|bridge| &bridge.id != bridge_id);
        if inner.bridges.len() == before {
            return Err(EngineError::NotFound(bridge_id.to_string()));
        }
        Ok(())
    }

    async fn add_channel(
        &self,
        bridge_id: &BridgeId,
        channel_id: &ChannelId,
    ) -> Result<(), EngineError> {
        let snapshot = {
            let mut inner = self.lock();
            inner.calls.push(EngineCall::AddChannel {
                bridge_id: bridge_id.clone(),
                channel_id: channel_id.clone(),
            });
            inner.check(Failure::AddChannel)?;

            let bridge = inner
                .bridge_mut(bridge_id)
                .ok_or_else(|| EngineError::NotFound(bridge_id.to_string()))?;
            if !bridge.contains(channel_id) {
                bridge.channels.push(channel_id.clone());
            }
            bridge.clone()
        };

        self.emit(BridgeEvent {
            kind: BridgeEventKind::ChannelEnteredBridge,
            bridge: snapshot,
            channel: Channel {
                id: channel_id.clone(),
            },
        });
        Ok(())
    }

    async fn start_moh(&self, bridge_id: &BridgeId) -> Result<(), EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::StartMoh(bridge_id.clone()));
        inner.check(Failure::Moh)
    }

    async fn stop_moh(&self, bridge_id: &BridgeId) -> Result<(), EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::StopMoh(bridge_id.clone()));
        inner.check(Failure::Moh)
    }

    async fn play_media(
        &self,
        bridge_id: &BridgeId,
        media: &MediaRef,
        playback: PlaybackHandle,
    ) -> Result<PlaybackHandle, EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::PlayMedia {
            bridge_id: bridge_id.clone(),
            media: media.clone(),
            playback,
        });
        inner.check(Failure::PlayMedia)?;
        Ok(playback)
    }

    async fn subscribe(
        &self,
        bridge_id: &BridgeId,
        kind: BridgeEventKind,
        sink: EventSink,
    ) -> Result<SubscriptionId, EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::Subscribe {
            bridge_id: bridge_id.clone(),
            kind,
        });
        inner.check(Failure::Subscribe)?;

        let id = SubscriptionId::new();
        inner.subscriptions.push(Subscription {
            id,
            bridge_id: bridge_id.clone(),
            kind,
            sink,
        });
        Ok(id)
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), EngineError> {
        let mut inner = self.lock();
        inner.calls.push(EngineCall::Unsubscribe(subscription));

        let before = inner.subscriptions.len();
        inner.subscriptions.retain(|sub| sub.id != subscription);
        if inner.subscriptions.len() == before {
            return Err(EngineError::NotFound(subscription.to_string()));
        }
        Ok(())
    }
}
