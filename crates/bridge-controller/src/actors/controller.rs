//! `BridgeControllerActor` - singleton owner of the mixing bridge lifecycle.
//!
//! The actor:
//!
//! - Serializes admissions and bridge events through one task
//! - Locates the mixing bridge, or creates it when none exists
//! - Registers `ChannelEnteredBridge` / `ChannelLeftBridge` subscriptions for
//!   every bridge it manages (created or adopted)
//! - Starts and stops music-on-hold from event membership
//! - Destroys a bridge when the event that empties it arrives
//!
//! # Lifecycle
//!
//! ```text
//! Absent -> Creating -> Active(n) -> Destroying -> Absent
//! ```
//!
//! The current state is published on a `watch` channel so callers can observe
//! a create in flight without going through the mailbox.
//!
//! # Graceful Shutdown
//!
//! On shutdown the controller:
//! 1. Sets `accepting_new = false`
//! 2. Cancels its `CancellationToken`
//! 3. Answers queued admissions with `BcError::Draining`
//! 4. Releases every engine subscription it holds (bridges are left alone)

use crate::admission::{AdmissionOutcome, ChannelAdmission, PlaybackKind};
use crate::config::Config;
use crate::engine::{
    Bridge, BridgeEvent, BridgeEventKind, BridgeId, BridgeType, CallControlEngine, Channel,
    EngineError, EventSink, SubscriptionId,
};
use crate::errors::BcError;
use crate::locator::find_mixing_bridge;
use crate::observability::{
    record_bridge_operation, record_engine_latency, record_event_ignored, set_bridges_active,
};
use crate::settings::SettingsCache;

use super::messages::{BridgeState, ControllerMessage, ControllerStatus};
use super::metrics::{ActorMetrics, MailboxMonitor};
use super::subscriptions::{BridgeSubscription, SubscriptionRegistry};

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Handle to the `BridgeControllerActor`.
///
/// This is the public interface for the call-routing front end.
/// Requests return results via oneshot channels.
#[derive(Clone)]
pub struct BridgeControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
    state: watch::Receiver<BridgeState>,
    mailbox: Arc<MailboxMonitor>,
}

impl BridgeControllerHandle {
    /// Spawn a `BridgeControllerActor` and return a handle to it.
    #[must_use]
    pub fn new(
        config: &Config,
        engine: Arc<dyn CallControlEngine>,
        settings: Arc<SettingsCache>,
        metrics: Arc<ActorMetrics>,
    ) -> Self {
        let (handle, _task) = BridgeControllerActor::spawn(config, engine, settings, metrics);
        handle
    }

    /// Place an inbound channel into the mixing bridge.
    ///
    /// Creates the bridge when none exists. Concurrent callers are served one
    /// at a time, so at most one bridge is ever created.
    ///
    /// # Errors
    ///
    /// Returns an error if the bridge could not be found or created, or the
    /// engine refused the add. The channel is then outside any bridge.
    pub async fn admit_channel(&self, channel: Channel) -> Result<AdmissionOutcome, BcError> {
        if self.cancel_token.is_cancelled() {
            return Err(BcError::Draining);
        }

        let (tx, rx) = oneshot::channel();
        self.send(ControllerMessage::AdmitChannel {
            channel,
            respond_to: tx,
        })
        .await?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Get the current controller status.
    ///
    /// # Errors
    ///
    /// Returns `BcError::Internal` if the actor has exited.
    pub async fn get_status(&self) -> Result<ControllerStatus, BcError> {
        let (tx, rx) = oneshot::channel();
        self.send(ControllerMessage::GetStatus { respond_to: tx })
            .await?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))
    }

    /// Initiate graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns `BcError::Internal` if the actor has already exited.
    pub async fn shutdown(&self) -> Result<(), BcError> {
        let (tx, rx) = oneshot::channel();
        self.send(ControllerMessage::Shutdown { respond_to: tx })
            .await?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Current lifecycle state, without going through the mailbox.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        self.state.borrow().clone()
    }

    /// Receiver for lifecycle state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<BridgeState> {
        self.state.clone()
    }

    /// Current mailbox depth.
    #[must_use]
    pub fn mailbox_depth(&self) -> usize {
        self.mailbox.current_depth()
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn send(&self, message: ControllerMessage) -> Result<(), BcError> {
        self.mailbox.record_enqueue();
        if let Err(e) = self.sender.send(message).await {
            self.mailbox.record_abandoned();
            return Err(BcError::Internal(format!("channel send failed: {e}")));
        }
        Ok(())
    }
}

/// The `BridgeControllerActor` implementation.
///
/// This struct owns the actor state and runs the message loop.
pub struct BridgeControllerActor {
    /// Controller instance ID.
    controller_id: String,
    /// Message receiver.
    receiver: mpsc::Receiver<ControllerMessage>,
    /// Bridge events pushed by the engine.
    events: mpsc::UnboundedReceiver<BridgeEvent>,
    /// Sender side handed to the engine in every `EventSink`.
    event_sender: mpsc::UnboundedSender<BridgeEvent>,
    cancel_token: CancellationToken,
    engine: Arc<dyn CallControlEngine>,
    settings: Arc<SettingsCache>,
    admission: ChannelAdmission,
    /// Managed bridges by ID.
    registry: SubscriptionRegistry,
    state: watch::Sender<BridgeState>,
    /// Whether the controller is accepting admissions.
    accepting_new: bool,
    slow_operation_warning: Duration,
    metrics: Arc<ActorMetrics>,
    mailbox: Arc<MailboxMonitor>,
}

impl BridgeControllerActor {
    /// Spawn the actor and return its handle and task.
    pub fn spawn(
        config: &Config,
        engine: Arc<dyn CallControlEngine>,
        settings: Arc<SettingsCache>,
        metrics: Arc<ActorMetrics>,
    ) -> (BridgeControllerHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.controller_mailbox_capacity);
        let (event_sender, events) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(BridgeState::Absent);
        let cancel_token = CancellationToken::new();
        let mailbox = Arc::new(MailboxMonitor::new(config.controller_id.clone()));

        let actor = Self {
            controller_id: config.controller_id.clone(),
            receiver,
            events,
            event_sender,
            cancel_token: cancel_token.clone(),
            admission: ChannelAdmission::new(Arc::clone(&engine), Arc::clone(&settings)),
            engine,
            settings,
            registry: SubscriptionRegistry::new(),
            state: state_tx,
            accepting_new: true,
            slow_operation_warning: config.slow_operation_warning,
            metrics,
            mailbox: Arc::clone(&mailbox),
        };

        let task = tokio::spawn(actor.run());

        let handle = BridgeControllerHandle {
            sender,
            cancel_token,
            state: state_rx,
            mailbox,
        };

        (handle, task)
    }

    /// Run the actor message loop.
    ///
    /// Bridge events are drained before mailbox messages so an admission
    /// always sees the membership produced by earlier ones.
    #[instrument(skip_all, name = "bc.actor.controller", fields(controller_id = %self.controller_id))]
    async fn run(mut self) {
        info!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            "BridgeControllerActor started"
        );

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "bc.actor.controller",
                        controller_id = %self.controller_id,
                        "BridgeControllerActor received cancellation signal"
                    );
                    self.graceful_shutdown().await;
                    break;
                }

                Some(event) = self.events.recv() => {
                    self.handle_event(event).await;
                    self.metrics.record_event_processed();
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_dequeue();
                            self.handle_message(message).await;
                            self.metrics.record_message_processed();
                        }
                        None => {
                            // Every handle dropped
                            info!(
                                target: "bc.actor.controller",
                                controller_id = %self.controller_id,
                                "BridgeControllerActor channel closed, exiting"
                            );
                            self.graceful_shutdown().await;
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            messages_processed = self.mailbox.messages_processed(),
            "BridgeControllerActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::AdmitChannel {
                channel,
                respond_to,
            } => {
                let result = self.admit_channel(channel).await;
                let _ = respond_to.send(result);
            }

            ControllerMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.get_status());
            }

            ControllerMessage::Shutdown { respond_to } => {
                info!(
                    target: "bc.actor.controller",
                    controller_id = %self.controller_id,
                    managed_bridges = self.registry.len(),
                    "Initiating graceful shutdown"
                );
                self.accepting_new = false;
                self.cancel_token.cancel();
                let _ = respond_to.send(Ok(()));
            }
        }
    }

    /// Locate or create the mixing bridge and admit the channel into it.
    #[instrument(skip_all, fields(channel_id = %channel.id))]
    async fn admit_channel(&mut self, channel: Channel) -> Result<AdmissionOutcome, BcError> {
        if !self.accepting_new {
            return Err(BcError::Draining);
        }

        let (bridge, created) = self.resolve_bridge().await?;

        if self
            .registry
            .get(&bridge.id)
            .is_some_and(|entry| entry.is_awaiting(&channel.id))
        {
            debug!(
                target: "bc.actor.controller",
                bridge_id = %bridge.id,
                channel_id = %channel.id,
                "Channel admission already pending, skipping add"
            );
            return Ok(AdmissionOutcome::AlreadyMember {
                bridge_id: bridge.id,
            });
        }

        match self.admission.admit(&bridge, &channel).await {
            Ok(AdmissionOutcome::Admitted { bridge_id }) => {
                self.metrics.channel_admitted();
                if let Some(entry) = self.registry.get_mut(&bridge_id) {
                    entry.expect_entry(channel.id.clone());
                }
                info!(
                    target: "bc.actor.controller",
                    bridge_id = %bridge_id,
                    channel_id = %channel.id,
                    "Channel admitted"
                );
                Ok(AdmissionOutcome::Admitted { bridge_id })
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.metrics.admission_failed();
                // A bridge created for this channel would otherwise stay empty
                // with no event left to remove it.
                if created
                    && !self
                        .registry
                        .get(&bridge.id)
                        .is_some_and(BridgeSubscription::admission_in_flight)
                {
                    self.retire_bridge(&bridge.id).await;
                }
                Err(e)
            }
        }
    }

    /// Find the mixing bridge, adopting it if unmanaged, or create one.
    ///
    /// Returns the bridge and whether it was created by this call.
    async fn resolve_bridge(&mut self) -> Result<(Bridge, bool), BcError> {
        let bridges = timed_engine_call(
            "list_bridges",
            self.slow_operation_warning,
            self.engine.list_bridges(),
        )
        .await
        .map_err(|e| {
            warn!(
                target: "bc.actor.controller",
                error = %e,
                "Failed to list bridges"
            );
            BcError::BridgeLookup(e)
        })?;

        self.prune_vanished(&bridges).await;

        match find_mixing_bridge(&bridges).cloned() {
            Some(bridge) => {
                match self.registry.get_mut(&bridge.id) {
                    Some(entry) => entry.record_members(bridge.member_count()),
                    None => self.adopt_bridge(&bridge).await,
                }
                self.refresh_state();
                Ok((bridge, false))
            }
            None => self.create_bridge().await.map(|bridge| (bridge, true)),
        }
    }

    /// Create a mixing bridge and subscribe to its events.
    async fn create_bridge(&mut self) -> Result<Bridge, BcError> {
        self.state.send_replace(BridgeState::Creating);
        debug!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            "No mixing bridge found, creating one"
        );

        let bridge = match timed_engine_call(
            "create_bridge",
            self.slow_operation_warning,
            self.engine.create_bridge(BridgeType::Mixing),
        )
        .await
        {
            Ok(bridge) => bridge,
            Err(e) => {
                warn!(
                    target: "bc.actor.controller",
                    error = %e,
                    "Failed to create mixing bridge"
                );
                self.refresh_state();
                return Err(BcError::BridgeCreation(e));
            }
        };
        self.metrics.bridge_created();

        let subscriptions = match self.subscribe_all(&bridge.id).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                warn!(
                    target: "bc.actor.controller",
                    bridge_id = %bridge.id,
                    error = %e,
                    "Failed to subscribe to bridge events, destroying bridge"
                );
                self.destroy_bridge(&bridge.id).await;
                self.refresh_state();
                return Err(BcError::Subscription(e));
            }
        };

        self.register(BridgeSubscription::created(bridge.id.clone(), subscriptions))
            .await;

        info!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            bridge_id = %bridge.id,
            "Mixing bridge created"
        );

        Ok(bridge)
    }

    /// Take a pre-existing mixing bridge under management.
    ///
    /// Without subscriptions the bridge is still used, but nobody destroys it
    /// when it empties.
    async fn adopt_bridge(&mut self, bridge: &Bridge) {
        match self.subscribe_all(&bridge.id).await {
            Ok(subscriptions) => {
                self.register(BridgeSubscription::adopted(
                    bridge.id.clone(),
                    subscriptions,
                    bridge.member_count(),
                ))
                .await;
                self.metrics.bridge_adopted();
                info!(
                    target: "bc.actor.controller",
                    controller_id = %self.controller_id,
                    bridge_id = %bridge.id,
                    members = bridge.member_count(),
                    "Adopted existing mixing bridge"
                );
            }
            Err(e) => {
                warn!(
                    target: "bc.actor.controller",
                    bridge_id = %bridge.id,
                    error = %e,
                    "Failed to subscribe to existing bridge, using it unmanaged"
                );
            }
        }
    }

    async fn register(&mut self, entry: BridgeSubscription) {
        if let Some(replaced) = self.registry.insert(entry) {
            self.release_subscriptions(&replaced).await;
        }
        set_bridges_active(self.registry.len());
    }

    /// Subscribe to both event kinds, releasing partial work on failure.
    async fn subscribe_all(&self, bridge_id: &BridgeId) -> Result<Vec<SubscriptionId>, EngineError> {
        let mut subscriptions = Vec::with_capacity(BridgeEventKind::ALL.len());

        for kind in BridgeEventKind::ALL {
            let sink = EventSink::new(self.event_sender.clone());
            let start = Instant::now();
            let result = self.engine.subscribe(bridge_id, kind, sink).await;
            record_engine_latency("subscribe", start.elapsed());

            match result {
                Ok(subscription) => {
                    record_bridge_operation("subscribe", "success");
                    debug!(
                        target: "bc.actor.controller",
                        bridge_id = %bridge_id,
                        kind = kind.as_str(),
                        subscription = %subscription,
                        "Subscribed to bridge events"
                    );
                    subscriptions.push(subscription);
                }
                Err(e) => {
                    record_bridge_operation("subscribe", "error");
                    for subscription in subscriptions {
                        self.unsubscribe(subscription).await;
                    }
                    return Err(e);
                }
            }
        }

        Ok(subscriptions)
    }

    async fn release_subscriptions(&self, entry: &BridgeSubscription) {
        for subscription in entry.subscriptions() {
            self.unsubscribe(*subscription).await;
        }
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) {
        let result = self.engine.unsubscribe(subscription).await;
        if let Err(e) = result {
            record_bridge_operation("unsubscribe", "error");
            debug!(
                target: "bc.actor.controller",
                subscription = %subscription,
                error = %e,
                "Failed to release subscription"
            );
        } else {
            record_bridge_operation("unsubscribe", "success");
        }
    }

    /// Drop registry entries for bridges the engine no longer lists.
    async fn prune_vanished(&mut self, bridges: &[Bridge]) {
        loop {
            let vanished = self
                .registry
                .iter()
                .find(|entry| !bridges.iter().any(|bridge| &bridge.id == entry.bridge_id()))
                .map(|entry| entry.bridge_id().clone());

            let Some(bridge_id) = vanished else {
                break;
            };

            if let Some(entry) = self.registry.remove(&bridge_id) {
                warn!(
                    target: "bc.actor.controller",
                    bridge_id = %bridge_id,
                    "Managed bridge disappeared from engine, releasing subscriptions"
                );
                self.release_subscriptions(&entry).await;
            }
        }
        set_bridges_active(self.registry.len());
    }

    /// React to a bridge event.
    #[instrument(skip_all, fields(bridge_id = %event.bridge.id, kind = event.kind.as_str()))]
    async fn handle_event(&mut self, event: BridgeEvent) {
        let BridgeEvent {
            kind,
            bridge,
            channel,
        } = event;
        let members = bridge.member_count();

        let Some(entry) = self.registry.get_mut(&bridge.id) else {
            record_event_ignored("unmanaged_bridge");
            debug!(
                target: "bc.actor.controller",
                bridge_id = %bridge.id,
                kind = kind.as_str(),
                "Ignoring event for unmanaged bridge"
            );
            return;
        };
        entry.record_members(members);
        // Any event for the channel ends its pending admission
        entry.mark_entered(&channel.id);
        let admission_in_flight = entry.admission_in_flight();

        debug!(
            target: "bc.actor.controller",
            bridge_id = %bridge.id,
            channel_id = %channel.id,
            kind = kind.as_str(),
            members = members,
            "Bridge event"
        );

        let settings = self.settings.get();

        match kind {
            BridgeEventKind::ChannelEnteredBridge => {
                self.refresh_state();
                if settings.moh_enabled() {
                    if members == 1 {
                        self.set_moh(&bridge.id, true).await;
                    } else if members > 1 {
                        self.set_moh(&bridge.id, false).await;
                    }
                }
            }
            BridgeEventKind::ChannelLeftBridge => {
                let retire = members == 0 && !admission_in_flight;

                if members == 0 && !retire {
                    debug!(
                        target: "bc.actor.controller",
                        bridge_id = %bridge.id,
                        "Bridge reported empty with an admission in flight, keeping it"
                    );
                } else if members == 1 && settings.moh_enabled() {
                    self.set_moh(&bridge.id, true).await;
                }

                if let Some(media) = settings.leave_media() {
                    self.admission
                        .play_announcement(&bridge.id, media, PlaybackKind::Leave)
                        .await;
                }

                if retire {
                    self.retire_bridge(&bridge.id).await;
                } else {
                    self.refresh_state();
                }
            }
        }
    }

    async fn set_moh(&self, bridge_id: &BridgeId, start: bool) {
        let result = if start {
            timed_engine_call(
                "start_moh",
                self.slow_operation_warning,
                self.engine.start_moh(bridge_id),
            )
            .await
        } else {
            timed_engine_call(
                "stop_moh",
                self.slow_operation_warning,
                self.engine.stop_moh(bridge_id),
            )
            .await
        };

        if let Err(e) = result {
            warn!(
                target: "bc.actor.controller",
                bridge_id = %bridge_id,
                start = start,
                error = %e,
                "Failed to change music-on-hold"
            );
        }
    }

    /// Stop managing a bridge and destroy it.
    ///
    /// No further events are processed for it once its entry is gone.
    async fn retire_bridge(&mut self, bridge_id: &BridgeId) {
        let Some(entry) = self.registry.remove(bridge_id) else {
            return;
        };

        self.state.send_replace(BridgeState::Destroying {
            bridge_id: bridge_id.clone(),
        });
        info!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            bridge_id = %bridge_id,
            adopted = entry.is_adopted(),
            managed_secs = (Utc::now() - entry.created_at()).num_seconds(),
            "Retiring mixing bridge"
        );
        self.release_subscriptions(&entry).await;
        self.destroy_bridge(bridge_id).await;

        set_bridges_active(self.registry.len());
        self.refresh_state();
    }

    /// Issue a destroy. Failures are logged and not retried.
    async fn destroy_bridge(&self, bridge_id: &BridgeId) {
        match timed_engine_call(
            "destroy_bridge",
            self.slow_operation_warning,
            self.engine.destroy_bridge(bridge_id),
        )
        .await
        {
            Ok(()) => {
                self.metrics.bridge_destroyed();
                info!(
                    target: "bc.actor.controller",
                    controller_id = %self.controller_id,
                    bridge_id = %bridge_id,
                    "Mixing bridge destroyed"
                );
            }
            Err(e) => {
                warn!(
                    target: "bc.actor.controller",
                    bridge_id = %bridge_id,
                    error = %e,
                    "Failed to destroy bridge, leaving it orphaned"
                );
            }
        }
    }

    /// Publish the state implied by the registry.
    fn refresh_state(&self) {
        let state = match self.registry.current() {
            Some(entry) => BridgeState::Active {
                bridge_id: entry.bridge_id().clone(),
                members: entry.last_reported_members(),
            },
            None => BridgeState::Absent,
        };
        self.state.send_replace(state);
    }

    fn get_status(&self) -> ControllerStatus {
        ControllerStatus {
            state: self.state.borrow().clone(),
            managed_bridges: self.registry.len(),
            is_draining: !self.accepting_new,
            mailbox_depth: self.mailbox.current_depth(),
        }
    }

    /// Perform graceful shutdown.
    async fn graceful_shutdown(&mut self) {
        info!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            managed_bridges = self.registry.len(),
            "Performing graceful shutdown"
        );

        self.accepting_new = false;

        // Answer whatever is still queued
        self.receiver.close();
        while let Ok(message) = self.receiver.try_recv() {
            self.mailbox.record_dequeue();
            match message {
                ControllerMessage::AdmitChannel { respond_to, .. } => {
                    let _ = respond_to.send(Err(BcError::Draining));
                }
                ControllerMessage::GetStatus { respond_to } => {
                    let _ = respond_to.send(self.get_status());
                }
                ControllerMessage::Shutdown { respond_to } => {
                    let _ = respond_to.send(Ok(()));
                }
            }
        }

        for entry in self.registry.drain() {
            debug!(
                target: "bc.actor.controller",
                controller_id = %self.controller_id,
                bridge_id = %entry.bridge_id(),
                "Releasing bridge subscriptions"
            );
            self.release_subscriptions(&entry).await;
        }

        set_bridges_active(0);
        self.state.send_replace(BridgeState::Absent);

        info!(
            target: "bc.actor.controller",
            controller_id = %self.controller_id,
            "Graceful shutdown complete"
        );
    }
}

/// Await an engine request, recording latency and outcome.
///
/// A request still pending after `slow_threshold` is logged and then awaited
/// to completion.
async fn timed_engine_call<T, F>(
    operation: &'static str,
    slow_threshold: Duration,
    request: F,
) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, EngineError>>,
{
    let start = Instant::now();
    let mut request = std::pin::pin!(request);

    let result = match tokio::time::timeout(slow_threshold, request.as_mut()).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                target: "bc.actor.controller",
                operation = operation,
                waited_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Engine request still pending"
            );
            request.await
        }
    };

    record_engine_latency(operation, start.elapsed());
    record_bridge_operation(operation, if result.is_ok() { "success" } else { "error" });

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timed_engine_call_waits_past_threshold() {
        let result = timed_engine_call("create_bridge", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, EngineError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timed_engine_call_passes_errors_through() {
        let result: Result<(), EngineError> =
            timed_engine_call("destroy_bridge", Duration::from_secs(1), async {
                Err(EngineError::NotFound("bridge-1".to_string()))
            })
            .await;

        assert_eq!(result, Err(EngineError::NotFound("bridge-1".to_string())));
    }
}
