//! Channel admission.
//!
//! Places a channel into a known bridge and plays the join announcement.

use crate::engine::{Bridge, BridgeId, CallControlEngine, Channel, MediaRef, PlaybackHandle};
use crate::errors::BcError;
use crate::observability::{record_bridge_operation, record_engine_latency, record_playback};
use crate::settings::SettingsCache;

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Channel was added to the bridge.
    Admitted { bridge_id: BridgeId },
    /// Channel was already in the bridge; nothing was sent to the engine.
    AlreadyMember { bridge_id: BridgeId },
}

impl AdmissionOutcome {
    #[must_use]
    pub fn bridge_id(&self) -> &BridgeId {
        match self {
            AdmissionOutcome::Admitted { bridge_id }
            | AdmissionOutcome::AlreadyMember { bridge_id } => bridge_id,
        }
    }
}

/// Which announcement is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackKind {
    Join,
    Leave,
}

impl PlaybackKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PlaybackKind::Join => "join",
            PlaybackKind::Leave => "leave",
        }
    }
}

/// Adds channels to bridges and plays announcements.
#[derive(Clone)]
pub struct ChannelAdmission {
    engine: Arc<dyn CallControlEngine>,
    settings: Arc<SettingsCache>,
}

impl ChannelAdmission {
    #[must_use]
    pub fn new(engine: Arc<dyn CallControlEngine>, settings: Arc<SettingsCache>) -> Self {
        Self { engine, settings }
    }

    /// Add `channel` to `bridge` and play the join sound.
    ///
    /// A channel the bridge snapshot already lists is not re-added and gets
    /// no join sound.
    ///
    /// # Errors
    ///
    /// Returns `BcError::Admission` if the engine refuses the add. The
    /// channel is then outside any bridge.
    #[instrument(skip_all, fields(bridge_id = %bridge.id, channel_id = %channel.id))]
    pub async fn admit(
        &self,
        bridge: &Bridge,
        channel: &Channel,
    ) -> Result<AdmissionOutcome, BcError> {
        if bridge.contains(&channel.id) {
            debug!(
                target: "bc.admission",
                bridge_id = %bridge.id,
                channel_id = %channel.id,
                "Channel already in bridge, skipping add"
            );
            return Ok(AdmissionOutcome::AlreadyMember {
                bridge_id: bridge.id.clone(),
            });
        }

        let start = Instant::now();
        let result = self.engine.add_channel(&bridge.id, &channel.id).await;
        record_engine_latency("add_channel", start.elapsed());

        if let Err(e) = result {
            record_bridge_operation("add_channel", "error");
            warn!(
                target: "bc.admission",
                bridge_id = %bridge.id,
                channel_id = %channel.id,
                error = %e,
                "Failed to add channel to bridge"
            );
            return Err(BcError::Admission(e));
        }
        record_bridge_operation("add_channel", "success");

        debug!(
            target: "bc.admission",
            bridge_id = %bridge.id,
            channel_id = %channel.id,
            "Channel added to bridge"
        );

        if let Some(media) = self.settings.get().join_media() {
            self.play_announcement(&bridge.id, media, PlaybackKind::Join)
                .await;
        }

        Ok(AdmissionOutcome::Admitted {
            bridge_id: bridge.id.clone(),
        })
    }

    /// Play an announcement on a bridge with a fresh playback handle.
    ///
    /// Failures are swallowed.
    pub(crate) async fn play_announcement(
        &self,
        bridge_id: &BridgeId,
        media: MediaRef,
        kind: PlaybackKind,
    ) {
        let playback = PlaybackHandle::new();

        let start = Instant::now();
        let result = self.engine.play_media(bridge_id, &media, playback).await;
        record_engine_latency("play_media", start.elapsed());

        match result {
            Ok(handle) => {
                record_playback(kind.as_str(), "success");
                debug!(
                    target: "bc.admission",
                    bridge_id = %bridge_id,
                    media = %media,
                    playback = %handle,
                    kind = kind.as_str(),
                    "Announcement started"
                );
            }
            Err(e) => {
                record_playback(kind.as_str(), "error");
                debug!(
                    target: "bc.admission",
                    bridge_id = %bridge_id,
                    media = %media,
                    kind = kind.as_str(),
                    error = %e,
                    "Announcement failed, ignoring"
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::{
        BridgeEventKind, BridgeType, ChannelId, EngineError, EventSink, SubscriptionId,
    };
    use crate::settings::Settings;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records add/play requests; everything else is unused here.
    #[derive(Default)]
    struct RecordingEngine {
        fail_add: bool,
        fail_play: bool,
        adds: Mutex<Vec<(BridgeId, ChannelId)>>,
        plays: Mutex<Vec<(BridgeId, MediaRef, PlaybackHandle)>>,
    }

    #[async_trait]
    impl CallControlEngine for RecordingEngine {
        async fn list_bridges(&self) -> Result<Vec<Bridge>, EngineError> {
            Ok(Vec::new())
        }

        async fn create_bridge(&self, bridge_type: BridgeType) -> Result<Bridge, EngineError> {
            Ok(Bridge::new("unused", bridge_type))
        }

        async fn destroy_bridge(&self, _bridge_id: &BridgeId) -> Result<(), EngineError> {
            Ok(())
        }

        async fn add_channel(
            &self,
            bridge_id: &BridgeId,
            channel_id: &ChannelId,
        ) -> Result<(), EngineError> {
            if self.fail_add {
                return Err(EngineError::NotFound(channel_id.to_string()));
            }
            self.adds
                .lock()
                .unwrap()
                .push((bridge_id.clone(), channel_id.clone()));
            Ok(())
        }

        async fn start_moh(&self, _bridge_id: &BridgeId) -> Result<(), EngineError> {
            Ok(())
        }

        async fn stop_moh(&self, _bridge_id: &BridgeId) -> Result<(), EngineError> {
            Ok(())
        }

        async fn play_media(
            &self,
            bridge_id: &BridgeId,
            media: &MediaRef,
            playback: PlaybackHandle,
        ) -> Result<PlaybackHandle, EngineError> {
            self.plays
                .lock()
                .unwrap()
                .push((bridge_id.clone(), media.clone(), playback));
            if self.fail_play {
                return Err(EngineError::Rejected("no such sound".to_string()));
            }
            Ok(playback)
        }

        async fn subscribe(
            &self,
            _bridge_id: &BridgeId,
            _kind: BridgeEventKind,
            _sink: EventSink,
        ) -> Result<SubscriptionId, EngineError> {
            Ok(SubscriptionId::new())
        }

        async fn unsubscribe(&self, _subscription: SubscriptionId) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn settings(quiet: bool) -> Settings {
        Settings {
            moh: true,
            quiet,
            join_sound: "welcome".to_string(),
            leave_sound: "bye".to_string(),
        }
    }

    fn admission(
        engine: &Arc<RecordingEngine>,
        settings: Arc<SettingsCache>,
    ) -> ChannelAdmission {
        let engine: Arc<dyn CallControlEngine> = Arc::clone(engine) as Arc<dyn CallControlEngine>;
        ChannelAdmission::new(engine, settings)
    }

    #[tokio::test]
    async fn test_admit_adds_channel_and_plays_join_sound() {
        let engine = Arc::new(RecordingEngine::default());
        let admission = admission(&engine, SettingsCache::with_settings(settings(false)));
        let bridge = Bridge::new("bridge-1", BridgeType::Mixing);

        let outcome = admission
            .admit(&bridge, &Channel::new("chan-a"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AdmissionOutcome::Admitted {
                bridge_id: BridgeId::new("bridge-1")
            }
        );
        assert_eq!(engine.adds.lock().unwrap().len(), 1);
        let plays = engine.plays.lock().unwrap();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays.first().unwrap().1, MediaRef::sound("welcome"));
    }

    #[tokio::test]
    async fn test_admit_quiet_mode_plays_nothing() {
        let engine = Arc::new(RecordingEngine::default());
        let admission = admission(&engine, SettingsCache::with_settings(settings(true)));
        let bridge = Bridge::new("bridge-1", BridgeType::Mixing);

        admission
            .admit(&bridge, &Channel::new("chan-a"))
            .await
            .unwrap();

        assert_eq!(engine.adds.lock().unwrap().len(), 1);
        assert!(engine.plays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admit_settings_not_ready_plays_nothing() {
        let engine = Arc::new(RecordingEngine::default());
        let admission = admission(&engine, SettingsCache::new());
        let bridge = Bridge::new("bridge-1", BridgeType::Mixing);

        admission
            .admit(&bridge, &Channel::new("chan-a"))
            .await
            .unwrap();

        assert_eq!(engine.adds.lock().unwrap().len(), 1);
        assert!(engine.plays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admit_existing_member_is_noop() {
        let engine = Arc::new(RecordingEngine::default());
        let admission = admission(&engine, SettingsCache::with_settings(settings(false)));
        let mut bridge = Bridge::new("bridge-1", BridgeType::Mixing);
        bridge.channels.push(ChannelId::new("chan-a"));

        let outcome = admission
            .admit(&bridge, &Channel::new("chan-a"))
            .await
            .unwrap();

        assert!(matches!(outcome, AdmissionOutcome::AlreadyMember { .. }));
        assert!(engine.adds.lock().unwrap().is_empty());
        assert!(engine.plays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admit_add_failure_is_reported() {
        let engine = Arc::new(RecordingEngine {
            fail_add: true,
            ..Default::default()
        });
        let admission = admission(&engine, SettingsCache::with_settings(settings(false)));
        let bridge = Bridge::new("bridge-1", BridgeType::Mixing);

        let result = admission.admit(&bridge, &Channel::new("chan-a")).await;

        assert!(matches!(result, Err(BcError::Admission(EngineError::NotFound(_)))));
        assert!(engine.plays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admit_play_failure_is_swallowed() {
        let engine = Arc::new(RecordingEngine {
            fail_play: true,
            ..Default::default()
        });
        let admission = admission(&engine, SettingsCache::with_settings(settings(false)));
        let bridge = Bridge::new("bridge-1", BridgeType::Mixing);

        let outcome = admission.admit(&bridge, &Channel::new("chan-a")).await;

        assert!(matches!(outcome, Ok(AdmissionOutcome::Admitted { .. })));
        assert_eq!(engine.plays.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_each_announcement_uses_fresh_playback_handle() {
        let engine = Arc::new(RecordingEngine::default());
        let admission = admission(&engine, SettingsCache::with_settings(settings(false)));
        let bridge_id = BridgeId::new("bridge-1");

        admission
            .play_announcement(&bridge_id, MediaRef::sound("bye"), PlaybackKind::Leave)
            .await;
        admission
            .play_announcement(&bridge_id, MediaRef::sound("bye"), PlaybackKind::Leave)
            .await;

        let plays = engine.plays.lock().unwrap();
        assert_eq!(plays.len(), 2);
        assert_ne!(plays.first().unwrap().2, plays.get(1).unwrap().2);
    }
}
