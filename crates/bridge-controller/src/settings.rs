//! Bridge settings cache.
//!
//! Settings are fetched once from the configuration store at startup and are
//! read-only afterwards. Until the fetch succeeds the cache reports
//! [`SettingsSnapshot::NotReady`] and every optional side effect (join/leave
//! sounds, music-on-hold) is skipped. A failed fetch is logged and not
//! retried.

use crate::engine::MediaRef;
use async_trait::async_trait;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Bridge behaviour settings as stored in the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Play music-on-hold while a single party is alone in the bridge.
    #[serde(deserialize_with = "deserialize_flag")]
    pub moh: bool,
    /// Suppress join and leave announcements.
    #[serde(deserialize_with = "deserialize_flag")]
    pub quiet: bool,
    /// Sound name played when a channel joins.
    pub join_sound: String,
    /// Sound name played when a channel leaves.
    pub leave_sound: String,
}

/// Accepts either a JSON boolean or the store's `y`/`n` text flags.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(true),
            "n" | "no" | "false" => Ok(false),
            other => Err(de::Error::custom(format!(
                "invalid flag value '{other}', expected y/n"
            ))),
        },
    }
}

/// Configuration store errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Store could not be reached.
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),

    /// Store returned a row that does not decode into [`Settings`].
    #[error("Malformed bridge settings: {0}")]
    Malformed(String),
}

/// Configuration store holding the bridge settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the current bridge settings.
    async fn fetch_bridge_settings(&self) -> Result<Settings, SettingsError>;
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSnapshot {
    /// Settings have not been loaded (yet, or the load failed).
    NotReady,
    Ready(Arc<Settings>),
}

impl SettingsSnapshot {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, SettingsSnapshot::Ready(_))
    }

    /// Music-on-hold is enabled. Always false before settings are loaded.
    #[must_use]
    pub fn moh_enabled(&self) -> bool {
        match self {
            SettingsSnapshot::Ready(settings) => settings.moh,
            SettingsSnapshot::NotReady => false,
        }
    }

    /// Join announcement, unless quiet mode is on or settings are not loaded.
    #[must_use]
    pub fn join_media(&self) -> Option<MediaRef> {
        self.announcing()
            .map(|settings| MediaRef::sound(&settings.join_sound))
    }

    /// Leave announcement, unless quiet mode is on or settings are not loaded.
    #[must_use]
    pub fn leave_media(&self) -> Option<MediaRef> {
        self.announcing()
            .map(|settings| MediaRef::sound(&settings.leave_sound))
    }

    fn announcing(&self) -> Option<&Settings> {
        match self {
            SettingsSnapshot::Ready(settings) if !settings.quiet => Some(settings),
            _ => None,
        }
    }
}

/// Write-once holder for the bridge settings.
#[derive(Debug, Default)]
pub struct SettingsCache {
    snapshot: OnceCell<Arc<Settings>>,
}

impl SettingsCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a cache that is already populated.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            snapshot: OnceCell::new_with(Some(Arc::new(settings))),
        })
    }

    /// Fetch settings from the store and keep them.
    ///
    /// Concurrent callers share one fetch. Once loaded, further calls return
    /// the cached value without touching the store.
    ///
    /// # Errors
    ///
    /// Returns the store error; the cache stays [`SettingsSnapshot::NotReady`].
    pub async fn load(&self, store: &dyn SettingsStore) -> Result<Arc<Settings>, SettingsError> {
        if let Some(settings) = self.snapshot.get() {
            debug!(target: "bc.settings", "Bridge settings already loaded");
            return Ok(Arc::clone(settings));
        }

        let result = self
            .snapshot
            .get_or_try_init(|| async { store.fetch_bridge_settings().await.map(Arc::new) })
            .await;

        match result {
            Ok(settings) => {
                info!(
                    target: "bc.settings",
                    moh = settings.moh,
                    quiet = settings.quiet,
                    join_sound = %settings.join_sound,
                    leave_sound = %settings.leave_sound,
                    "Bridge settings loaded"
                );
                Ok(Arc::clone(settings))
            }
            Err(e) => {
                error!(
                    target: "bc.settings",
                    error = %e,
                    "Failed to load bridge settings; announcements and music-on-hold disabled"
                );
                Err(e)
            }
        }
    }

    /// Load settings on a background task.
    pub fn spawn_load(self: &Arc<Self>, store: Arc<dyn SettingsStore>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            // Failure is already logged by load().
            let _ = cache.load(store.as_ref()).await;
        })
    }

    /// Current snapshot.
    #[must_use]
    pub fn get(&self) -> SettingsSnapshot {
        match self.snapshot.get() {
            Some(settings) => SettingsSnapshot::Ready(Arc::clone(settings)),
            None => SettingsSnapshot::NotReady,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        result: Result<Settings, String>,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn ok(settings: Settings) -> Self {
            Self {
                result: Ok(settings),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err("connection refused".to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SettingsStore for CountingStore {
        async fn fetch_bridge_settings(&self) -> Result<Settings, SettingsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(SettingsError::Unavailable)
        }
    }

    fn settings(moh: bool, quiet: bool) -> Settings {
        Settings {
            moh,
            quiet,
            join_sound: "welcome".to_string(),
            leave_sound: "bye".to_string(),
        }
    }

    #[test]
    fn test_deserialize_yes_no_flags() {
        let parsed: Settings = serde_json::from_str(
            r#"{"moh":"y","quiet":"n","join_sound":"welcome","leave_sound":"bye"}"#,
        )
        .unwrap();
        assert_eq!(parsed, settings(true, false));

        let parsed: Settings = serde_json::from_str(
            r#"{"moh":"N","quiet":"Yes","join_sound":"welcome","leave_sound":"bye"}"#,
        )
        .unwrap();
        assert_eq!(parsed, settings(false, true));
    }

    #[test]
    fn test_deserialize_bool_flags() {
        let parsed: Settings = serde_json::from_str(
            r#"{"moh":false,"quiet":true,"join_sound":"welcome","leave_sound":"bye"}"#,
        )
        .unwrap();
        assert_eq!(parsed, settings(false, true));
    }

    #[test]
    fn test_deserialize_invalid_flag() {
        let result: Result<Settings, _> = serde_json::from_str(
            r#"{"moh":"maybe","quiet":"n","join_sound":"welcome","leave_sound":"bye"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_not_ready_skips_side_effects() {
        let snapshot = SettingsSnapshot::NotReady;
        assert!(!snapshot.is_ready());
        assert!(!snapshot.moh_enabled());
        assert_eq!(snapshot.join_media(), None);
        assert_eq!(snapshot.leave_media(), None);
    }

    #[test]
    fn test_snapshot_media_refs() {
        let snapshot = SettingsSnapshot::Ready(Arc::new(settings(true, false)));
        assert!(snapshot.moh_enabled());
        assert_eq!(snapshot.join_media(), Some(MediaRef::sound("welcome")));
        assert_eq!(snapshot.leave_media(), Some(MediaRef::sound("bye")));
    }

    #[test]
    fn test_snapshot_quiet_has_no_media() {
        let snapshot = SettingsSnapshot::Ready(Arc::new(settings(true, true)));
        assert!(snapshot.moh_enabled());
        assert_eq!(snapshot.join_media(), None);
        assert_eq!(snapshot.leave_media(), None);
    }

    #[tokio::test]
    async fn test_cache_starts_not_ready() {
        let cache = SettingsCache::new();
        assert_eq!(cache.get(), SettingsSnapshot::NotReady);
    }

    #[tokio::test]
    async fn test_load_populates_cache() {
        let cache = SettingsCache::new();
        let store = CountingStore::ok(settings(true, false));

        let loaded = cache.load(&store).await.unwrap();
        assert!(loaded.moh);
        assert_eq!(
            cache.get(),
            SettingsSnapshot::Ready(Arc::new(settings(true, false)))
        );
    }

    #[tokio::test]
    async fn test_load_failure_leaves_cache_unset() {
        let cache = SettingsCache::new();
        let store = CountingStore::failing();

        let result = cache.load(&store).await;
        assert!(matches!(result, Err(SettingsError::Unavailable(_))));
        assert_eq!(cache.get(), SettingsSnapshot::NotReady);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_load_does_not_fetch_again() {
        let cache = SettingsCache::new();
        let store = CountingStore::ok(settings(false, false));

        cache.load(&store).await.unwrap();
        cache.load(&store).await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_settings_is_ready() {
        let cache = SettingsCache::with_settings(settings(false, true));
        assert!(cache.get().is_ready());
        assert!(!cache.get().moh_enabled());
    }

    #[tokio::test]
    async fn test_spawn_load() {
        let cache = SettingsCache::new();
        let store: Arc<dyn SettingsStore> = Arc::new(CountingStore::ok(settings(true, true)));

        cache.spawn_load(store).await.unwrap();

        assert!(cache.get().is_ready());
    }
}
