//! Mock configuration store.

use async_trait::async_trait;
use bridge_controller::settings::{Settings, SettingsError, SettingsStore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Settings store returning fixed settings, or always failing.
pub struct MockSettingsStore {
    settings: Option<Settings>,
    call_count: AtomicUsize,
}

impl MockSettingsStore {
    /// Create a store that returns `settings`.
    pub fn returning(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a store that is unreachable.
    pub fn failing() -> Self {
        Self {
            settings: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Number of fetches made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn fetch_bridge_settings(&self) -> Result<Settings, SettingsError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.settings
            .clone()
            .ok_or_else(|| SettingsError::Unavailable("mock store unreachable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::chatty_settings;

    #[tokio::test]
    async fn test_returning_store() {
        let store = MockSettingsStore::returning(chatty_settings());

        let settings = store.fetch_bridge_settings().await.unwrap();

        assert_eq!(settings, chatty_settings());
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MockSettingsStore::failing();

        let result = store.fetch_bridge_settings().await;

        assert!(matches!(result, Err(SettingsError::Unavailable(_))));
        assert_eq!(store.call_count(), 1);
    }
}
