//! Pre-configured test data fixtures for BC testing.

use crate::mock_engine::MockEngine;
use bridge_controller::actors::{ActorMetrics, BridgeControllerActor, BridgeControllerHandle};
use bridge_controller::config::Config;
use bridge_controller::engine::{CallControlEngine, Channel};
use bridge_controller::settings::{Settings, SettingsCache};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Settings with music-on-hold and announcements on
/// (`moh = "y"`, `quiet = "n"`, `welcome` / `bye`).
#[must_use]
pub fn chatty_settings() -> Settings {
    Settings {
        moh: true,
        quiet: false,
        join_sound: "welcome".to_string(),
        leave_sound: "bye".to_string(),
    }
}

/// Settings with music-on-hold on and announcements suppressed.
#[must_use]
pub fn quiet_settings() -> Settings {
    Settings {
        quiet: true,
        ..chatty_settings()
    }
}

/// Settings with announcements on and music-on-hold off.
#[must_use]
pub fn no_moh_settings() -> Settings {
    Settings {
        moh: false,
        ..chatty_settings()
    }
}

/// Controller config with small buffers and a fixed ID.
#[must_use]
pub fn test_config() -> Config {
    Config {
        controller_id: "bc-test".to_string(),
        controller_mailbox_capacity: 64,
        slow_operation_warning: Duration::from_secs(2),
    }
}

/// Channel fixture.
#[must_use]
pub fn channel(id: &str) -> Channel {
    Channel::new(id)
}

/// A running controller wired to a mock engine.
pub struct TestController {
    pub handle: BridgeControllerHandle,
    pub task: JoinHandle<()>,
    pub metrics: Arc<ActorMetrics>,
}

impl TestController {
    /// Round-trip through the mailbox so every event queued so far is handled.
    pub async fn settle(&self) {
        self.handle.get_status().await.expect("controller should be running");
    }
}

/// Spawn a controller over `engine` with settings already loaded.
pub fn spawn_controller(engine: &Arc<MockEngine>, settings: Settings) -> TestController {
    spawn_controller_with_cache(engine, SettingsCache::with_settings(settings))
}

/// Spawn a controller over `engine` with the given settings cache.
pub fn spawn_controller_with_cache(
    engine: &Arc<MockEngine>,
    settings: Arc<SettingsCache>,
) -> TestController {
    let metrics = ActorMetrics::new();
    let engine: Arc<dyn CallControlEngine> = engine.clone();
    let (handle, task) =
        BridgeControllerActor::spawn(&test_config(), engine, settings, Arc::clone(&metrics));

    TestController {
        handle,
        task,
        metrics,
    }
}

/// Poll `condition` until it holds, panicking after five seconds.
pub async fn wait_until<F, Fut>(description: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if condition().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for: {description}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
