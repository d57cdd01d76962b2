use crate::store::SessionRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Configures the periodic expiry sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Idle seconds after which a session is evicted.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    3600 // hourly
}

fn default_retention_secs() -> u64 {
    24 * 3600
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            retention_secs: default_retention_secs(),
        }
    }
}

impl ExpiryConfig {
    /// Time between sweeps as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Retention window as a [`Duration`].
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Spawns the background sweeper task.
///
/// The task ticks on `sweep_interval` and evicts sessions idle longer than
/// `retention`. It only ever removes whole sessions. Returns the
/// [`tokio::task::JoinHandle`] so the caller can abort it on shutdown.
pub fn spawn_sweeper(
    registry: Arc<SessionRegistry>,
    config: ExpiryConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.sweep_interval());
        // The first tick fires immediately; skip it so a fresh process
        // does not sweep before anything could expire.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(config.retention());
            if evicted > 0 {
                info!(evicted, live = registry.len(), "expiry sweep evicted sessions");
            } else {
                debug!(live = registry.len(), "expiry sweep found nothing to evict");
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_hourly_sweep_daily_retention() {
        let config = ExpiryConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.retention(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ExpiryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.sweep_interval_secs, 3600);
        assert_eq!(config.retention_secs, 24 * 3600);

        let config: ExpiryConfig =
            serde_json::from_str(r#"{"retention_secs": 60}"#).unwrap();
        assert_eq!(config.retention_secs, 60);
        assert_eq!(config.sweep_interval_secs, 3600);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_on_schedule() {
        let registry = Arc::new(SessionRegistry::new());
        registry.get_or_create("stale");
        registry.backdate("stale", Duration::from_secs(120));

        let handle = spawn_sweeper(
            Arc::clone(&registry),
            ExpiryConfig {
                sweep_interval_secs: 10,
                retention_secs: 60,
            },
        );

        tokio::time::sleep(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;
        assert!(registry.is_empty());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_leaves_active_sessions_alone() {
        let registry = Arc::new(SessionRegistry::new());
        registry.get_or_create("active");

        let handle = spawn_sweeper(
            Arc::clone(&registry),
            ExpiryConfig {
                sweep_interval_secs: 10,
                retention_secs: 3600,
            },
        );

        tokio::time::sleep(Duration::from_secs(25)).await;
        tokio::task::yield_now().await;
        assert_eq!(registry.len(), 1);

        handle.abort();
    }
}
