//! Orchestration of the active adapter: full/per-entity syncs, the auto-sync
//! timer, connection testing and reconfiguration.
//!
//! One manager owns one adapter and at most one live timer task. The manager
//! holds no internal lock against overlapping manual syncs; callers must not
//! invoke `perform_full_sync`/`sync_entity` concurrently on one instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::adapters::{ErpAdapter, SystemInfo};
use crate::config::{ConfigUpdate, EntityKind, IntegrationConfig, SyncDirection};
use crate::factory::{create_adapter, validate_configuration};
use crate::result::SyncResult;

/// Status surface consumed by a UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_enabled: bool,
    pub is_auto_sync_running: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Only present while the timer runs and a prior sync exists.
    pub next_sync_time: Option<DateTime<Utc>>,
}

pub struct IntegrationManager {
    config: IntegrationConfig,
    adapter: Arc<dyn ErpAdapter>,
    last_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
    sync_task: Option<JoinHandle<()>>,
    initialized: bool,
}

impl IntegrationManager {
    /// Build a manager from the defaults overlaid with caller overrides.
    pub fn new(overrides: ConfigUpdate) -> anyhow::Result<Self> {
        let config = IntegrationConfig::with_overrides(overrides);
        let adapter = create_adapter(&config)?;
        Ok(Self::with_adapter(config, adapter))
    }

    /// Build a manager around an injected adapter. Used by tests and by
    /// callers that construct adapters with extra wiring (local sources).
    pub fn with_adapter(config: IntegrationConfig, adapter: Arc<dyn ErpAdapter>) -> Self {
        let last_sync = Arc::new(RwLock::new(config.sync.last_sync_time));
        Self {
            config,
            adapter,
            last_sync,
            sync_task: None,
            initialized: false,
        }
    }

    /// Validate configuration and prove connectivity. Returns true only when
    /// both succeed; starts the auto-sync timer when configured to.
    pub async fn initialize(&mut self) -> bool {
        let errors = validate_configuration(&self.config);
        if !errors.is_empty() {
            for error in &errors {
                error!("Configuration error: {}", error);
            }
            return false;
        }

        if !self.adapter.test_connection().await {
            error!(
                "Connection test against {} ('{}') failed",
                self.config.system_type, self.config.system_name
            );
            return false;
        }

        self.initialized = true;
        info!(
            "Integration with {} ('{}') initialized",
            self.config.system_type, self.config.system_name
        );

        if self.config.sync.enabled && self.config.sync.auto_sync {
            self.start_auto_sync();
        }
        true
    }

    /// Start (or restart) the recurring full-sync timer. Any pre-existing
    /// timer is cleared first so repeated calls leave exactly one live timer.
    pub fn start_auto_sync(&mut self) {
        self.stop_auto_sync();

        let interval = Duration::from_secs(self.config.sync.interval_secs.max(1));
        let direction = self.config.sync.direction;
        let adapter = Arc::clone(&self.adapter);
        let last_sync = Arc::clone(&self.last_sync);

        info!("Auto-sync started, interval {:?}", interval);

        self.sync_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first sync belongs
            // one interval out.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let results = full_sync_pass(Arc::clone(&adapter), direction, Arc::clone(&last_sync)).await;
                let failed = results.values().filter(|r| !r.success).count();
                if failed > 0 {
                    warn!("Scheduled sync finished with {} failed entities", failed);
                } else {
                    info!("Scheduled sync finished for {} entities", results.len());
                }
            }
        }));
    }

    /// Stop future scheduled runs. A sync currently executing is not
    /// aborted mid-flight. Safe to call repeatedly.
    pub fn stop_auto_sync(&mut self) {
        if let Some(task) = self.sync_task.take() {
            task.abort();
            info!("Auto-sync stopped");
        }
    }

    pub fn is_auto_sync_running(&self) -> bool {
        self.sync_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Sync all five entity kinds in fixed order with the configured
    /// direction. An entity whose sync errors contributes a failed result;
    /// it never aborts the rest of the pass.
    pub async fn perform_full_sync(&self) -> HashMap<EntityKind, SyncResult> {
        full_sync_pass(
            Arc::clone(&self.adapter),
            self.config.sync.direction,
            Arc::clone(&self.last_sync),
        )
        .await
    }

    /// Sync one entity kind, defaulting to the configured direction.
    pub async fn sync_entity(
        &self,
        kind: EntityKind,
        direction: Option<SyncDirection>,
    ) -> anyhow::Result<SyncResult> {
        let direction = direction.unwrap_or(self.config.sync.direction);
        self.adapter.sync_entity(kind, direction).await
    }

    /// Stop auto-sync, overlay the partial config (shallow merge: supplied
    /// sections replace stored ones wholesale), rebuild the adapter and
    /// re-initialize. Returns whether re-initialization succeeded.
    ///
    /// Config and adapter commit together: if the factory rejects the new
    /// config, the previous config and adapter both stay in effect.
    pub async fn update_configuration(&mut self, update: ConfigUpdate) -> bool {
        self.stop_auto_sync();
        self.initialized = false;

        let mut config = self.config.clone();
        config.apply(update);

        match create_adapter(&config) {
            Ok(adapter) => {
                self.config = config;
                self.adapter = adapter;
            }
            Err(e) => {
                error!("Failed to construct {} adapter: {}", config.system_type, e);
                return false;
            }
        }

        self.initialize().await
    }

    /// Delegate an inbound webhook to the adapter. Errors are logged and
    /// swallowed; a malformed payload must never destabilize the manager.
    pub async fn handle_webhook(&self, event: &str, payload: &Value) {
        if let Err(e) = self.adapter.handle_webhook(event, payload).await {
            error!("Webhook '{}' failed: {}", event, e);
        }
    }

    pub async fn test_connection(&self) -> bool {
        self.adapter.test_connection().await
    }

    pub async fn get_sync_status(&self) -> SyncStatus {
        let last_sync_time = *self.last_sync.read().await;
        let is_auto_sync_running = self.is_auto_sync_running();
        let next_sync_time = match (is_auto_sync_running, last_sync_time) {
            (true, Some(last)) => Some(last + chrono::Duration::seconds(self.config.sync.interval_secs as i64)),
            _ => None,
        };

        SyncStatus {
            is_enabled: self.config.sync.enabled,
            is_auto_sync_running,
            last_sync_time,
            next_sync_time,
        }
    }

    /// Current configuration with the live last-sync timestamp patched in.
    pub async fn get_configuration(&self) -> IntegrationConfig {
        let mut config = self.config.clone();
        config.sync.last_sync_time = *self.last_sync.read().await;
        config
    }

    pub fn get_system_info(&self) -> SystemInfo {
        self.adapter.system_info()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Tear down the timer. Safe from any state, any number of times.
    pub fn destroy(&mut self) {
        self.stop_auto_sync();
        self.initialized = false;
    }
}

impl Drop for IntegrationManager {
    fn drop(&mut self) {
        if let Some(task) = self.sync_task.take() {
            task.abort();
        }
    }
}

/// One full-sync pass shared by manual and scheduled invocations.
async fn full_sync_pass(
    adapter: Arc<dyn ErpAdapter>,
    direction: SyncDirection,
    last_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
) -> HashMap<EntityKind, SyncResult> {
    let mut results = HashMap::new();

    for kind in EntityKind::ALL {
        match adapter.sync_entity(kind, direction).await {
            Ok(result) => {
                results.insert(kind, result);
            }
            Err(e) => {
                warn!("Sync of {} failed: {}", kind, e);
                results.insert(kind, SyncResult::failed(e.to_string()));
            }
        }
    }

    *last_sync.write().await = Some(Utc::now());
    results
}
