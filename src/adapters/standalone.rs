//! No-op adapter for installations without any external system.

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use super::{ErpAdapter, SystemInfo};
use crate::config::{IntegrationConfig, SyncDirection, SystemType};
use crate::result::SyncResult;

pub struct StandaloneAdapter {
    config: IntegrationConfig,
}

impl StandaloneAdapter {
    pub fn new(config: IntegrationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ErpAdapter for StandaloneAdapter {
    fn system_type(&self) -> SystemType {
        SystemType::Standalone
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            system_type: SystemType::Standalone,
            system_name: self.config.system_name.clone(),
            version: self.config.version.clone(),
        }
    }

    async fn authenticate(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        true
    }

    async fn sync_products(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::completed(0, Vec::new()))
    }

    async fn sync_orders(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::completed(0, Vec::new()))
    }

    async fn sync_inventory(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::completed(0, Vec::new()))
    }

    async fn sync_clients(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::completed(0, Vec::new()))
    }

    async fn sync_suppliers(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::completed(0, Vec::new()))
    }

    async fn handle_webhook(&self, event: &str, payload: &Value) -> anyhow::Result<()> {
        debug!("[standalone] Webhook payload: {}", payload);
        info!("[standalone] Ignoring webhook '{}' (no external system)", event);
        Ok(())
    }
}
