//! NetSuite adapter (SuiteTalk REST record API).

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;

use super::{dispatch_webhook, import_entity, ErpAdapter, SystemInfo};
use crate::client::HttpClient;
use crate::config::{EntityKind, IntegrationConfig, SyncDirection, SystemType};
use crate::result::SyncResult;

const INVENTORY_ITEM_ENDPOINT: &str = "/services/rest/record/v1/inventoryItem";
const PROBE_ENDPOINT: &str = "/services/rest/record/v1/metadata-catalog";

pub struct NetsuiteAdapter {
    config: IntegrationConfig,
    client: HttpClient,
}

impl NetsuiteAdapter {
    pub fn new(config: IntegrationConfig) -> anyhow::Result<Self> {
        let client = HttpClient::new(&config.api)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ErpAdapter for NetsuiteAdapter {
    fn system_type(&self) -> SystemType {
        SystemType::Netsuite
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            system_type: SystemType::Netsuite,
            system_name: self.config.system_name.clone(),
            version: self.config.version.clone(),
        }
    }

    async fn authenticate(&self) -> anyhow::Result<()> {
        self.client.authenticate().await
    }

    async fn test_connection(&self) -> bool {
        if let Err(e) = self.authenticate().await {
            error!("[netsuite] Authentication failed: {}", e);
            return false;
        }
        match self.client.get(PROBE_ENDPOINT).await {
            Ok(_) => true,
            Err(e) => {
                error!("[netsuite] Connection probe failed: {}", e);
                false
            }
        }
    }

    async fn sync_products(&self, direction: SyncDirection) -> anyhow::Result<SyncResult> {
        if !direction.includes_import() {
            debug!("[netsuite] Product export is not implemented");
            return Ok(SyncResult::not_implemented());
        }
        self.authenticate().await?;
        import_entity(
            &self.client,
            INVENTORY_ITEM_ENDPOINT,
            &self.config.data_mapping.products,
            self.config.sync.batch_size,
            EntityKind::Products,
        )
        .await
    }

    async fn sync_orders(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::not_implemented())
    }

    async fn sync_inventory(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::not_implemented())
    }

    async fn sync_clients(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::not_implemented())
    }

    async fn sync_suppliers(&self, _direction: SyncDirection) -> anyhow::Result<SyncResult> {
        Ok(SyncResult::not_implemented())
    }

    async fn handle_webhook(&self, event: &str, payload: &Value) -> anyhow::Result<()> {
        let mapping = self.config.data_mapping.clone();
        dispatch_webhook(SystemType::Netsuite, move |kind| mapping.mapping_for(kind).clone(), event, payload)
    }
}
