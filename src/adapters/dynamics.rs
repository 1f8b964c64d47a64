//! Microsoft Dynamics 365 adapter (Web API).

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;

use super::{dispatch_webhook, import_entity, ErpAdapter, SystemInfo};
use crate::client::HttpClient;
use crate::config::{EntityKind, IntegrationConfig, SyncDirection, SystemType};
use crate::result::SyncResult;

const PRODUCTS_ENDPOINT: &str = "/api/data/v9.2/products";
const PROBE_ENDPOINT: &str = "/api/data/v9.2/WhoAmI";

pub struct DynamicsAdapter {
    config: IntegrationConfig,
    client: HttpClient,
}

impl DynamicsAdapter {
    pub fn new(config: IntegrationConfig) -> anyhow::Result<Self> {
        let client = HttpClient::new(&config.api)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ErpAdapter for DynamicsAdapter {
    fn system_type(&self) -> SystemType {
        SystemType::Dynamics
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            system_type: SystemType::Dynamics,
            system_name: self.config.system_name.clone(),
            version: self.config.version.clone(),
        }
    }

    async fn authenticate(&self) -> anyhow::Result<()> {
        self.client.authenticate().await
    }

    async fn test_connection(&self) -> bool {
        if let Err(e) = self.authenticate().await {
            error!("[dynamics] Authentication failed: {}", e);
            return false;
        }
        match self.client.get(PROBE_ENDPOINT).await {
            Ok(_) => true,
            Err(e) => {
                error!("[dynamics] Connection probe failed: {}", e);
                false
            }
        }
    }

    async fn sync_products(&self, direction: SyncDirection) -> anyhow::Result<SyncResult> {
        if !direction.includes_import() {
            debug!("[dynamics] Product export is not implemented");
            return Ok(SyncResult::not_implemented());
        }
        self.authenticate().await?;
        import_entity(
            &self.client,
            PRODUCTS_ENDPOINT,
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
        dispatch_webhook(SystemType::Dynamics, move |kind| mapping.mapping_for(kind).clone(), event, payload)
    }
}
