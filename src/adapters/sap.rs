//! SAP S/4HANA adapter (OData v2 material master API).
//!
//! Product import is substantive; the remaining entity syncs are declared
//! stubs until the corresponding OData services are wired up.

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;

use super::{dispatch_webhook, import_entity, ErpAdapter, SystemInfo};
use crate::client::HttpClient;
use crate::config::{EntityKind, IntegrationConfig, SyncDirection, SystemType};
use crate::result::SyncResult;

const PRODUCTS_ENDPOINT: &str = "/sap/opu/odata/sap/API_MATERIAL_SRV/A_Product";
const PROBE_ENDPOINT: &str = "/sap/opu/odata/sap/API_MATERIAL_SRV/$metadata";

pub struct SapAdapter {
    config: IntegrationConfig,
    client: HttpClient,
}

impl SapAdapter {
    pub fn new(config: IntegrationConfig) -> anyhow::Result<Self> {
        let client = HttpClient::new(&config.api)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ErpAdapter for SapAdapter {
    fn system_type(&self) -> SystemType {
        SystemType::Sap
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            system_type: SystemType::Sap,
            system_name: self.config.system_name.clone(),
            version: self.config.version.clone(),
        }
    }

    async fn authenticate(&self) -> anyhow::Result<()> {
        self.client.authenticate().await
    }

    async fn test_connection(&self) -> bool {
        if let Err(e) = self.authenticate().await {
            error!("[sap] Authentication failed: {}", e);
            return false;
        }
        match self.client.get(PROBE_ENDPOINT).await {
            Ok(_) => true,
            Err(e) => {
                error!("[sap] Connection probe failed: {}", e);
                false
            }
        }
    }

    async fn sync_products(&self, direction: SyncDirection) -> anyhow::Result<SyncResult> {
        if !direction.includes_import() {
            debug!("[sap] Product export is not implemented");
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
        dispatch_webhook(SystemType::Sap, move |kind| mapping.mapping_for(kind).clone(), event, payload)
    }
}
