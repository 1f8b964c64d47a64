//! Generic REST adapter for custom (and Odoo-style) backends.
//!
//! The only variant with a substantive export path: product syncs run both
//! directions when asked. Local records for export come through an injected
//! [`LocalRecordSource`]; without one, exports push nothing.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;

use super::{dispatch_webhook, export_records, import_entity, ErpAdapter, LocalRecordSource, SystemInfo};
use crate::client::HttpClient;
use crate::config::{EntityKind, IntegrationConfig, SyncDirection, SystemType};
use crate::result::SyncResult;

const PRODUCTS_ENDPOINT: &str = "/products";
const PROBE_ENDPOINT: &str = "/health";

pub struct CustomAdapter {
    config: IntegrationConfig,
    client: HttpClient,
    source: Option<Arc<dyn LocalRecordSource>>,
}

impl CustomAdapter {
    pub fn new(config: IntegrationConfig) -> anyhow::Result<Self> {
        let client = HttpClient::new(&config.api)?;
        Ok(Self {
            config,
            client,
            source: None,
        })
    }

    /// Attach a source of local records for export syncs.
    pub fn with_local_source(config: IntegrationConfig, source: Arc<dyn LocalRecordSource>) -> anyhow::Result<Self> {
        let mut adapter = Self::new(config)?;
        adapter.source = Some(source);
        Ok(adapter)
    }

    async fn local_records(&self, kind: EntityKind) -> anyhow::Result<Vec<Value>> {
        match &self.source {
            Some(source) => source.records(kind).await,
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl ErpAdapter for CustomAdapter {
    fn system_type(&self) -> SystemType {
        // Also backs Odoo-typed configurations.
        self.config.system_type
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            system_type: self.config.system_type,
            system_name: self.config.system_name.clone(),
            version: self.config.version.clone(),
        }
    }

    async fn authenticate(&self) -> anyhow::Result<()> {
        self.client.authenticate().await
    }

    async fn test_connection(&self) -> bool {
        if let Err(e) = self.authenticate().await {
            error!("[custom] Authentication failed: {}", e);
            return false;
        }
        match self.client.get(PROBE_ENDPOINT).await {
            Ok(_) => true,
            Err(e) => {
                error!("[custom] Connection probe failed: {}", e);
                false
            }
        }
    }

    async fn sync_products(&self, direction: SyncDirection) -> anyhow::Result<SyncResult> {
        self.authenticate().await?;

        let mapping = &self.config.data_mapping.products;
        let batch_size = self.config.sync.batch_size;
        let mut processed = 0u64;
        let mut errors = Vec::new();

        if direction.includes_import() {
            let imported = import_entity(
                &self.client,
                PRODUCTS_ENDPOINT,
                mapping,
                batch_size,
                EntityKind::Products,
            )
            .await?;
            processed += imported.records_processed;
            errors.extend(imported.errors);
        }

        if direction.includes_export() {
            let local = self.local_records(EntityKind::Products).await?;
            debug!("[custom] Exporting {} local product records", local.len());
            let exported = export_records(&self.client, PRODUCTS_ENDPOINT, &local, mapping, batch_size).await;
            processed += exported.records_processed;
            errors.extend(exported.errors);
        }

        Ok(SyncResult::completed(processed, errors))
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
        let system = self.config.system_type;
        let mapping = self.config.data_mapping.clone();
        dispatch_webhook(system, move |kind| mapping.mapping_for(kind).clone(), event, payload)
    }
}
