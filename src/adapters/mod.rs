//! Adapter variants implementing the sync contract per external system.
//!
//! Every adapter is stateless apart from an optional OAuth2 token cache, so
//! reconfiguration simply constructs a fresh instance. Variants differ in
//! endpoint paths, response shapes and default field mappings; the shared
//! import/export machinery lives here.

mod custom;
mod dynamics;
mod netsuite;
mod oracle;
mod sap;
mod standalone;

pub use custom::CustomAdapter;
pub use dynamics::DynamicsAdapter;
pub use netsuite::NetsuiteAdapter;
pub use oracle::OracleAdapter;
pub use sap::SapAdapter;
pub use standalone::StandaloneAdapter;

use std::collections::HashMap;

use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::client::HttpClient;
use crate::config::{EntityKind, SyncDirection, SystemType};
use crate::mapping::{map_fields, reverse_map_fields};
use crate::result::SyncResult;

/// Identity of the system an adapter talks to, for status surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub system_type: SystemType,
    pub system_name: String,
    pub version: Option<String>,
}

/// Source of local records for export syncs. The storage layer behind this
/// seam is out of scope here; tests and callers inject their own.
#[async_trait]
pub trait LocalRecordSource: Send + Sync {
    async fn records(&self, kind: EntityKind) -> anyhow::Result<Vec<Value>>;
}

/// The common capability contract across all ERP adapters.
#[async_trait]
pub trait ErpAdapter: Send + Sync {
    fn system_type(&self) -> SystemType;

    fn system_info(&self) -> SystemInfo;

    /// Establish credentials with the remote system. Only OAuth2 variants
    /// perform a network round-trip.
    async fn authenticate(&self) -> anyhow::Result<()>;

    /// Authenticate and issue one lightweight probe. Never propagates an
    /// error; failures are logged and reported as `false`.
    async fn test_connection(&self) -> bool;

    async fn sync_products(&self, direction: SyncDirection) -> anyhow::Result<SyncResult>;
    async fn sync_orders(&self, direction: SyncDirection) -> anyhow::Result<SyncResult>;
    async fn sync_inventory(&self, direction: SyncDirection) -> anyhow::Result<SyncResult>;
    async fn sync_clients(&self, direction: SyncDirection) -> anyhow::Result<SyncResult>;
    async fn sync_suppliers(&self, direction: SyncDirection) -> anyhow::Result<SyncResult>;

    /// Inbound webhook dispatch. Unrecognized events are logged and dropped.
    async fn handle_webhook(&self, event: &str, payload: &Value) -> anyhow::Result<()>;

    /// Dispatch a single-entity sync by kind.
    async fn sync_entity(&self, kind: EntityKind, direction: SyncDirection) -> anyhow::Result<SyncResult> {
        match kind {
            EntityKind::Products => self.sync_products(direction).await,
            EntityKind::Orders => self.sync_orders(direction).await,
            EntityKind::Inventory => self.sync_inventory(direction).await,
            EntityKind::Clients => self.sync_clients(direction).await,
            EntityKind::Suppliers => self.sync_suppliers(direction).await,
        }
    }
}

/// Pull the record array out of a system-shaped list payload.
///
/// Understands OData v4 (`value`), OData v2 (`d.results`), plain REST
/// (`items` / `records`) and bare arrays.
pub(crate) fn extract_records(payload: &Value) -> anyhow::Result<Vec<Value>> {
    if let Some(array) = payload.as_array() {
        return Ok(array.clone());
    }
    for path in [&["value"][..], &["d", "results"], &["items"], &["records"]] {
        let mut node = payload;
        let mut found = true;
        for key in path {
            match node.get(key) {
                Some(next) => node = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            if let Some(array) = node.as_array() {
                return Ok(array.clone());
            }
        }
    }
    anyhow::bail!("Response contained no record list")
}

/// Map a batch of remote records into local shape, accumulating per-record
/// failures without aborting the batch. One bad record must not block the
/// rest.
pub(crate) fn import_records(
    records: &[Value],
    mapping: &HashMap<String, String>,
    batch_size: usize,
) -> SyncResult {
    let mut processed = 0u64;
    let mut errors = Vec::new();

    for chunk in records.chunks(batch_size.max(1)) {
        for record in chunk {
            match record.as_object() {
                Some(object) => {
                    // Translation only; persistence sits above this crate.
                    let _mapped = map_fields(object, mapping);
                    processed += 1;
                }
                None => {
                    errors.push(format!(
                        "record {}: expected a JSON object, got {}",
                        processed as usize + errors.len(),
                        json_type_name(record)
                    ));
                }
            }
        }
    }

    SyncResult::completed(processed, errors)
}

/// Fetch a remote list endpoint and import it through the mapping.
pub(crate) async fn import_entity(
    client: &HttpClient,
    endpoint: &str,
    mapping: &HashMap<String, String>,
    batch_size: usize,
    entity: EntityKind,
) -> anyhow::Result<SyncResult> {
    let payload = client.get(endpoint).await?;
    let records = extract_records(&payload)?;
    info!("Fetched {} remote {} records from {}", records.len(), entity, endpoint);
    Ok(import_records(&records, mapping, batch_size))
}

/// Reverse-map local records and push them to the remote list endpoint in
/// chunks of `batch_size`, awaiting each chunk fully before the next. A
/// failed chunk is recorded and the export continues.
pub(crate) async fn export_records(
    client: &HttpClient,
    endpoint: &str,
    records: &[Value],
    mapping: &HashMap<String, String>,
    batch_size: usize,
) -> SyncResult {
    let mut processed = 0u64;
    let mut errors = Vec::new();

    for chunk in records.chunks(batch_size.max(1)) {
        let mut payload = Vec::with_capacity(chunk.len());
        for record in chunk {
            match record.as_object() {
                Some(object) => payload.push(Value::Object(reverse_map_fields(object, mapping))),
                None => errors.push(format!(
                    "record {}: expected a JSON object, got {}",
                    processed as usize + errors.len(),
                    json_type_name(record)
                )),
            }
        }

        if payload.is_empty() {
            continue;
        }

        let count = payload.len() as u64;
        match client.post(endpoint, &Value::Array(payload)).await {
            Ok(_) => processed += count,
            Err(e) => errors.push(format!("export chunk of {} records failed: {}", count, e)),
        }
    }

    SyncResult::completed(processed, errors)
}

/// Shared webhook dispatch: map the payload for known events and log the
/// normalized record. The recognized event names are a fixed set; everything
/// else is logged and dropped, never an error.
pub(crate) fn dispatch_webhook(
    system: SystemType,
    mapping_for: impl Fn(EntityKind) -> HashMap<String, String>,
    event: &str,
    payload: &Value,
) -> anyhow::Result<()> {
    let kind = match event {
        "product.created" | "product.updated" => EntityKind::Products,
        "order.created" | "order.updated" => EntityKind::Orders,
        "inventory.updated" | "movement.created" => EntityKind::Inventory,
        "client.created" | "client.updated" => EntityKind::Clients,
        "supplier.created" | "supplier.updated" => EntityKind::Suppliers,
        _ => {
            warn!("[{}] Ignoring unrecognized webhook event '{}'", system, event);
            return Ok(());
        }
    };

    let object = payload
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("Webhook payload for '{}' is not a JSON object", event))?;

    let mapped = map_fields(object, &mapping_for(kind));
    info!(
        "[{}] Webhook '{}': normalized {} record with {} fields",
        system,
        event,
        kind,
        mapped.len()
    );
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
