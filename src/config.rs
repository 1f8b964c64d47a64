//! Integration configuration aggregate.
//!
//! The configuration crosses a JSON boundary from a settings UI, so everything
//! here serializes with camelCase field names. The manager owns the live
//! config; adapters receive a copy at construction time and never observe
//! later mutations (reconfiguration rebuilds the adapter).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The external system a configuration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemType {
    Sap,
    Oracle,
    Netsuite,
    Dynamics,
    Odoo,
    Custom,
    Standalone,
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemType::Sap => "sap",
            SystemType::Oracle => "oracle",
            SystemType::Netsuite => "netsuite",
            SystemType::Dynamics => "dynamics",
            SystemType::Odoo => "odoo",
            SystemType::Custom => "custom",
            SystemType::Standalone => "standalone",
        };
        write!(f, "{}", name)
    }
}

/// Authentication scheme used by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    None,
    Basic,
    Bearer,
    #[serde(rename = "apikey")]
    ApiKey,
    OAuth2,
}

/// Whether a sync pulls from the remote system, pushes to it, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    #[default]
    Bidirectional,
    ImportOnly,
    ExportOnly,
}

impl SyncDirection {
    pub fn includes_import(&self) -> bool {
        matches!(self, SyncDirection::Bidirectional | SyncDirection::ImportOnly)
    }

    pub fn includes_export(&self) -> bool {
        matches!(self, SyncDirection::Bidirectional | SyncDirection::ExportOnly)
    }
}

/// The five entity kinds a full sync covers, in sync order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Products,
    Orders,
    Inventory,
    Clients,
    Suppliers,
}

impl EntityKind {
    /// Fixed order used by a full sync pass.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Products,
        EntityKind::Orders,
        EntityKind::Inventory,
        EntityKind::Clients,
        EntityKind::Suppliers,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Products => "products",
            EntityKind::Orders => "orders",
            EntityKind::Inventory => "inventory",
            EntityKind::Clients => "clients",
            EntityKind::Suppliers => "suppliers",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" => Ok(EntityKind::Products),
            "orders" => Ok(EntityKind::Orders),
            "inventory" | "movements" => Ok(EntityKind::Inventory),
            "clients" => Ok(EntityKind::Clients),
            "suppliers" => Ok(EntityKind::Suppliers),
            other => Err(anyhow::anyhow!("Unsupported entity type: {}", other)),
        }
    }
}

/// Connection settings for the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_type: AuthType,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    /// Retries after the initial attempt.
    pub retry_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_type: AuthType::None,
            username: None,
            password: None,
            api_key: None,
            client_id: None,
            client_secret: None,
            token_url: None,
            timeout_ms: 30_000,
            retry_attempts: 3,
        }
    }
}

/// Local-field → remote-field dictionaries, one per entity kind.
///
/// Inventory syncs translate stock movements, hence the `movements` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataMapping {
    pub products: HashMap<String, String>,
    pub orders: HashMap<String, String>,
    pub movements: HashMap<String, String>,
    pub clients: HashMap<String, String>,
    pub suppliers: HashMap<String, String>,
}

impl DataMapping {
    pub fn mapping_for(&self, kind: EntityKind) -> &HashMap<String, String> {
        match kind {
            EntityKind::Products => &self.products,
            EntityKind::Orders => &self.orders,
            EntityKind::Inventory => &self.movements,
            EntityKind::Clients => &self.clients,
            EntityKind::Suppliers => &self.suppliers,
        }
    }

    /// Sensible starting dictionaries per target system.
    pub fn defaults_for(system_type: SystemType) -> Self {
        fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
            pairs
                .iter()
                .map(|(l, r)| (l.to_string(), r.to_string()))
                .collect()
        }

        match system_type {
            SystemType::Sap => Self {
                products: map(&[
                    ("sku", "Product"),
                    ("name", "ProductDescription"),
                    ("price", "StandardPrice"),
                    ("unit", "BaseUnit"),
                ]),
                movements: map(&[
                    ("sku", "Material"),
                    ("quantity", "QuantityInBaseUnit"),
                    ("warehouse", "Plant"),
                ]),
                ..Default::default()
            },
            SystemType::Oracle => Self {
                products: map(&[
                    ("sku", "ItemNumber"),
                    ("name", "ItemDescription"),
                    ("price", "ListPrice"),
                    ("unit", "PrimaryUOMValue"),
                ]),
                ..Default::default()
            },
            SystemType::Netsuite => Self {
                products: map(&[
                    ("sku", "itemId"),
                    ("name", "displayName"),
                    ("price", "basePrice"),
                ]),
                ..Default::default()
            },
            SystemType::Dynamics => Self {
                products: map(&[
                    ("sku", "productnumber"),
                    ("name", "name"),
                    ("price", "price"),
                ]),
                ..Default::default()
            },
            _ => Self {
                products: map(&[
                    ("sku", "sku"),
                    ("name", "name"),
                    ("price", "price"),
                    ("quantity", "quantity"),
                ]),
                ..Default::default()
            },
        }
    }
}

/// Synchronization behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub direction: SyncDirection,
    /// Auto-sync interval in seconds.
    #[serde(rename = "interval")]
    pub interval_secs: u64,
    pub batch_size: usize,
    pub auto_sync: bool,
    /// Policy name only; resolution itself happens elsewhere.
    pub conflict_resolution: String,
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direction: SyncDirection::Bidirectional,
            interval_secs: 3600,
            batch_size: 100,
            auto_sync: false,
            conflict_resolution: "newest_wins".to_string(),
            last_sync_time: None,
        }
    }
}

/// A single outbound webhook registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEndpoint {
    pub event: String,
    pub url: String,
    pub secret: Option<String>,
    #[serde(default = "default_webhook_retries")]
    pub retry_attempts: u32,
}

fn default_webhook_retries() -> u32 {
    3
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub endpoints: Vec<WebhookEndpoint>,
}

/// Booleans governing stock behaviour on the local side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessRules {
    pub allow_negative_stock: bool,
    pub require_approval: bool,
    pub auto_purchase_orders: bool,
    pub enforce_min_max: bool,
    pub track_serial_numbers: bool,
    pub track_batches: bool,
    pub track_expiry: bool,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            allow_negative_stock: false,
            require_approval: false,
            auto_purchase_orders: false,
            enforce_min_max: true,
            track_serial_numbers: false,
            track_batches: false,
            track_expiry: false,
        }
    }
}

/// The full configuration aggregate owned by the integration manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationConfig {
    pub system_type: SystemType,
    pub system_name: String,
    pub version: Option<String>,
    #[serde(rename = "apiConfig")]
    pub api: ApiConfig,
    pub data_mapping: DataMapping,
    #[serde(rename = "syncConfig")]
    pub sync: SyncConfig,
    pub webhooks: WebhookConfig,
    pub business_rules: BusinessRules,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            system_type: SystemType::Standalone,
            system_name: "Standalone".to_string(),
            version: None,
            api: ApiConfig::default(),
            data_mapping: DataMapping::defaults_for(SystemType::Standalone),
            sync: SyncConfig::default(),
            webhooks: WebhookConfig::default(),
            business_rules: BusinessRules::default(),
        }
    }
}

impl IntegrationConfig {
    /// Build a config by overlaying caller overrides on the defaults.
    pub fn with_overrides(update: ConfigUpdate) -> Self {
        let mut config = Self::default();
        config.apply(update);
        config
    }

    /// Shallow merge: a supplied section replaces the stored section
    /// wholesale. Callers must pass complete nested objects.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(system_type) = update.system_type {
            self.system_type = system_type;
        }
        if let Some(system_name) = update.system_name {
            self.system_name = system_name;
        }
        if let Some(version) = update.version {
            self.version = Some(version);
        }
        if let Some(api) = update.api {
            self.api = api;
        }
        if let Some(data_mapping) = update.data_mapping {
            self.data_mapping = data_mapping;
        }
        if let Some(sync) = update.sync {
            self.sync = sync;
        }
        if let Some(webhooks) = update.webhooks {
            self.webhooks = webhooks;
        }
        if let Some(business_rules) = update.business_rules {
            self.business_rules = business_rules;
        }
    }
}

/// Partial configuration overlay accepted by `update_configuration`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub system_type: Option<SystemType>,
    pub system_name: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "apiConfig")]
    pub api: Option<ApiConfig>,
    pub data_mapping: Option<DataMapping>,
    #[serde(rename = "syncConfig")]
    pub sync: Option<SyncConfig>,
    pub webhooks: Option<WebhookConfig>,
    pub business_rules: Option<BusinessRules>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_standalone() {
        let config = IntegrationConfig::default();
        assert_eq!(config.system_type, SystemType::Standalone);
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.api.retry_attempts, 3);
        assert_eq!(config.sync.batch_size, 100);
        assert!(!config.sync.auto_sync);
    }

    #[test]
    fn apply_replaces_sections_wholesale() {
        let mut config = IntegrationConfig::default();
        config.api.api_key = Some("key".to_string());

        config.apply(ConfigUpdate {
            api: Some(ApiConfig {
                base_url: "https://erp.example.com".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });

        // Shallow merge drops sibling fields not present in the new section.
        assert_eq!(config.api.base_url, "https://erp.example.com");
        assert_eq!(config.api.api_key, None);
    }

    #[test]
    fn config_deserializes_from_camel_case_json() {
        let json = serde_json::json!({
            "systemType": "sap",
            "systemName": "SAP S/4HANA",
            "apiConfig": {
                "baseUrl": "https://sap.example.com",
                "authType": "oauth2",
                "clientId": "abc",
                "clientSecret": "shh",
                "tokenUrl": "https://sap.example.com/oauth/token",
                "timeout": 10000,
                "retryAttempts": 2
            },
            "syncConfig": {
                "enabled": true,
                "direction": "import_only",
                "interval": 900,
                "autoSync": true
            }
        });

        let config: IntegrationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.system_type, SystemType::Sap);
        assert_eq!(config.api.auth_type, AuthType::OAuth2);
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.sync.direction, SyncDirection::ImportOnly);
        assert_eq!(config.sync.interval_secs, 900);
        assert!(config.sync.auto_sync);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.sync.batch_size, 100);
    }

    #[test]
    fn entity_kind_parses_known_names_only() {
        assert_eq!("products".parse::<EntityKind>().unwrap(), EntityKind::Products);
        assert_eq!("movements".parse::<EntityKind>().unwrap(), EntityKind::Inventory);
        let err = "invoices".parse::<EntityKind>().unwrap_err();
        assert!(err.to_string().contains("invoices"));
    }
}
