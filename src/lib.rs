//! ERP integration and synchronization core.
//!
//! An [`IntegrationManager`] owns one adapter (selected by the factory from
//! an [`IntegrationConfig`]) and drives full or per-entity synchronization
//! against the remote system, optionally on a recurring timer. The HTTP
//! route layer sits above this crate and is out of scope.

pub mod adapters;
pub mod auth;
pub mod client;
pub mod config;
pub mod factory;
pub mod manager;
pub mod mapping;
pub mod resilience;
pub mod result;

pub use adapters::{ErpAdapter, LocalRecordSource, SystemInfo};
pub use config::{
    ApiConfig, AuthType, BusinessRules, ConfigUpdate, DataMapping, EntityKind, IntegrationConfig,
    SyncConfig, SyncDirection, SystemType, WebhookConfig, WebhookEndpoint,
};
pub use factory::{create_adapter, validate_configuration};
pub use manager::{IntegrationManager, SyncStatus};
pub use mapping::{map_fields, reverse_map_fields};
pub use result::{SyncResult, SyncState};
