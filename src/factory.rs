//! Adapter selection and configuration validation.

use std::sync::Arc;

use log::debug;

use crate::adapters::{
    CustomAdapter, DynamicsAdapter, ErpAdapter, NetsuiteAdapter, OracleAdapter, SapAdapter,
    StandaloneAdapter,
};
use crate::config::{AuthType, IntegrationConfig, SystemType};

/// Construct the adapter variant matching the configured system type.
///
/// Odoo shares the generic REST adapter; standalone maps to the no-op
/// variant.
pub fn create_adapter(config: &IntegrationConfig) -> anyhow::Result<Arc<dyn ErpAdapter>> {
    debug!("Creating {} adapter for '{}'", config.system_type, config.system_name);
    let adapter: Arc<dyn ErpAdapter> = match config.system_type {
        SystemType::Sap => Arc::new(SapAdapter::new(config.clone())?),
        SystemType::Oracle => Arc::new(OracleAdapter::new(config.clone())?),
        SystemType::Netsuite => Arc::new(NetsuiteAdapter::new(config.clone())?),
        SystemType::Dynamics => Arc::new(DynamicsAdapter::new(config.clone())?),
        SystemType::Odoo | SystemType::Custom => Arc::new(CustomAdapter::new(config.clone())?),
        SystemType::Standalone => Arc::new(StandaloneAdapter::new(config.clone())),
    };
    Ok(adapter)
}

/// Check a configuration for completeness before any network activity.
///
/// Returns human-readable problems; an empty list means valid. No side
/// effects.
pub fn validate_configuration(config: &IntegrationConfig) -> Vec<String> {
    let mut errors = Vec::new();

    // Standalone has no remote surface; nothing else to require.
    if config.system_type == SystemType::Standalone {
        return errors;
    }

    if config.api.base_url.trim().is_empty() {
        errors.push(format!(
            "{} configuration requires apiConfig.baseUrl",
            config.system_type
        ));
    }

    match config.api.auth_type {
        AuthType::None => {}
        AuthType::Basic => {
            if config.api.username.is_none() {
                errors.push("Basic auth requires apiConfig.username".to_string());
            }
            if config.api.password.is_none() {
                errors.push("Basic auth requires apiConfig.password".to_string());
            }
        }
        AuthType::Bearer | AuthType::ApiKey => {
            if config.api.api_key.is_none() {
                errors.push(format!(
                    "{:?} auth requires apiConfig.apiKey",
                    config.api.auth_type
                ));
            }
        }
        AuthType::OAuth2 => {
            if config.api.client_id.is_none() {
                errors.push("OAuth2 auth requires apiConfig.clientId".to_string());
            }
            if config.api.client_secret.is_none() {
                errors.push("OAuth2 auth requires apiConfig.clientSecret".to_string());
            }
            if config.api.token_url.is_none() {
                errors.push("OAuth2 auth requires apiConfig.tokenUrl".to_string());
            }
        }
    }

    if config.sync.enabled {
        if config.sync.interval_secs == 0 {
            errors.push("syncConfig.interval must be greater than zero".to_string());
        }
        if config.sync.batch_size == 0 {
            errors.push("syncConfig.batchSize must be greater than zero".to_string());
        }
    }

    if config.webhooks.enabled {
        for (i, endpoint) in config.webhooks.endpoints.iter().enumerate() {
            if endpoint.url.trim().is_empty() {
                errors.push(format!("webhooks.endpoints[{}] is missing a url", i));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ConfigUpdate};

    fn sap_oauth_config() -> IntegrationConfig {
        IntegrationConfig::with_overrides(ConfigUpdate {
            system_type: Some(SystemType::Sap),
            system_name: Some("SAP".to_string()),
            api: Some(ApiConfig {
                base_url: "https://sap.example.com".to_string(),
                auth_type: AuthType::OAuth2,
                client_id: Some("client".to_string()),
                client_secret: Some("secret".to_string()),
                token_url: Some("https://sap.example.com/oauth/token".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn standalone_needs_no_base_url() {
        let config = IntegrationConfig::default();
        assert!(config.api.base_url.is_empty());
        assert!(validate_configuration(&config).is_empty());
    }

    #[test]
    fn complete_sap_oauth_config_is_valid() {
        assert!(validate_configuration(&sap_oauth_config()).is_empty());
    }

    #[test]
    fn sap_oauth_missing_client_secret_is_reported() {
        let mut config = sap_oauth_config();
        config.api.client_secret = None;

        let errors = validate_configuration(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("clientSecret"));
    }

    #[test]
    fn remote_system_without_base_url_is_reported() {
        let mut config = sap_oauth_config();
        config.system_type = SystemType::Oracle;
        config.api.base_url = String::new();

        let errors = validate_configuration(&config);
        assert!(errors.iter().any(|e| e.contains("baseUrl")));
    }

    #[test]
    fn zero_interval_rejected_when_sync_enabled() {
        let mut config = sap_oauth_config();
        config.sync.interval_secs = 0;
        let errors = validate_configuration(&config);
        assert!(errors.iter().any(|e| e.contains("interval")));

        config.sync.enabled = false;
        assert!(validate_configuration(&config).is_empty());
    }

    #[test]
    fn factory_selects_matching_variant() {
        let sap = create_adapter(&sap_oauth_config()).unwrap();
        assert_eq!(sap.system_type(), SystemType::Sap);

        let standalone = create_adapter(&IntegrationConfig::default()).unwrap();
        assert_eq!(standalone.system_type(), SystemType::Standalone);

        let mut odoo_config = sap_oauth_config();
        odoo_config.system_type = SystemType::Odoo;
        let odoo = create_adapter(&odoo_config).unwrap();
        assert_eq!(odoo.system_type(), SystemType::Odoo);
    }
}
