//! Connection parameters and report settings.

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS};
use crate::calendar::FiscalCalendar;
use crate::comparison::TableLabels;
use crate::error::{ReportError, Result};
use crate::format::FormatStyle;
use crate::utils::validate_fiscal_start_month;
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Service-account parameters needed to reach the ledger backend.
///
/// Acquiring the credentials is the host's job; this type only gathers them
/// and refuses to proceed while any are absent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub account_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
}

impl ConnectionConfig {
    /// Environment variable names, in the order they are reported when missing.
    pub const VARIABLES: [&'static str; 10] = [
        "GCP_TYPE",
        "GCP_PROJECT_ID",
        "GCP_PRIVATE_KEY_ID",
        "GCP_PRIVATE_KEY",
        "GCP_CLIENT_EMAIL",
        "GCP_CLIENT_ID",
        "GCP_AUTH_URI",
        "GCP_TOKEN_URI",
        "GCP_AUTH_PROVIDER_X509_CERT_URL",
        "GCP_CLIENT_X509_CERT_URL",
    ];

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads every parameter through `lookup`.
    ///
    /// Blank values count as missing. All missing names are collected before
    /// failing, so one error lists everything the operator has to set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut values: Vec<String> = Vec::with_capacity(Self::VARIABLES.len());
        let mut missing: Vec<String> = Vec::new();

        for name in Self::VARIABLES {
            match lookup(name).filter(|value| !value.trim().is_empty()) {
                Some(value) => values.push(value),
                None => {
                    missing.push(name.to_string());
                    values.push(String::new());
                }
            }
        }

        if !missing.is_empty() {
            return Err(ReportError::Configuration { missing });
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let config = Self {
            account_type: next(),
            project_id: next(),
            private_key_id: next(),
            private_key: next(),
            client_email: next(),
            client_id: next(),
            auth_uri: next(),
            token_uri: next(),
            auth_provider_x509_cert_url: next(),
            client_x509_cert_url: next(),
        };

        info!(
            "Loaded ledger connection parameters for project {}",
            config.project_id
        );
        Ok(config)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("account_type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &"<redacted>")
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Tunable behaviour of the summary reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReportSettings {
    #[schemars(description = "Month the fiscal year starts in (1 = January, 10 = October)")]
    pub fiscal_year_start_month: u32,

    #[schemars(description = "Seconds a ledger query result stays cached")]
    pub cache_ttl_secs: u64,

    #[schemars(description = "Maximum number of cached results per query kind")]
    pub cache_capacity: u64,

    #[schemars(description = "Currency and number formatting")]
    pub format: FormatStyle,

    #[schemars(description = "Column headings of the client comparison table")]
    pub labels: TableLabels,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            fiscal_year_start_month: FiscalCalendar::DEFAULT_START_MONTH,
            cache_ttl_secs: DEFAULT_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            format: FormatStyle::default(),
            labels: TableLabels::default(),
        }
    }
}

impl ReportSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fiscal_start_month(self.fiscal_year_start_month)?;

        if self.cache_ttl_secs == 0 {
            return Err(ReportError::InvalidSetting(
                "cache_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(ReportError::InvalidSetting(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn calendar(&self) -> Result<FiscalCalendar> {
        FiscalCalendar::new(self.fiscal_year_start_month)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportSettings)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NegativeStyle;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        ConnectionConfig::VARIABLES
            .iter()
            .map(|name| (*name, format!("value-of-{}", name)))
            .collect()
    }

    #[test]
    fn test_connection_config_from_complete_lookup() {
        let env = full_env();
        let config = ConnectionConfig::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert_eq!(config.project_id, "value-of-GCP_PROJECT_ID");
        assert_eq!(config.client_x509_cert_url, "value-of-GCP_CLIENT_X509_CERT_URL");
    }

    #[test]
    fn test_connection_config_reports_every_missing_variable() {
        let mut env = full_env();
        env.remove("GCP_PRIVATE_KEY");
        env.remove("GCP_TOKEN_URI");
        env.insert("GCP_CLIENT_ID", "   ".to_string());

        let err = ConnectionConfig::from_lookup(|name| env.get(name).cloned()).unwrap_err();
        match &err {
            ReportError::Configuration { missing } => assert_eq!(
                missing,
                &vec!["GCP_PRIVATE_KEY", "GCP_CLIENT_ID", "GCP_TOKEN_URI"]
            ),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            err.user_message(),
            "Missing environment variables: GCP_PRIVATE_KEY, GCP_CLIENT_ID, GCP_TOKEN_URI"
        );
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let env = full_env();
        let config = ConnectionConfig::from_lookup(|name| env.get(name).cloned()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("value-of-GCP_PRIVATE_KEY"));
        assert!(debug.contains("value-of-GCP_PROJECT_ID"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ReportSettings::default();
        assert_eq!(settings.fiscal_year_start_month, 10);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(600));
        assert_eq!(settings.format.currency_symbol, "£");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_partial_json_keeps_defaults() {
        let settings = ReportSettings::from_json_str(
            r#"{ "fiscal_year_start_month": 4, "format": { "negative_style": "sign" } }"#,
        )
        .unwrap();
        assert_eq!(settings.fiscal_year_start_month, 4);
        assert_eq!(settings.format.negative_style, NegativeStyle::Sign);
        assert_eq!(settings.format.currency_symbol, "£");
        assert_eq!(settings.labels.entity, "Client name");
        assert_eq!(settings.calendar().unwrap().start_month(), 4);
    }

    #[test]
    fn test_settings_validation() {
        assert!(matches!(
            ReportSettings::from_json_str(r#"{ "fiscal_year_start_month": 0 }"#),
            Err(ReportError::InvalidFiscalStartMonth(0))
        ));
        assert!(matches!(
            ReportSettings::from_json_str(r#"{ "cache_ttl_secs": 0 }"#),
            Err(ReportError::InvalidSetting(_))
        ));
        assert!(matches!(
            ReportSettings::from_json_str("{ not json"),
            Err(ReportError::SerializationError(_))
        ));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ReportSettings::schema_as_json().unwrap();
        assert!(schema_json.contains("fiscal_year_start_month"));
        assert!(schema_json.contains("negative_style"));
    }
}
