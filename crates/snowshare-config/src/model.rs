//! Configuration data model
//!
//! Field names match the YAML groups one-to-one. The legacy singular data
//! keys survive deserialization only until `normalize` folds them into the
//! `objects` list; nothing downstream ever sees them.

use serde::Deserialize;

/// Validated configuration aggregate for one provisioning run
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    pub provider: ProviderConfig,
    pub reader: ReaderConfig,
    #[serde(default)]
    pub reader_user: Option<ReaderUserConfig>,
    pub share: ShareConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

/// Provider account credentials and role
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub account: String,
    pub user: String,
    pub password: String,
    pub role: String,
}

/// Managed reader account target
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    pub account_name: String,
    pub admin_user: String,
    pub admin_password: String,
    pub warehouse_name: String,
    pub db_name: String,
}

/// End-user login to create inside the reader account
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderUserConfig {
    pub name: String,
    pub email: String,
    pub temp_password: String,
}

/// Share object spec
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    pub name: String,
}

/// Data objects to expose through the share
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub provider_database: String,
    pub shared_schema: String,
    /// Uniform ordered list after normalization
    #[serde(default)]
    pub objects: Vec<DataObjectSpec>,
    /// Legacy singular form; folded into `objects` at load time
    #[serde(default)]
    pub shared_view_name: Option<String>,
    #[serde(default)]
    pub source_table: Option<String>,
    #[serde(default)]
    pub view_where: Option<String>,
}

/// One source-table to secure-view mapping with an optional row filter
#[derive(Debug, Clone, Deserialize)]
pub struct DataObjectSpec {
    pub shared_view_name: String,
    pub source_table: String,
    /// Row filter predicate, interpolated verbatim (leading WHERE optional)
    #[serde(default)]
    pub view_where: Option<String>,
}

/// Optional mail notification channel
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub use_tls: Option<bool>,
    #[serde(default)]
    pub use_ssl: Option<bool>,
}

impl SmtpConfig {
    /// Whether implicit TLS (SMTPS) is requested
    pub fn use_ssl(&self) -> bool {
        self.use_ssl.unwrap_or(false)
    }

    /// Whether STARTTLS is requested; defaults to true unless SMTPS is on
    pub fn use_tls(&self) -> bool {
        if self.use_ssl() {
            false
        } else {
            self.use_tls.unwrap_or(true)
        }
    }

    /// Resolve the port: explicit wins, else 465 (SMTPS), 587 (STARTTLS), 25 (plain)
    pub fn resolved_port(&self) -> u16 {
        if let Some(port) = self.port {
            return port;
        }
        if self.use_ssl() {
            465
        } else if self.use_tls() {
            587
        } else {
            25
        }
    }

    /// Sender address: explicit `from`, else the SMTP user, else a fixed fallback
    pub fn from_address(&self) -> String {
        self.from
            .clone()
            .or_else(|| self.user.clone())
            .unwrap_or_else(|| "no-reply@snowflake".to_string())
    }
}
