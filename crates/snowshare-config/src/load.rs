//! Configuration loading with normalization and validation
//!
//! Parse YAML, fold the legacy singular data keys into `objects`, then
//! validate every name that gets interpolated into a statement.

use std::fs;
use std::path::Path;

use snowshare_errors::{ProvisionError, Result};

use crate::model::{DataObjectSpec, ProvisioningConfig};

/// Load, normalize and validate a configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProvisioningConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        ProvisionError::config(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;
    parse_config_str(&content)
}

/// Parse a configuration from a YAML string (normalized and validated)
pub fn parse_config_str(content: &str) -> Result<ProvisioningConfig> {
    let mut cfg: ProvisioningConfig = serde_yaml::from_str(content)
        .map_err(|e| ProvisionError::config(format!("YAML parse error: {}", e)))?;

    normalize(&mut cfg)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Fold the legacy singular data keys into a one-element `objects` list
///
/// The rest of the pipeline never branches on which form was supplied.
fn normalize(cfg: &mut ProvisioningConfig) -> Result<()> {
    let data = &mut cfg.data;
    if data.objects.is_empty() {
        match (data.shared_view_name.take(), data.source_table.take()) {
            (Some(view), Some(table)) => {
                data.objects.push(DataObjectSpec {
                    shared_view_name: view,
                    source_table: table,
                    view_where: data.view_where.take(),
                });
            }
            _ => {
                return Err(ProvisionError::config(
                    "data must provide an 'objects' list or legacy \
                     'shared_view_name'/'source_table' keys",
                ));
            }
        }
    }
    // Legacy keys are ignored when an objects list is present
    data.shared_view_name = None;
    data.source_table = None;
    data.view_where = None;
    Ok(())
}

/// Validate required fields and statement-safe identifiers
fn validate(cfg: &ProvisioningConfig) -> Result<()> {
    require("provider.account", &cfg.provider.account)?;
    require("provider.user", &cfg.provider.user)?;
    require("provider.password", &cfg.provider.password)?;
    validate_identifier("provider.role", &cfg.provider.role)?;

    require("reader.admin_user", &cfg.reader.admin_user)?;
    require("reader.admin_password", &cfg.reader.admin_password)?;
    validate_identifier("reader.account_name", &cfg.reader.account_name)?;
    validate_identifier("reader.warehouse_name", &cfg.reader.warehouse_name)?;
    validate_identifier("reader.db_name", &cfg.reader.db_name)?;

    validate_identifier("share.name", &cfg.share.name)?;
    validate_identifier("data.provider_database", &cfg.data.provider_database)?;
    validate_identifier("data.shared_schema", &cfg.data.shared_schema)?;

    for (idx, obj) in cfg.data.objects.iter().enumerate() {
        validate_identifier(
            &format!("data.objects[{}].shared_view_name", idx),
            &obj.shared_view_name,
        )?;
        validate_identifier(
            &format!("data.objects[{}].source_table", idx),
            &obj.source_table,
        )?;
    }

    if let Some(user) = &cfg.reader_user {
        validate_identifier("reader_user.name", &user.name)?;
        require("reader_user.email", &user.email)?;
        require("reader_user.temp_password", &user.temp_password)?;
    }

    Ok(())
}

/// Reject empty required fields
fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProvisionError::config(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

/// Reject names that are not safe to interpolate into a statement
///
/// Allowed: ASCII letters, digits, underscore and dollar, not starting
/// with a digit. This is the unquoted-identifier subset.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    require(field, value)?;
    let mut chars = value.chars();
    let first = chars.next().unwrap_or('0');
    let head_ok = first.is_ascii_alphabetic() || first == '_' || first == '$';
    let tail_ok = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !head_ok || !tail_ok {
        return Err(ProvisionError::config(format!(
            "'{}' is not a safe identifier: '{}'",
            field, value
        )));
    }
    Ok(())
}
