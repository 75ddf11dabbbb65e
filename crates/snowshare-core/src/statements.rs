//! Administrative statement builders
//!
//! The fixed statement catalog of the pipeline, parameterized by validated
//! configuration values. Clauses and defaults (warehouse size, auto-suspend
//! interval, forced password change, default role) are part of the wire
//! contract and must not drift.

use snowshare_config::{DataObjectSpec, ReaderUserConfig};

/// Provider step 1: read our own account identifier
pub const CURRENT_ACCOUNT: &str = "SELECT CURRENT_ACCOUNT()";

/// Escape a value for interpolation into a single-quoted string literal
fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn show_schemas(database: &str, schema: &str) -> String {
    format!("SHOW SCHEMAS LIKE '{schema}' IN DATABASE {database}")
}

pub fn create_schema(database: &str, schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {database}.{schema}")
}

/// Normalize a row filter predicate to carry a leading WHERE exactly once
///
/// Empty or whitespace-only predicates collapse to `None`.
pub fn normalize_where(predicate: Option<&str>) -> Option<String> {
    let predicate = predicate.unwrap_or("").trim();
    if predicate.is_empty() {
        return None;
    }
    if predicate.to_lowercase().starts_with("where ") {
        Some(predicate.to_string())
    } else {
        Some(format!("WHERE {predicate}"))
    }
}

/// Secure view over the source table, filter applied verbatim when present
pub fn create_secure_view(database: &str, schema: &str, object: &DataObjectSpec) -> String {
    let mut stmt = format!(
        "CREATE OR REPLACE SECURE VIEW {database}.{schema}.{view} AS\n\
         SELECT *\n\
         FROM {database}.PUBLIC.{table}",
        view = object.shared_view_name,
        table = object.source_table,
    );
    if let Some(where_clause) = normalize_where(object.view_where.as_deref()) {
        stmt.push('\n');
        stmt.push_str(&where_clause);
    }
    stmt
}

pub fn create_share(share: &str) -> String {
    format!("CREATE OR REPLACE SHARE {share}")
}

pub fn grant_database_usage(database: &str, share: &str) -> String {
    format!("GRANT USAGE ON DATABASE {database} TO SHARE {share}")
}

pub fn grant_schema_usage(database: &str, schema: &str, share: &str) -> String {
    format!("GRANT USAGE ON SCHEMA {database}.{schema} TO SHARE {share}")
}

pub fn grant_view_select(database: &str, schema: &str, view: &str, share: &str) -> String {
    format!("GRANT SELECT ON VIEW {database}.{schema}.{view} TO SHARE {share}")
}

pub fn show_managed_accounts(account_name: &str) -> String {
    format!("SHOW MANAGED ACCOUNTS LIKE '{account_name}'")
}

pub fn create_managed_account(account_name: &str, admin_user: &str, admin_password: &str) -> String {
    format!(
        "CREATE MANAGED ACCOUNT {account_name}\n\
         \x20 TYPE = READER\n\
         \x20 ADMIN_NAME = '{admin_user}'\n\
         \x20 ADMIN_PASSWORD = '{admin_password}'\n\
         \x20 COMMENT = 'Managed reader account provisioned by snowshare'",
        admin_user = quote_literal(admin_user),
        admin_password = quote_literal(admin_password),
    )
}

pub fn alter_share_add_account(share: &str, locator: &str) -> String {
    format!("ALTER SHARE {share} ADD ACCOUNTS = {locator}")
}

/// Reader warehouse with fixed sizing defaults: minimal size, short
/// auto-suspend, auto-resume, created suspended to avoid idle billing
pub fn create_warehouse(warehouse: &str) -> String {
    format!(
        "CREATE OR REPLACE WAREHOUSE {warehouse}\n\
         \x20 WAREHOUSE_SIZE = 'XSMALL'\n\
         \x20 AUTO_SUSPEND = 60\n\
         \x20 AUTO_RESUME = TRUE\n\
         \x20 INITIALLY_SUSPENDED = TRUE"
    )
}

/// Reader database imported from the provider's share; the cross-phase
/// dependency on the provider account identifier
pub fn create_database_from_share(database: &str, provider_account: &str, share: &str) -> String {
    format!(
        "CREATE OR REPLACE DATABASE {database}\n\
         \x20 FROM SHARE {provider_account}.{share}"
    )
}

pub fn grant_imported_privileges(database: &str) -> String {
    format!("GRANT IMPORTED PRIVILEGES ON DATABASE {database} TO ROLE PUBLIC")
}

pub fn grant_warehouse_usage(warehouse: &str) -> String {
    format!("GRANT USAGE ON WAREHOUSE {warehouse} TO ROLE PUBLIC")
}

pub fn show_users(user_name: &str) -> String {
    format!("SHOW USERS LIKE '{user_name}'")
}

pub fn create_user(user: &ReaderUserConfig, default_warehouse: &str) -> String {
    format!(
        "CREATE USER {name}\n\
         \x20 LOGIN_NAME = '{name}'\n\
         \x20 PASSWORD = '{password}'\n\
         \x20 MUST_CHANGE_PASSWORD = TRUE\n\
         \x20 DEFAULT_ROLE = 'PUBLIC'\n\
         \x20 DEFAULT_WAREHOUSE = '{default_warehouse}'\n\
         \x20 EMAIL = '{email}'",
        name = user.name,
        password = quote_literal(&user.temp_password),
        email = quote_literal(&user.email),
    )
}

/// Non-destructive user update: email, defaults, never the password
pub fn alter_user(user: &ReaderUserConfig, default_warehouse: &str) -> String {
    format!(
        "ALTER USER {name}\n\
         \x20 SET EMAIL = '{email}',\n\
         \x20     DEFAULT_WAREHOUSE = '{default_warehouse}',\n\
         \x20     DEFAULT_ROLE = 'PUBLIC'",
        name = user.name,
        email = quote_literal(&user.email),
    )
}

pub fn use_warehouse(warehouse: &str) -> String {
    format!("USE WAREHOUSE {warehouse}")
}

pub fn use_database(database: &str) -> String {
    format!("USE DATABASE {database}")
}

pub fn use_schema(schema: &str) -> String {
    format!("USE SCHEMA {schema}")
}

pub fn count_view_rows(view: &str) -> String {
    format!("SELECT COUNT(*) FROM {view}")
}
