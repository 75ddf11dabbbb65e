//! Reader phase
//!
//! Runs inside the managed reader account: warehouse, database from the
//! provider's share, public grants, end-user login, and a best-effort
//! validation read over every shared view.

use tracing::{info, warn};

use snowshare_config::ProvisioningConfig;
use snowshare_errors::Result;
use snowshare_session::Session;

use crate::provider::ProviderOutcome;
use crate::reconcile;
use crate::statements;

/// Result of the reader phase, consumed by the notification gate
#[derive(Debug, Clone)]
pub struct ReaderOutcome {
    /// Whether the end-user login was created this run (false on update
    /// and when no user is configured)
    pub user_created: bool,
    /// Diagnostic row counts per created view; `None` when the validation
    /// read failed
    pub view_row_counts: Vec<(String, Option<i64>)>,
}

/// Run the reader phase against an open session on the managed account
pub fn run_reader_phase(
    session: &mut dyn Session,
    cfg: &ProvisioningConfig,
    provider: &ProviderOutcome,
) -> Result<ReaderOutcome> {
    let warehouse = &cfg.reader.warehouse_name;
    let database = &cfg.reader.db_name;

    // 1. Warehouse with fixed sizing defaults
    session
        .exec(&statements::create_warehouse(warehouse))
        .map_err(|e| e.with_step("create_warehouse"))?;
    info!(warehouse, "warehouse ensured");

    // 2. Database from the share; consumes the provider account identifier
    session
        .exec(&statements::create_database_from_share(
            database,
            &provider.provider_account_id,
            &cfg.share.name,
        ))
        .map_err(|e| e.with_step("create_database_from_share"))?;
    info!(database, "shared database ensured");

    // 3. Idempotent grants, always re-issued
    session
        .exec(&statements::grant_imported_privileges(database))
        .map_err(|e| e.with_step("grant_reader_privileges"))?;
    session
        .exec(&statements::grant_warehouse_usage(warehouse))
        .map_err(|e| e.with_step("grant_reader_privileges"))?;

    // 4. End-user login, non-destructive on re-runs
    let user_created = match &cfg.reader_user {
        None => {
            info!("no reader_user configured, skipping user step");
            false
        }
        Some(user) => {
            let existed = reconcile::ensure_configured(
                session,
                "ensure_reader_user",
                &statements::show_users(&user.name),
                &statements::create_user(user, warehouse),
                &statements::alter_user(user, warehouse),
            )?;
            if existed {
                info!(user = %user.name, "user updated, password untouched");
            } else {
                info!(user = %user.name, "user created");
            }
            !existed
        }
    };

    // 5. Validation read; share contents can lag, so never fatal
    let view_row_counts = validate_views(session, cfg, provider);

    Ok(ReaderOutcome {
        user_created,
        view_row_counts,
    })
}

/// Best-effort row-count read over every created view
///
/// Failures and zero counts are warnings; the result records `None` for
/// views whose count could not be read.
fn validate_views(
    session: &mut dyn Session,
    cfg: &ProvisioningConfig,
    provider: &ProviderOutcome,
) -> Vec<(String, Option<i64>)> {
    let context = [
        statements::use_warehouse(&cfg.reader.warehouse_name),
        statements::use_database(&cfg.reader.db_name),
        statements::use_schema(&cfg.data.shared_schema),
    ];
    for stmt in &context {
        if let Err(e) = session.exec(stmt) {
            warn!(error = %e, "validation context setup failed, skipping view checks");
            return provider
                .view_names
                .iter()
                .map(|view| (view.clone(), None))
                .collect();
        }
    }

    provider
        .view_names
        .iter()
        .map(|view| {
            let count = match session.query(&statements::count_view_rows(view)) {
                Ok(rows) => rows
                    .first()
                    .and_then(|r| r.first())
                    .and_then(|c| c.as_deref())
                    .and_then(|c| c.parse::<i64>().ok()),
                Err(e) => {
                    warn!(view = %view, error = %e, "validation read failed");
                    None
                }
            };
            match count {
                Some(0) => warn!(view = %view, "validation read returned zero rows"),
                Some(n) => info!(view = %view, rows = n, "validation read ok"),
                None => {}
            }
            (view.clone(), count)
        })
        .collect()
}
