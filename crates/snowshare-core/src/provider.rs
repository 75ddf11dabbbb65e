//! Provider phase
//!
//! Runs against the provider account: secure views, share and grants,
//! managed reader account, share attachment. Produces the identifiers the
//! reader phase needs.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use snowshare_config::ProvisioningConfig;
use snowshare_errors::{classify_conflict, ProvisionError, Result};
use snowshare_session::{Row, Session};

use crate::reconcile;
use crate::statements;

/// How long to let a freshly created managed account register before the
/// locator lookup
pub const ACCOUNT_REGISTRATION_WAIT: Duration = Duration::from_secs(5);

/// Identifiers produced by the provider phase; immutable once returned
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    /// CURRENT_ACCOUNT() of the provider, referenced by the reader's
    /// database-from-share statement
    pub provider_account_id: String,
    /// Locator of the managed reader account
    pub reader_locator: String,
    /// Login URL of the managed reader account
    pub reader_url: String,
    /// Secure view names created this run, in configuration order
    pub view_names: Vec<String>,
}

/// Run the provider phase with the default registration wait
pub fn run_provider_phase(
    session: &mut dyn Session,
    cfg: &ProvisioningConfig,
) -> Result<ProviderOutcome> {
    run_provider_phase_with_wait(session, cfg, ACCOUNT_REGISTRATION_WAIT)
}

/// Run the provider phase; `registration_wait` is injectable for tests
pub fn run_provider_phase_with_wait(
    session: &mut dyn Session,
    cfg: &ProvisioningConfig,
    registration_wait: Duration,
) -> Result<ProviderOutcome> {
    let database = &cfg.data.provider_database;
    let schema = &cfg.data.shared_schema;
    let share = &cfg.share.name;

    // 1. Own account identifier; always current, no reconciliation needed
    let rows = session
        .query(statements::CURRENT_ACCOUNT)
        .map_err(|e| e.with_step("read_current_account"))?;
    let provider_account_id = first_cell(&rows).ok_or_else(|| {
        ProvisionError::statement("read_current_account", "CURRENT_ACCOUNT() returned no value")
    })?;
    info!(provider_account_id, "provider account identified");

    // 2. Shared schema, non-destructive
    reconcile::ensure_exists(
        session,
        "ensure_shared_schema",
        &statements::show_schemas(database, schema),
        &statements::create_schema(database, schema),
    )?;

    // 3. Secure views; views are stateless so or-replace is safe
    let mut view_names = Vec::with_capacity(cfg.data.objects.len());
    for object in &cfg.data.objects {
        session
            .exec(&statements::create_secure_view(database, schema, object))
            .map_err(|e| e.with_step("create_secure_view"))?;
        info!(view = %object.shared_view_name, "secure view ready");
        view_names.push(object.shared_view_name.clone());
    }

    // 4. Share object; its privilege list is fully re-granted below
    session
        .exec(&statements::create_share(share))
        .map_err(|e| e.with_step("create_share"))?;

    // 5. Grants are naturally idempotent, always re-issued
    session
        .exec(&statements::grant_database_usage(database, share))
        .map_err(|e| e.with_step("grant_share_privileges"))?;
    session
        .exec(&statements::grant_schema_usage(database, schema, share))
        .map_err(|e| e.with_step("grant_share_privileges"))?;
    for view in &view_names {
        session
            .exec(&statements::grant_view_select(database, schema, view, share))
            .map_err(|e| e.with_step("grant_share_privileges"))?;
    }
    info!(share, "share and privileges ensured");

    // 6. Managed reader account
    let account = ensure_managed_account(session, cfg, registration_wait)?;
    info!(
        locator = %account.locator,
        url = %account.url,
        "using managed reader account"
    );

    // 7. Attach the account to the share
    attach_account_to_share(session, share, &account.locator)?;

    Ok(ProviderOutcome {
        provider_account_id,
        reader_locator: account.locator,
        reader_url: account.url,
        view_names,
    })
}

struct ManagedAccount {
    locator: String,
    url: String,
}

/// Idempotently ensure the managed reader account exists and read its
/// locator and URL.
///
/// Inlined rather than built on the `reconcile` primitives: creation does
/// not itself return the locator, a fresh account needs a registration
/// wait before it becomes visible, and the lookup re-runs unconditionally
/// after either path.
fn ensure_managed_account(
    session: &mut dyn Session,
    cfg: &ProvisioningConfig,
    registration_wait: Duration,
) -> Result<ManagedAccount> {
    const STEP: &str = "ensure_managed_account";
    let name = &cfg.reader.account_name;

    if let Some(account) = lookup_managed_account(session, name)? {
        info!(account = %name, "managed account already exists");
        return Ok(account);
    }

    info!(account = %name, "managed account not found, creating");
    let create = statements::create_managed_account(
        name,
        &cfg.reader.admin_user,
        &cfg.reader.admin_password,
    );
    let mut freshly_created = true;
    if let Err(e) = session.exec(&create) {
        match e.remote_message().and_then(classify_conflict) {
            Some(_) => {
                warn!(account = %name, "create reported an existing object, re-checking");
                freshly_created = false;
            }
            None => return Err(e.with_step(STEP)),
        }
    }

    if freshly_created && !registration_wait.is_zero() {
        // Registration lag: the account is not immediately visible to SHOW
        thread::sleep(registration_wait);
    }

    match lookup_managed_account(session, name)? {
        Some(account) => Ok(account),
        None if freshly_created => Err(ProvisionError::statement(
            STEP,
            format!("managed account '{name}' was created but is not visible"),
        )),
        None => Err(ProvisionError::statement(
            STEP,
            format!(
                "name collision: '{name}' exists but is not a managed account; \
                 drop that object or pick a different reader.account_name"
            ),
        )),
    }
}

/// Look up a managed account by name and read its locator and URL
fn lookup_managed_account(
    session: &mut dyn Session,
    account_name: &str,
) -> Result<Option<ManagedAccount>> {
    const STEP: &str = "ensure_managed_account";
    let rows = session
        .query(&statements::show_managed_accounts(account_name))
        .map_err(|e| e.with_step(STEP))?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    // SHOW MANAGED ACCOUNTS column order: 0 name, 1 cloud, 2 region,
    // 3 locator, 4 created_on, 5 url
    let locator = non_empty_cell(row, 3);
    let url = non_empty_cell(row, 5);
    match (locator, url) {
        (Some(locator), Some(url)) => Ok(Some(ManagedAccount { locator, url })),
        _ => Err(ProvisionError::statement(
            STEP,
            format!("malformed SHOW MANAGED ACCOUNTS row for '{account_name}'"),
        )),
    }
}

/// Attach the reader account to the share, treating already-attached as
/// success
fn attach_account_to_share(session: &mut dyn Session, share: &str, locator: &str) -> Result<()> {
    const STEP: &str = "attach_account_to_share";
    match session.exec(&statements::alter_share_add_account(share, locator)) {
        Ok(()) => {
            info!(share, locator, "account attached to share");
            Ok(())
        }
        Err(e) => match e.remote_message().and_then(classify_conflict) {
            Some(_) => {
                info!(share, locator, "account already attached to share");
                Ok(())
            }
            None => Err(e.with_step(STEP)),
        },
    }
}

fn first_cell(rows: &[Row]) -> Option<String> {
    rows.first()?.first()?.clone()
}

fn non_empty_cell(row: &Row, index: usize) -> Option<String> {
    row.get(index)?.clone().filter(|v| !v.is_empty())
}
