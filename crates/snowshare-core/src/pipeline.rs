//! Pipeline driver
//!
//! Linear sequence: provider phase, reader phase, notification gate. Each
//! phase owns its own session and closes it on both the success and the
//! failure path; the reader phase only starts after the provider phase
//! completed, because it consumes the provider's identifiers.

use std::time::Duration;

use tracing::info;

use snowshare_config::ProvisioningConfig;
use snowshare_errors::Result;
use snowshare_session::{account_identifier_from_url, ConnectTarget, SessionFactory};

use crate::notify::{notify_if_new_user, Mailer};
use crate::provider::{self, ProviderOutcome, ACCOUNT_REGISTRATION_WAIT};
use crate::reader::{self, ReaderOutcome};

/// The reader admin holds this role inside the managed account
const READER_ADMIN_ROLE: &str = "ACCOUNTADMIN";

/// Outcome of one full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub provider: ProviderOutcome,
    pub reader: ReaderOutcome,
    /// Whether a credentials delivery was attempted
    pub notified: bool,
}

/// Run the full pipeline with the default registration wait
pub fn run_pipeline(
    cfg: &ProvisioningConfig,
    factory: &dyn SessionFactory,
    mailer: &dyn Mailer,
) -> Result<PipelineReport> {
    run_pipeline_with_wait(cfg, factory, mailer, ACCOUNT_REGISTRATION_WAIT)
}

/// Run the full pipeline; `registration_wait` is injectable for tests
pub fn run_pipeline_with_wait(
    cfg: &ProvisioningConfig,
    factory: &dyn SessionFactory,
    mailer: &dyn Mailer,
    registration_wait: Duration,
) -> Result<PipelineReport> {
    let provider_target = ConnectTarget {
        account: cfg.provider.account.clone(),
        user: cfg.provider.user.clone(),
        password: cfg.provider.password.clone(),
        role: Some(cfg.provider.role.clone()),
    };
    info!(target = %provider_target.identity(), "connecting to provider");
    let mut session = factory.connect(&provider_target)?;
    let provider_result =
        provider::run_provider_phase_with_wait(session.as_mut(), cfg, registration_wait);
    session.close();
    let provider_outcome = provider_result?;

    let reader_account = account_identifier_from_url(&provider_outcome.reader_url);
    let reader_target = ConnectTarget {
        account: reader_account,
        user: cfg.reader.admin_user.clone(),
        password: cfg.reader.admin_password.clone(),
        role: Some(READER_ADMIN_ROLE.to_string()),
    };
    info!(target = %reader_target.identity(), "connecting to reader account");
    let mut session = factory.connect(&reader_target)?;
    let reader_result = reader::run_reader_phase(session.as_mut(), cfg, &provider_outcome);
    session.close();
    let reader_outcome = reader_result?;

    let notified = notify_if_new_user(
        &reader_outcome,
        cfg.smtp.as_ref(),
        cfg.reader_user.as_ref(),
        &provider_outcome.reader_url,
        mailer,
    );

    info!("provisioning complete");
    Ok(PipelineReport {
        provider: provider_outcome,
        reader: reader_outcome,
        notified,
    })
}
