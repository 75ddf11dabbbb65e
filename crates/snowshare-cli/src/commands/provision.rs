//! Provision command
//!
//! Usage: snowshare provision --config config.yaml

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use snowshare_config::load_config;
use snowshare_core::pipeline::run_pipeline;
use snowshare_errors::Result;
use snowshare_notify::{NullMailer, SmtpMailer};
use snowshare_session::RestConnector;

#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// Path to the provisioning configuration file
    #[arg(long, short, default_value = "config.yaml")]
    pub config: PathBuf,
}

/// Execute the full provisioning pipeline
pub fn execute(args: ProvisionArgs) -> Result<()> {
    let cfg = load_config(&args.config)?;
    info!(config = %args.config.display(), "configuration loaded");
    let connector = RestConnector::new();

    let report = match cfg.smtp.clone() {
        Some(smtp) => run_pipeline(&cfg, &connector, &SmtpMailer::new(smtp))?,
        None => run_pipeline(&cfg, &connector, &NullMailer)?,
    };

    println!(
        "Provisioned reader account {} ({})",
        cfg.reader.account_name, report.provider.reader_locator
    );
    println!("Login URL: {}", report.provider.reader_url);
    for (view, count) in &report.reader.view_row_counts {
        match count {
            Some(n) => println!("View {view}: {n} rows"),
            None => println!("View {view}: row count unavailable (share may still propagate)"),
        }
    }
    if report.reader.user_created {
        println!("User {} created", cfg.reader_user.map(|u| u.name).unwrap_or_default());
    }
    Ok(())
}
