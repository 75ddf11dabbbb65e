//! Check-config command
//!
//! Loads, normalizes and validates a configuration file without opening
//! any remote session.

use std::path::PathBuf;

use clap::Args;

use snowshare_config::load_config;
use snowshare_errors::Result;

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// Path to the provisioning configuration file
    #[arg(long, short, default_value = "config.yaml")]
    pub config: PathBuf,
}

/// Validate the configuration and print a summary
pub fn execute(args: CheckConfigArgs) -> Result<()> {
    let cfg = load_config(&args.config)?;

    println!("Configuration OK: {}", args.config.display());
    println!("  provider account: {}", cfg.provider.account);
    println!("  reader account:   {}", cfg.reader.account_name);
    println!("  share:            {}", cfg.share.name);
    println!("  data objects:     {}", cfg.data.objects.len());
    for obj in &cfg.data.objects {
        let filter = match &obj.view_where {
            Some(w) => format!(" (filtered: {w})"),
            None => String::new(),
        };
        println!(
            "    {} <- {}{}",
            obj.shared_view_name, obj.source_table, filter
        );
    }
    match &cfg.reader_user {
        Some(user) => println!("  reader user:      {} <{}>", user.name, user.email),
        None => println!("  reader user:      (none, user step will be skipped)"),
    }
    match &cfg.smtp {
        Some(smtp) => println!(
            "  smtp:             {}:{}",
            smtp.host,
            smtp.resolved_port()
        ),
        None => println!("  smtp:             (none, notification disabled)"),
    }
    Ok(())
}
