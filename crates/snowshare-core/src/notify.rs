//! Notification gate
//!
//! Sends initial credentials to the end user, but only when this run
//! actually created the user and a usable mail channel is configured.
//! Delivery failure never turns a successful provisioning run into a
//! failure.

use tracing::{info, warn};

use snowshare_config::{ReaderUserConfig, SmtpConfig};
use snowshare_errors::Result;

use crate::reader::ReaderOutcome;

/// Credentials message handed to the mail transport
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialsMail {
    pub recipient: String,
    pub login_url: String,
    pub user_name: String,
    pub temp_password: String,
}

/// Mail delivery collaborator; the SMTP adapter lives in snowshare-notify
pub trait Mailer {
    /// Deliver a credentials message
    fn send(&self, mail: &CredentialsMail) -> Result<()>;
}

/// Invoke the mailer when and only when a new user was created and the
/// channel is minimally configured (a non-empty host).
///
/// Returns whether a delivery was attempted.
pub fn notify_if_new_user(
    outcome: &ReaderOutcome,
    smtp: Option<&SmtpConfig>,
    user: Option<&ReaderUserConfig>,
    account_url: &str,
    mailer: &dyn Mailer,
) -> bool {
    if !outcome.user_created {
        return false;
    }
    let Some(user) = user else {
        return false;
    };
    let Some(smtp) = smtp else {
        info!("no smtp section configured, skipping credentials email");
        return false;
    };
    if smtp.host.trim().is_empty() {
        info!("smtp.host is empty, skipping credentials email");
        return false;
    }

    let mail = CredentialsMail {
        recipient: user.email.clone(),
        login_url: account_url.to_string(),
        user_name: user.name.clone(),
        temp_password: user.temp_password.clone(),
    };
    match mailer.send(&mail) {
        Ok(()) => info!(recipient = %mail.recipient, "credentials email sent"),
        Err(e) => warn!(recipient = %mail.recipient, error = %e, "credentials email failed"),
    }
    true
}
