//! SMTP delivery of initial credentials
//!
//! Implements the core `Mailer` trait over lettre. Transport selection
//! follows the channel configuration: SMTPS when `use_ssl`, STARTTLS when
//! `use_tls` (the default), plain otherwise; LOGIN credentials only when
//! both a user and a password are configured.

use lettre::message::Message;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use tracing::debug;

use snowshare_config::SmtpConfig;
use snowshare_core::{CredentialsMail, Mailer};
use snowshare_errors::{ProvisionError, Result};

const SUBJECT: &str = "Your Snowflake Reader Account Credentials";

/// Mailer backed by one SMTP relay
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        SmtpMailer { config }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let cfg = &self.config;
        let builder = if cfg.use_ssl() {
            SmtpTransport::relay(&cfg.host).map_err(notification_error)?
        } else if cfg.use_tls() {
            SmtpTransport::starttls_relay(&cfg.host).map_err(notification_error)?
        } else {
            SmtpTransport::builder_dangerous(&cfg.host)
        };
        let mut builder = builder.port(cfg.resolved_port());
        if let (Some(user), Some(password)) = (&cfg.user, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, mail: &CredentialsMail) -> Result<()> {
        let from = self.config.from_address();
        debug!(
            host = %self.config.host,
            port = self.config.resolved_port(),
            to = %mail.recipient,
            "sending credentials email"
        );
        let message = Message::builder()
            .from(from.parse().map_err(notification_error)?)
            .to(mail.recipient.parse().map_err(notification_error)?)
            .subject(SUBJECT)
            .body(credentials_body(mail))
            .map_err(notification_error)?;
        self.transport()?
            .send(&message)
            .map_err(notification_error)?;
        Ok(())
    }
}

/// Plaintext body carrying the login URL, user name and temporary password
fn credentials_body(mail: &CredentialsMail) -> String {
    format!(
        "Hello,\n\n\
         Your Snowflake reader account has been provisioned.\n\n\
         Login URL: {url}\n\
         Username: {user}\n\
         Temporary Password: {password}\n\n\
         You will be prompted to change your password on first login.\n\n\
         If you did not expect this email, please contact the sender.\n",
        url = mail.login_url,
        user = mail.user_name,
        password = mail.temp_password,
    )
}

/// Mailer used when no notification channel is configured; the gate never
/// reaches it, but the pipeline still needs a collaborator
pub struct NullMailer;

impl Mailer for NullMailer {
    fn send(&self, _mail: &CredentialsMail) -> Result<()> {
        Ok(())
    }
}

fn notification_error(err: impl std::fmt::Display) -> ProvisionError {
    ProvisionError::Notification {
        reason: err.to_string(),
    }
}
