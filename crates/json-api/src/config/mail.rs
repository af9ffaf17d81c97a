//! Mail Config

use clap::Args;

use portal_app::mailer::SmtpConfig;

/// Outgoing mail settings.
#[derive(Debug, Args)]
pub struct MailConfig {
    /// SMTP relay host; welcome emails are only logged while unset
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP relay port
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// Sender address
    #[arg(long, env = "SMTP_FROM", default_value = "noreply@localhost")]
    pub smtp_from: String,

    /// SMTP user name
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,
}

impl MailConfig {
    #[must_use]
    pub fn smtp_config(&self) -> Option<SmtpConfig> {
        let host = self.smtp_host.as_ref()?;

        Some(SmtpConfig {
            port: self.smtp_port,
            user: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
            ..SmtpConfig::new(host.clone(), self.smtp_from.clone())
        })
    }
}
