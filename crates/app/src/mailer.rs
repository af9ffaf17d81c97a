//! Outgoing email.
//!
//! [`SmtpMailer`] delivers through `lettre`'s async SMTP transport. Without
//! `SMTP_HOST` the application falls back to [`LogMailer`], which records that
//! a message would have been sent but never logs its body.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use mockall::automock;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{api_keys::credentials::ApiSecret, tenants::plans::SubscriptionPlan};

const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay hostname.
    pub host: String,
    /// Relay port, 587 unless overridden.
    pub port: u16,
    /// Sender address.
    pub from: String,
    /// SMTP username.
    pub user: Option<String>,
    /// SMTP password.
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Settings for `host` on the default submission port, without authentication.
    #[must_use]
    pub fn new(host: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            from: from.into(),
            user: None,
            password: None,
        }
    }
}

/// Email delivery failures.
#[derive(Debug, Error)]
pub enum MailerError {
    /// The relay refused or could not be reached.
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// An address did not parse.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

/// Credentials sent to a tenant that signed up through billing.
#[derive(Debug, Clone)]
pub struct WelcomeEmail {
    /// Recipient address.
    pub to: String,
    /// Tenant display name.
    pub tenant_name: String,
    /// Public key id of the provisioned key.
    pub key_id: String,
    /// Secret of the provisioned key.
    pub secret: ApiSecret,
    /// Subscribed plan.
    pub plan: SubscriptionPlan,
    /// Artisan quota of the plan.
    pub allowed_artisans: u32,
}

impl WelcomeEmail {
    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &'static str {
        "Bienvenue sur Portal GMBS - Vos identifiants API"
    }

    /// Plain-text body.
    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "Bonjour {tenant},

Votre abonnement au plan {plan} est maintenant actif.
Vous pouvez gérer jusqu'à {artisans} artisans avec votre portail.

Vos identifiants API :

  API Key ID (public) : {key_id}
  API Secret (confidentiel) : {secret}

Important : conservez ces identifiants en lieu sûr. Le secret ne sera plus jamais affiché après cet email.

Chaque requête doit porter les en-têtes X-GMBS-Key-Id et X-GMBS-Secret.

L'équipe Portal GMBS",
            tenant = self.tenant_name,
            plan = self.plan.as_str().to_uppercase(),
            artisans = self.allowed_artisans,
            key_id = self.key_id,
            secret = self.secret.expose(),
        )
    }
}

/// Sends transactional email.
#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver the welcome email.
    ///
    /// # Errors
    ///
    /// Returns [`MailerError`] when the message cannot be built or the relay refuses it.
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), MailerError>;
}

/// [`Mailer`] over an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Build an async transport for `config`.
    #[must_use]
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.config.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body())?;

        let mut transport =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
                .port(self.config.port);

        if let (Some(user), Some(password)) = (&self.config.user, &self.config.password) {
            transport = transport.credentials(Credentials::new(user.clone(), password.clone()));
        }

        transport.build().send(message).await?;

        info!(to = %email.to, key_id = %email.key_id, "welcome email sent");

        Ok(())
    }
}

/// Stand-in used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), MailerError> {
        warn!(
            to = %email.to,
            key_id = %email.key_id,
            "SMTP is not configured; welcome email not sent, deliver the credentials manually"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn welcome() -> WelcomeEmail {
        WelcomeEmail {
            to: "ops@acme.test".to_string(),
            tenant_name: "Acme".to_string(),
            key_id: "pk_live_0123".to_string(),
            secret: ApiSecret::new("sk_live_abcd"),
            plan: SubscriptionPlan::Pro,
            allowed_artisans: 50,
        }
    }

    #[test]
    fn body_carries_credentials_and_plan() {
        let body = welcome().body();

        assert!(body.contains("Bonjour Acme"));
        assert!(body.contains("plan PRO"));
        assert!(body.contains("50 artisans"));
        assert!(body.contains("pk_live_0123"));
        assert!(body.contains("sk_live_abcd"));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let debug = format!("{:?}", welcome());

        assert!(!debug.contains("sk_live_abcd"));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        assert!(LogMailer.send_welcome(&welcome()).await.is_ok());
    }
}
