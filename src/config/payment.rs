//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider configuration (webhook side only)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Shared secret for webhook signature verification.
    ///
    /// Deliberately optional: a missing secret is an operational
    /// misconfiguration the webhook endpoint must tolerate by
    /// acknowledging-and-ignoring, never by rejecting (a 401 would make
    /// the provider retry forever). Validation therefore accepts
    /// absence and only rejects a present-but-empty value.
    pub webhook_secret: Option<SecretString>,
}

impl PaymentConfig {
    /// Check if a webhook secret is configured
    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(secret) = &self.webhook_secret {
            if secret.expose_secret().is_empty() {
                return Err(ValidationError::EmptyWebhookSecret);
            }
        }
        Ok(())
    }
}
