//! Payment-provider webhook signature verification.
//!
//! The provider signs every delivery with HMAC-SHA256 over the exact
//! raw request body, hex-encoded into a header. Verification MUST run
//! against the raw bytes as received: re-serializing the parsed JSON
//! can change key order, whitespace, or unicode escaping and silently
//! break the comparison.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Signature verification outcomes that are not success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No shared secret is configured.
    ///
    /// Operational misconfiguration, not an authentication failure:
    /// the caller acknowledges without processing (200), because a 401
    /// here would make the provider retry forever against a server
    /// that cannot become correct without a deploy.
    #[error("webhook secret is not configured")]
    SecretNotConfigured,

    /// The signature header is absent while a secret is configured.
    #[error("signature header is missing")]
    MissingSignature,

    /// The supplied signature does not match the request body.
    #[error("signature does not match request body")]
    Mismatch,
}

/// Verifier for provider webhook signatures.
pub struct WebhookVerifier {
    /// Shared secret configured out-of-band; `None` when unset.
    secret: Option<SecretString>,
}

impl WebhookVerifier {
    /// Creates a verifier with an optional shared secret.
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Creates a verifier with a configured secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(SecretString::new(secret.into())),
        }
    }

    /// Returns true when a shared secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verifies a hex-encoded HMAC-SHA256 signature over the raw body.
    ///
    /// # Errors
    ///
    /// - `SecretNotConfigured` - no secret is set; the caller must
    ///   acknowledge without processing
    /// - `MissingSignature` - secret is set but the header was absent
    /// - `Mismatch` - signature is present but wrong (including
    ///   malformed hex)
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let secret = self
            .secret
            .as_ref()
            .ok_or(SignatureError::SecretNotConfigured)?;

        let signature = signature.ok_or(SignatureError::MissingSignature)?;
        let supplied = hex::decode(signature.trim()).map_err(|_| SignatureError::Mismatch)?;

        let expected = compute_signature(secret.expose_secret(), payload);
        if constant_time_compare(&expected, &supplied) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

/// Computes the HMAC-SHA256 digest of the payload.
fn compute_signature(secret: &str, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Performs constant-time comparison of two byte slices.
///
/// This prevents timing attacks that could leak information about the
/// expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex-encoded signature for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &[u8]) -> String {
    hex::encode(compute_signature(secret, payload))
}
