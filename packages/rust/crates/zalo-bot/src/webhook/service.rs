use crate::error::{SignatureError, WebhookError};
use crate::types::Update;

use super::parse::parse_update;
use super::signature::verify_signature;

/// Signature gate plus parser for inbound webhook bodies.
#[derive(Clone, Default)]
pub struct WebhookVerifier {
    secret: String,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret_configured", &self.has_secret())
            .finish()
    }
}

impl WebhookVerifier {
    /// Verifier for the shared `secret`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Whether a non-blank secret is configured.
    #[must_use]
    pub fn has_secret(&self) -> bool {
        !self.secret.trim().is_empty()
    }

    /// Check the signature of a raw body.
    ///
    /// # Errors
    /// See [`verify_signature`].
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<(), SignatureError> {
        verify_signature(payload, signature, &self.secret)
    }

    /// Verify, then parse.
    ///
    /// # Errors
    /// Returns [`WebhookError::Rejected`] before any parsing when the
    /// signature check fails.
    pub fn process(&self, payload: &[u8], signature: &str) -> Result<Update, WebhookError> {
        self.verify(payload, signature)?;
        parse_update(payload)
    }
}
