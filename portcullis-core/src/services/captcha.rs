//! CAPTCHA verification against an external service.
//!
//! Whether a challenge is required at all is the [`AttemptLedger`]'s call;
//! this module only verifies a submitted response token. Deployments without
//! a configured secret get a pass-through verifier, preserving behaviour for
//! installations that never set one up.
//!
//! [`AttemptLedger`]: crate::services::AttemptLedger

use async_trait::async_trait;
use serde::Deserialize;

use crate::{CaptchaConfig, Error};

/// Verifier for CAPTCHA response tokens.
///
/// Implementations must fail closed: a transport error or timeout is a
/// verification failure, never a pass.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync + 'static {
    /// Verify a response token submitted by the client.
    async fn verify(
        &self,
        response_token: Option<&str>,
        source_address: Option<&str>,
    ) -> Result<bool, Error>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
}

/// Verifier that calls the configured verification endpoint server-to-server.
///
/// With no secret configured every request passes. With a secret, the
/// response token is posted to the endpoint with a bounded timeout, and
/// anything other than a 2xx response carrying `"success": true` fails.
pub struct HttpCaptchaVerifier {
    config: CaptchaConfig,
    client: reqwest::Client,
}

impl HttpCaptchaVerifier {
    pub fn new(config: CaptchaConfig) -> Self {
        // A client without the timeout would wait on the verification
        // service unboundedly, so construction failure is fatal.
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("failed to build HTTP client for captcha verification");
        Self { config, client }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }
}

#[async_trait]
impl CaptchaVerifier for HttpCaptchaVerifier {
    async fn verify(
        &self,
        response_token: Option<&str>,
        source_address: Option<&str>,
    ) -> Result<bool, Error> {
        let Some(secret) = self.config.secret.as_deref() else {
            // Pass-through for un-configured deployments.
            return Ok(true);
        };

        let Some(response_token) = response_token else {
            return Ok(false);
        };

        let mut form = vec![("secret", secret), ("response", response_token)];
        if let Some(remote_ip) = source_address {
            form.push(("remoteip", remote_ip));
        }

        let result = self
            .client
            .post(self.config.verify_url())
            .form(&form)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                // Fail closed on timeout or transport failure.
                tracing::warn!(error = %e, "Captcha verification request failed");
                return Ok(false);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                status = %response.status(),
                "Captcha verification service returned an error status"
            );
            return Ok(false);
        }

        match response.json::<VerifyResponse>().await {
            Ok(body) => Ok(body.success),
            Err(e) => {
                tracing::warn!(error = %e, "Captcha verification response was malformed");
                Ok(false)
            }
        }
    }
}
