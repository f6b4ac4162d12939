use crate::config::Config;
use crate::errors::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Action tag the frontend executes reCAPTCHA with; anything else means the
/// token was minted for a different widget.
pub const EXPECTED_ACTION: &str = "contact_form";

/// Minimum v3 score to accept a submission as human (0.0 = bot, 1.0 = human).
pub const MIN_SCORE: f64 = 0.5;

/// Result of verifying a client-supplied reCAPTCHA token.
#[derive(Debug, Clone, Serialize)]
pub struct RecaptchaOutcome {
    pub success: bool,
    pub score: Option<f64>,
    pub action: Option<String>,
}

impl RecaptchaOutcome {
    fn failed() -> Self {
        Self {
            success: false,
            score: None,
            action: None,
        }
    }
}

/// Wire format of Google's siteverify response.
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    score: Option<f64>,
    action: Option<String>,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Client for the reCAPTCHA siteverify endpoint.
#[derive(Clone)]
pub struct RecaptchaVerifier {
    client: Client,
    verify_url: String,
    secret: Option<String>,
}

impl RecaptchaVerifier {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create siteverify client: {}", e))
            })?;

        Ok(Self {
            client,
            verify_url: config.recaptcha_verify_url.clone(),
            secret: config.recaptcha_secret_key.clone(),
        })
    }

    /// Scores a submission token with the attestation service.
    ///
    /// Never returns an error: a misconfigured secret, an upstream
    /// rejection, a network fault or an unparseable response all collapse
    /// to `success: false`.
    pub async fn verify(&self, token: &str) -> RecaptchaOutcome {
        let Some(ref secret) = self.secret else {
            tracing::error!("reCAPTCHA secret key not configured");
            return RecaptchaOutcome::failed();
        };

        match self.site_verify(secret, token).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("reCAPTCHA verification error: {}", e);
                RecaptchaOutcome::failed()
            }
        }
    }

    async fn site_verify(&self, secret: &str, token: &str) -> Result<RecaptchaOutcome, AppError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("siteverify request failed: {}", e)))?;

        let data: SiteVerifyResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse siteverify response: {}", e))
        })?;

        if !data.success {
            tracing::warn!("reCAPTCHA verification failed: {:?}", data.error_codes);
            return Ok(RecaptchaOutcome::failed());
        }

        match data.score {
            // v3 token: both the score threshold and the expected action
            // must hold.
            Some(score) => {
                let is_human = score >= MIN_SCORE;
                let action_valid = data.action.as_deref() == Some(EXPECTED_ACTION);

                if !action_valid {
                    tracing::warn!(
                        "reCAPTCHA action mismatch: expected {}, got {:?}",
                        EXPECTED_ACTION,
                        data.action
                    );
                }
                tracing::debug!(
                    "reCAPTCHA v3 score: {}, action: {:?}, human: {}",
                    score,
                    data.action,
                    is_human
                );

                Ok(RecaptchaOutcome {
                    success: is_human && action_valid,
                    score: Some(score),
                    action: data.action,
                })
            }
            // v2 token carries no score; upstream success is sufficient.
            None => Ok(RecaptchaOutcome {
                success: true,
                score: None,
                action: None,
            }),
        }
    }
}
