use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::SubmissionPayload;
use crate::rate_limit::RateLimiter;
use crate::recaptcha::RecaptchaVerifier;
use crate::services::{CrmClient, CrmOutcome};
use crate::validation;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Submissions above this size are rejected with 413 before parsing.
pub const MAX_BODY_BYTES: usize = 10 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Fixed-window submission limiter, shared across requests.
    pub rate_limiter: Arc<RateLimiter>,
    /// reCAPTCHA siteverify client.
    pub recaptcha: RecaptchaVerifier,
    /// Configured CRM adapter (Brevo or HubSpot).
    pub crm: CrmClient,
}

/// Builds the application router with CORS, body-limit and trace layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/site-config", get(site_config))
        .route("/api/v1/leads", post(submit_lead).options(preflight))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Request size limit: contact-form payloads are tiny
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        // CORS goes on as its own layer so the router re-erases the
        // response body type underneath it
        .layer(cors)
}

/// CORS policy from configuration: wildcard, or a validated origin
/// allow-list. Headers and methods match what the contact form sends.
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Public site configuration consumed by the frontend, currently just the
/// fallback phone number for outbound messaging links.
pub async fn site_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "contactPhone": state.config.contact_fallback_phone,
    }))
}

/// Fallback for OPTIONS requests that are not CORS preflights (those are
/// answered by the CORS layer before reaching the router).
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// POST /api/v1/leads
///
/// The contact-form pipeline: rate limit → honeypot → action dispatch.
/// `add-lead` additionally runs reCAPTCHA verification and contact
/// validation before mapping the lead into the configured CRM;
/// `update-contact` patches an existing CRM contact by email.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    // Any body that does not deserialize into a submission payload is a
    // plain 400; only the size limit keeps its own status
    let Json(payload) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            tracing::debug!("Rejected request body: {}", rejection);
            AppError::BadRequest("Invalid request payload".to_string())
        }
    })?;

    let client_key = client_key(&headers);

    let decision = state.rate_limiter.check(&client_key);
    if !decision.allowed {
        tracing::warn!("Rate limit exceeded for client {}", client_key);
        return Err(AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
        });
    }

    if !validation::is_legitimate_submission(&payload.extra) {
        // Deliberately generic; never tell a bot it was detected
        tracing::warn!("Honeypot tripped for client {}", client_key);
        return Err(AppError::BadRequest("Invalid request".to_string()));
    }

    match payload.action.as_str() {
        "add-lead" => {
            let token = payload
                .recaptcha_token
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("reCAPTCHA token required".to_string()))?;

            let verification = state.recaptcha.verify(token).await;
            if !verification.success {
                tracing::warn!(
                    "reCAPTCHA verification failed: score={:?}, action={:?}",
                    verification.score,
                    verification.action
                );
                return Err(AppError::RecaptchaRejected {
                    score: verification.score,
                    action: verification.action,
                });
            }
            tracing::debug!("reCAPTCHA verification passed: score={:?}", verification.score);

            let input = payload
                .contact_data
                .ok_or_else(|| AppError::BadRequest("Missing contact data".to_string()))?;
            let contact = validation::validate_contact(&input).map_err(AppError::BadRequest)?;

            let outcome = state
                .crm
                .create_contact(&contact)
                .await
                .context("Lead dispatch failed")?;

            let body = match outcome {
                CrmOutcome::Created => json!({ "success": true }),
                CrmOutcome::AlreadyExists => {
                    json!({ "success": true, "message": "Contact already exists" })
                }
            };
            Ok((StatusCode::OK, Json(body)))
        }
        "update-contact" => {
            let email = payload
                .email
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| AppError::BadRequest("Missing email for update".to_string()))?;
            let update = payload.data.unwrap_or_default();

            state
                .crm
                .update_contact(&email, &update)
                .await
                .context("Contact update failed")?;

            Ok((StatusCode::OK, Json(json!({ "success": true }))))
        }
        _ => Err(AppError::BadRequest("Invalid action".to_string())),
    }
}

/// Client identifier for rate limiting, derived from forwarded-IP headers.
/// Behind the reverse proxy the first `X-Forwarded-For` entry is the caller.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or("unknown")
        .to_string()
}
