mod config;
mod errors;
mod handlers;
mod mapping;
mod models;
mod rate_limit;
mod recaptcha;
mod services;
mod validation;

use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::recaptcha::RecaptchaVerifier;
use crate::services::CrmClient;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, wires the submission rate
/// limiter (plus its hourly sweep task), the reCAPTCHA verifier and the
/// configured CRM client, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_intake_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Submission rate limiter: 5 requests / 15 minutes per client
    let rate_limiter = Arc::new(RateLimiter::for_submissions());
    tracing::info!("Submission rate limiter initialized");

    // Hourly sweep bounds the rate-limit table's memory
    let sweeper = Arc::clone(&rate_limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            let purged = sweeper.sweep();
            if purged > 0 {
                tracing::debug!("Purged {} expired rate-limit entries", purged);
            }
        }
    });

    let recaptcha = RecaptchaVerifier::new(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize reCAPTCHA verifier: {}", e))?;
    tracing::info!("reCAPTCHA verifier initialized");

    let crm = CrmClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize CRM client: {}", e))?;
    tracing::info!("CRM client initialized: {:?}", config.crm_provider);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        rate_limiter,
        recaptcha,
        crm,
    });

    // Coarse infrastructure rate limit in front of the application-level
    // fixed-window limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    let app = handlers::build_router(app_state).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
