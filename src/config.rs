use serde::Deserialize;

/// CRM backend the lead pipeline dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmProvider {
    Brevo,
    Hubspot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub crm_provider: CrmProvider,
    pub brevo_api_key: Option<String>,
    pub brevo_base_url: String,
    pub brevo_leads_list_id: i64,
    pub hubspot_access_token: Option<String>,
    pub hubspot_base_url: String,
    pub recaptcha_secret_key: Option<String>,
    pub recaptcha_verify_url: String,
    /// CORS allow-list; a single `*` entry means wildcard.
    pub allowed_origins: Vec<String>,
    /// Fallback phone number for the site's outbound messaging links.
    pub contact_fallback_phone: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let crm_provider = match std::env::var("CRM_PROVIDER")
            .unwrap_or_else(|_| "brevo".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "brevo" => CrmProvider::Brevo,
            "hubspot" => CrmProvider::Hubspot,
            other => anyhow::bail!("CRM_PROVIDER must be 'brevo' or 'hubspot', got '{}'", other),
        };

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            crm_provider,
            brevo_api_key: std::env::var("BREVO_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            brevo_base_url: validate_url(
                "BREVO_BASE_URL",
                std::env::var("BREVO_BASE_URL")
                    .unwrap_or_else(|_| "https://api.brevo.com/v3".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            )?,
            brevo_leads_list_id: std::env::var("BREVO_LEADS_LIST_ID")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BREVO_LEADS_LIST_ID must be a numeric list id"))?,
            hubspot_access_token: std::env::var("HUBSPOT_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            hubspot_base_url: validate_url(
                "HUBSPOT_BASE_URL",
                std::env::var("HUBSPOT_BASE_URL")
                    .unwrap_or_else(|_| "https://api.hubapi.com".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            )?,
            recaptcha_secret_key: std::env::var("RECAPTCHA_SECRET_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            recaptcha_verify_url: validate_url(
                "RECAPTCHA_VERIFY_URL",
                std::env::var("RECAPTCHA_VERIFY_URL").unwrap_or_else(|_| {
                    "https://www.google.com/recaptcha/api/siteverify".to_string()
                }),
            )?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            contact_fallback_phone: std::env::var("CONTACT_FALLBACK_PHONE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // The selected provider must have its credential configured
        match config.crm_provider {
            CrmProvider::Brevo if config.brevo_api_key.is_none() => {
                anyhow::bail!("BREVO_API_KEY environment variable required for CRM_PROVIDER=brevo")
            }
            CrmProvider::Hubspot if config.hubspot_access_token.is_none() => {
                anyhow::bail!(
                    "HUBSPOT_ACCESS_TOKEN environment variable required for CRM_PROVIDER=hubspot"
                )
            }
            _ => {}
        }

        if config.allowed_origins.is_empty() {
            anyhow::bail!("ALLOWED_ORIGINS cannot be empty (use '*' for wildcard)");
        }

        if config.recaptcha_secret_key.is_none() {
            tracing::warn!(
                "RECAPTCHA_SECRET_KEY not configured; all add-lead verifications will fail"
            );
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("CRM provider: {:?}", config.crm_provider);
        tracing::debug!("Brevo base URL: {}", config.brevo_base_url);
        tracing::debug!("HubSpot base URL: {}", config.hubspot_base_url);
        tracing::debug!("Allowed origins: {:?}", config.allowed_origins);
        tracing::debug!("Server port: {}", config.port);

        Ok(config)
    }
}

fn validate_url(var: &str, url: String) -> anyhow::Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", var);
    }
    Ok(url)
}
