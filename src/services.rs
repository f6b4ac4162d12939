use crate::config::{Config, CrmProvider};
use crate::errors::AppError;
use crate::mapping;
use crate::models::{ContactUpdate, LeadContact};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// Outcome of dispatching a lead to a CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmOutcome {
    /// The contact was created.
    Created,
    /// The CRM reported a duplicate; treated as success, the lead is
    /// already on record.
    AlreadyExists,
}

/// CRM adapter selected by configuration.
///
/// Both variants expose the same capability set (create contact, update by
/// email) so the request pipeline is written once. An enum keeps dispatch
/// static; there are exactly two providers and no plugin surface.
#[derive(Clone)]
pub enum CrmClient {
    Brevo(BrevoService),
    Hubspot(HubspotService),
}

impl CrmClient {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match config.crm_provider {
            CrmProvider::Brevo => Ok(CrmClient::Brevo(BrevoService::new(config)?)),
            CrmProvider::Hubspot => Ok(CrmClient::Hubspot(HubspotService::new(config)?)),
        }
    }

    pub async fn create_contact(&self, contact: &LeadContact) -> Result<CrmOutcome, AppError> {
        match self {
            CrmClient::Brevo(service) => service.create_contact(contact).await,
            CrmClient::Hubspot(service) => service.create_contact(contact).await,
        }
    }

    pub async fn update_contact(
        &self,
        email: &str,
        update: &ContactUpdate,
    ) -> Result<(), AppError> {
        match self {
            CrmClient::Brevo(service) => service.update_contact(email, update).await,
            CrmClient::Hubspot(service) => service.update_contact(email, update).await,
        }
    }
}

fn build_client(service: &str) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| {
            AppError::InternalError(format!("Failed to create {} client: {}", service, e))
        })
}

/// Client for the Brevo contacts API.
#[derive(Clone)]
pub struct BrevoService {
    client: Client,
    base_url: String,
    api_key: String,
    leads_list_id: i64,
}

impl BrevoService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let api_key = config.brevo_api_key.clone().ok_or_else(|| {
            AppError::InternalError("BREVO_API_KEY not configured".to_string())
        })?;

        Ok(Self {
            client: build_client("Brevo")?,
            base_url: config.brevo_base_url.clone(),
            api_key,
            leads_list_id: config.brevo_leads_list_id,
        })
    }

    /// Creates a contact and attaches it to the leads list.
    ///
    /// Brevo rejects an already-known email with a 400 carrying code
    /// `duplicate_parameter`; that is a harmless outcome, not an error.
    pub async fn create_contact(&self, contact: &LeadContact) -> Result<CrmOutcome, AppError> {
        let url = format!("{}/contacts", self.base_url);
        let body = json!({
            "email": mapping::contact_email(contact),
            "attributes": mapping::brevo_attributes(contact),
            "listIds": [self.leads_list_id],
        });

        tracing::info!("Creating contact in Brevo list {}", self.leads_list_id);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Brevo request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Contact added to Brevo successfully");
            return Ok(CrmOutcome::Created);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == StatusCode::BAD_REQUEST && is_brevo_duplicate(&error_body) {
            tracing::info!("Contact already exists in Brevo");
            return Ok(CrmOutcome::AlreadyExists);
        }

        Err(AppError::ExternalApiError(format!(
            "Brevo contact creation failed {}: {}",
            status, error_body
        )))
    }

    /// Updates a contact by email. Brevo keys its update endpoint directly
    /// by email, so no lookup round-trip is needed. The email goes into the
    /// URL path and must be percent-encoded ('#' and '%' are legal in the
    /// local part).
    pub async fn update_contact(&self, email: &str, update: &ContactUpdate) -> Result<(), AppError> {
        let url = format!("{}/contacts/{}", self.base_url, urlencoding::encode(email));
        let body = json!({ "attributes": mapping::brevo_update_attributes(update) });

        tracing::info!("Updating contact in Brevo");

        let response = self
            .client
            .put(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Brevo request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Contact updated in Brevo successfully");
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Contact not found".to_string()));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::ExternalApiError(format!(
            "Brevo contact update failed {}: {}",
            status, error_text
        )))
    }
}

/// Brevo duplicate responses carry `{"code": "duplicate_parameter", ...}`.
fn is_brevo_duplicate(error_body: &str) -> bool {
    serde_json::from_str::<Value>(error_body)
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string))
        .as_deref()
        == Some("duplicate_parameter")
}

/// Client for the HubSpot CRM v3 contacts API.
#[derive(Clone)]
pub struct HubspotService {
    client: Client,
    base_url: String,
    access_token: String,
}

impl HubspotService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let access_token = config.hubspot_access_token.clone().ok_or_else(|| {
            AppError::InternalError("HUBSPOT_ACCESS_TOKEN not configured".to_string())
        })?;

        Ok(Self {
            client: build_client("HubSpot")?,
            base_url: config.hubspot_base_url.clone(),
            access_token,
        })
    }

    /// Creates a contact. A 409 CONFLICT means the contact already exists,
    /// which is success from the form's point of view.
    pub async fn create_contact(&self, contact: &LeadContact) -> Result<CrmOutcome, AppError> {
        let url = format!("{}/crm/v3/objects/contacts", self.base_url);
        let body = json!({
            "properties": mapping::hubspot_properties(contact),
            "associations": [],
        });

        tracing::info!("Creating contact in HubSpot");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("HubSpot request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Contact added to HubSpot successfully");
            return Ok(CrmOutcome::Created);
        }
        if status == StatusCode::CONFLICT {
            tracing::info!("Contact already exists in HubSpot");
            return Ok(CrmOutcome::AlreadyExists);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::ExternalApiError(format!(
            "HubSpot contact creation failed {}: {}",
            status, error_text
        )))
    }

    /// Looks up a contact id by email through the search API.
    ///
    /// HubSpot updates are keyed by internal id, not email, so the update
    /// path needs this round-trip first.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<String>, AppError> {
        let url = format!("{}/crm/v3/objects/contacts/search", self.base_url);
        let body = json!({
            "filterGroups": [{
                "filters": [{
                    "propertyName": "email",
                    "operator": "EQ",
                    "value": email,
                }]
            }],
            "properties": ["email"],
            "limit": 1,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("HubSpot search failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "HubSpot search failed {}: {}",
                status, error_text
            )));
        }

        let data: Value = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse HubSpot search response: {}", e))
        })?;

        let contact_id = data
            .get("results")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .and_then(|c| c.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string);

        Ok(contact_id)
    }

    /// Updates a contact by email: search for the internal id, then patch.
    /// No matching contact reports not-found rather than creating one.
    pub async fn update_contact(&self, email: &str, update: &ContactUpdate) -> Result<(), AppError> {
        let contact_id = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Contact not found".to_string()))?;

        let url = format!("{}/crm/v3/objects/contacts/{}", self.base_url, contact_id);
        let body = json!({ "properties": mapping::hubspot_update_properties(update) });

        tracing::info!("Updating contact {} in HubSpot", contact_id);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("HubSpot request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "HubSpot contact update failed {}: {}",
                status, error_text
            )));
        }

        tracing::info!("Contact updated in HubSpot successfully");
        Ok(())
    }
}
