/// Field mapping from a validated lead into CRM-specific attribute sets.
///
/// Each CRM configures custom fields differently from site to site, so the
/// inquiry type and free-text details are written redundantly under several
/// attribute names to land in whichever field the account actually has.
use crate::models::{ContactUpdate, LeadContact};
use serde_json::{Map, Value};

/// Splits a full name into (first, rest-joined) tokens.
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Deterministic placeholder address for contacts submitted without an
/// email. Both CRMs key contacts by email, so `<digits-only phone>` gives a
/// stable unique identifier.
pub fn placeholder_email(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}@placeholder.com", digits)
}

/// The email a contact is created under: the submitted one, or the
/// phone-derived placeholder.
pub fn contact_email(contact: &LeadContact) -> String {
    contact
        .email
        .clone()
        .unwrap_or_else(|| placeholder_email(&contact.phone))
}

/// Brevo attribute map for creating a contact.
pub fn brevo_attributes(contact: &LeadContact) -> Map<String, Value> {
    let (first, last) = split_name(&contact.name);

    let mut attrs = Map::new();
    attrs.insert("FIRSTNAME".to_string(), Value::String(first));
    attrs.insert("LASTNAME".to_string(), Value::String(last));
    attrs.insert("PHONE".to_string(), Value::String(contact.phone.clone()));
    attrs.insert(
        "SOURCE".to_string(),
        Value::String(
            contact
                .source
                .clone()
                .unwrap_or_else(|| "website".to_string()),
        ),
    );

    if let Some(ref inquiry_type) = contact.inquiry_type {
        for key in ["CONTACT_TYPE", "TYPE", "INQUIRY_TYPE"] {
            attrs.insert(key.to_string(), Value::String(inquiry_type.clone()));
        }
    }

    if let Some(ref details) = contact.details {
        for key in ["DETAILS", "MESSAGE", "CAUSE"] {
            attrs.insert(key.to_string(), Value::String(details.clone()));
        }
    }

    attrs
}

/// Brevo attribute map for a partial update.
pub fn brevo_update_attributes(update: &ContactUpdate) -> Map<String, Value> {
    let mut attrs = Map::new();

    if let Some(ref name) = update.name {
        let (first, last) = split_name(name);
        attrs.insert("FIRSTNAME".to_string(), Value::String(first));
        attrs.insert("LASTNAME".to_string(), Value::String(last));
    }
    if let Some(ref phone) = update.phone {
        attrs.insert("PHONE".to_string(), Value::String(phone.clone()));
    }
    if let Some(ref inquiry_type) = update.inquiry_type {
        for key in ["CONTACT_TYPE", "TYPE", "INQUIRY_TYPE"] {
            attrs.insert(key.to_string(), Value::String(inquiry_type.clone()));
        }
    }
    if let Some(ref details) = update.details {
        for key in ["DETAILS", "MESSAGE", "CAUSE"] {
            attrs.insert(key.to_string(), Value::String(details.clone()));
        }
    }

    attrs
}

/// HubSpot property map for creating a contact. HubSpot requires a unique
/// identifier, so `email` is always present (placeholder when missing).
pub fn hubspot_properties(contact: &LeadContact) -> Map<String, Value> {
    let (first, last) = split_name(&contact.name);

    let mut properties = Map::new();
    properties.insert("firstname".to_string(), Value::String(first));
    properties.insert("lastname".to_string(), Value::String(last));
    properties.insert("phone".to_string(), Value::String(contact.phone.clone()));
    properties.insert("email".to_string(), Value::String(contact_email(contact)));
    properties.insert(
        "hs_lead_source".to_string(),
        Value::String(
            contact
                .source
                .clone()
                .unwrap_or_else(|| "website".to_string()),
        ),
    );

    if let Some(ref inquiry_type) = contact.inquiry_type {
        properties.insert("contact_type".to_string(), Value::String(inquiry_type.clone()));
    }
    if let Some(ref details) = contact.details {
        properties.insert("message".to_string(), Value::String(details.clone()));
    }

    properties
}

/// HubSpot property map for a partial update.
pub fn hubspot_update_properties(update: &ContactUpdate) -> Map<String, Value> {
    let mut properties = Map::new();

    if let Some(ref name) = update.name {
        let (first, last) = split_name(name);
        properties.insert("firstname".to_string(), Value::String(first));
        properties.insert("lastname".to_string(), Value::String(last));
    }
    if let Some(ref phone) = update.phone {
        properties.insert("phone".to_string(), Value::String(phone.clone()));
    }
    if let Some(ref inquiry_type) = update.inquiry_type {
        properties.insert("contact_type".to_string(), Value::String(inquiry_type.clone()));
    }
    if let Some(ref details) = update.details {
        properties.insert("message".to_string(), Value::String(details.clone()));
    }

    properties
}
