use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw contact fields as submitted by the site's contact form.
///
/// Every field is optional at the wire level; the validator decides what is
/// actually required and promotes the input to a [`LeadContact`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LeadContactInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Inquiry category selected on the form.
    #[serde(default, rename = "type")]
    pub inquiry_type: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A validated lead, ready for CRM mapping.
///
/// Only produced by `validation::validate_contact`; `name` and `phone` are
/// guaranteed present and well-formed, `email` is either a valid address or
/// absent (the mapper synthesizes a placeholder from the phone).
#[derive(Debug, Clone, Serialize)]
pub struct LeadContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub inquiry_type: Option<String>,
    pub details: Option<String>,
    pub source: Option<String>,
}

/// Partial contact data for the `update-contact` action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "type")]
    pub inquiry_type: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Inbound submission payload, action-dispatched.
///
/// The frontend sends either
/// `{action: "add-lead", contactData, recaptchaToken, ...}` or
/// `{action: "update-contact", email, data}`. Unknown top-level fields are
/// collected into `extra` so the honeypot check can inspect the decoy
/// fields the form renders invisibly.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub action: String,
    #[serde(default)]
    pub contact_data: Option<LeadContactInput>,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub data: Option<ContactUpdate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_lead_payload() {
        let json = r#"
        {
            "action": "add-lead",
            "contactData": {
                "name": "Dana Levi",
                "phone": "+972-54-1234567",
                "type": "family-law"
            },
            "recaptchaToken": "tok123",
            "website": ""
        }
        "#;

        let payload: SubmissionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.action, "add-lead");
        assert_eq!(payload.recaptcha_token.as_deref(), Some("tok123"));

        let contact = payload.contact_data.unwrap();
        assert_eq!(contact.name.as_deref(), Some("Dana Levi"));
        assert_eq!(contact.inquiry_type.as_deref(), Some("family-law"));

        // Honeypot decoys land in the flattened extras
        assert!(payload.extra.contains_key("website"));
    }

    #[test]
    fn test_parse_update_payload() {
        let json = r#"
        {
            "action": "update-contact",
            "email": "dana@example.com",
            "data": { "phone": "0541234567" }
        }
        "#;

        let payload: SubmissionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.action, "update-contact");
        assert_eq!(payload.email.as_deref(), Some("dana@example.com"));
        assert_eq!(payload.data.unwrap().phone.as_deref(), Some("0541234567"));
    }
}
