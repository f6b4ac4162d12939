/// Anti-abuse validation for contact-form submissions.
///
/// Two layers run before anything reaches a CRM:
/// 1. Honeypot check on decoy form fields bots tend to fill in.
/// 2. Structural and content validation of the submitted contact fields,
///    including a handful of heuristic spam patterns carried over from the
///    production form.
use crate::models::{LeadContact, LeadContactInput};
use regex::Regex;
use serde_json::{Map, Value};

/// Decoy field names rendered invisibly on the form. A human never fills
/// them; a non-blank value marks the submission as automated.
pub const HONEYPOT_FIELDS: [&str; 5] = ["website", "url", "link", "address", "company"];

/// Returns `false` when any honeypot field carries a non-blank value.
pub fn is_legitimate_submission(extra: &Map<String, Value>) -> bool {
    for field in HONEYPOT_FIELDS {
        let tripped = match extra.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            // A bot stuffing a number or object into a decoy field is
            // still a bot.
            Some(_) => true,
        };
        if tripped {
            return false;
        }
    }
    true
}

/// Validates submitted contact data and promotes it to a [`LeadContact`].
///
/// Rules run in a fixed order; the first violation wins and its
/// human-readable message is returned verbatim to the caller.
pub fn validate_contact(input: &LeadContactInput) -> Result<LeadContact, String> {
    let name = match input.name.as_deref() {
        Some(n) if n.trim().chars().count() >= 2 => n,
        _ => return Err("Invalid or missing name".to_string()),
    };

    let phone = match input.phone.as_deref() {
        Some(p) if p.trim().len() >= 8 => p,
        _ => return Err("Invalid or missing phone number".to_string()),
    };

    let phone_regex = Regex::new(r"^\+?[\d\s\-()]{8,20}$").unwrap();
    if !phone_regex.is_match(phone.trim()) {
        return Err("Invalid phone number format".to_string());
    }

    let email = input.email.as_deref().filter(|e| !e.is_empty());
    if let Some(email) = email {
        let email_regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
        if !email_regex.is_match(email) {
            return Err("Invalid email format".to_string());
        }
    }

    if is_suspicious_name(name) {
        return Err("Invalid input detected".to_string());
    }

    let details = input.details.as_deref().filter(|d| !d.is_empty());
    if let Some(details) = details {
        if details.chars().count() > 1000 {
            return Err("Message too long".to_string());
        }
        if is_spammy_details(details) {
            return Err("Suspicious content detected".to_string());
        }
    }

    Ok(LeadContact {
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.map(str::to_string),
        inquiry_type: input.inquiry_type.clone().filter(|t| !t.is_empty()),
        details: details.map(str::to_string),
        source: input.source.clone().filter(|s| !s.is_empty()),
    })
}

/// Heuristic screen for injected markup, URLs and obvious test garbage in
/// the name field.
fn is_suspicious_name(name: &str) -> bool {
    let patterns = [
        r"(?i)https?://",
        r"[<>]",
        r"(?i)script",
        r"(?i)javascript",
        r"(?i)\btest\b.*\btest\b",
    ];

    for pattern in patterns {
        if Regex::new(pattern).unwrap().is_match(name) {
            return true;
        }
    }

    // Names starting with 5+ identical characters ("aaaaa...")
    has_leading_char_run(name, 5)
}

/// Spam heuristics for the free-text details field.
fn is_spammy_details(details: &str) -> bool {
    let patterns = [
        // URLs
        r"(?i)(?:https?://|www\.)\S+",
        // Long strings of caps
        r"[A-Z]{20,}",
        // Keyword list
        r"(?i)\b(?:viagra|cialis|casino|lottery|winner|congratulations|click here|free money)\b",
    ];

    for pattern in patterns {
        if Regex::new(pattern).unwrap().is_match(details) {
            return true;
        }
    }

    // 11+ identical consecutive characters anywhere
    has_char_run(details, 11)
}

/// True when the string starts with `min` or more identical characters.
fn has_leading_char_run(s: &str, min: usize) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => 1 + chars.take_while(|&c| c == first).count() >= min,
        None => false,
    }
}

/// True when the string contains a run of `min` or more identical characters.
fn has_char_run(s: &str, min: usize) -> bool {
    let mut prev = None;
    let mut run = 0;
    for c in s.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= min {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(name: &str, phone: &str) -> LeadContactInput {
        LeadContactInput {
            name: Some(name.to_string()),
            phone: Some(phone.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_plain_contact() {
        let contact = validate_contact(&input("Dana Levi", "+972-54-1234567")).unwrap();
        assert_eq!(contact.name, "Dana Levi");
        assert_eq!(contact.phone, "+972-54-1234567");
        assert!(contact.email.is_none());
    }

    #[test]
    fn test_rejects_short_name_and_phone() {
        assert_eq!(
            validate_contact(&input("D", "0541234567")).unwrap_err(),
            "Invalid or missing name"
        );
        assert_eq!(
            validate_contact(&input("Dana Levi", "123")).unwrap_err(),
            "Invalid or missing phone number"
        );
        assert_eq!(
            validate_contact(&LeadContactInput::default()).unwrap_err(),
            "Invalid or missing name"
        );
    }

    #[test]
    fn test_rejects_malformed_phone() {
        assert_eq!(
            validate_contact(&input("Dana Levi", "05x1234567")).unwrap_err(),
            "Invalid phone number format"
        );
        // 21 characters exceed the pattern's upper bound
        assert_eq!(
            validate_contact(&input("Dana Levi", "123456789012345678901")).unwrap_err(),
            "Invalid phone number format"
        );
    }

    #[test]
    fn test_email_optional_but_validated() {
        let mut i = input("Dana Levi", "0541234567");
        i.email = Some("dana@example.com".to_string());
        assert!(validate_contact(&i).is_ok());

        i.email = Some("not-an-email".to_string());
        assert_eq!(validate_contact(&i).unwrap_err(), "Invalid email format");

        // Empty string is treated as absent
        i.email = Some(String::new());
        assert!(validate_contact(&i).unwrap().email.is_none());
    }

    #[test]
    fn test_rejects_suspicious_names() {
        for name in [
            "https://spam.example",
            "<b>bold</b>",
            "javascript:alert(1)",
            "test something test",
            "aaaaaa",
        ] {
            assert_eq!(
                validate_contact(&input(name, "0541234567")).unwrap_err(),
                "Invalid input detected",
                "name {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_details_spam_patterns() {
        let mut i = input("Dana Levi", "0541234567");

        i.details = Some("I need help with a rental contract".to_string());
        assert!(validate_contact(&i).is_ok());

        i.details = Some("visit www.spam.com now".to_string());
        assert_eq!(
            validate_contact(&i).unwrap_err(),
            "Suspicious content detected"
        );

        i.details = Some("CONGRATULATIONS you are a winner".to_string());
        assert_eq!(
            validate_contact(&i).unwrap_err(),
            "Suspicious content detected"
        );

        i.details = Some("!".repeat(11));
        assert_eq!(
            validate_contact(&i).unwrap_err(),
            "Suspicious content detected"
        );

        i.details = Some("a ".repeat(501));
        assert_eq!(validate_contact(&i).unwrap_err(), "Message too long");
    }

    #[test]
    fn test_honeypot_blank_values_pass() {
        let mut extra = Map::new();
        extra.insert("website".to_string(), json!(""));
        extra.insert("company".to_string(), json!("   "));
        extra.insert("unrelated".to_string(), json!("kept"));
        assert!(is_legitimate_submission(&extra));
    }

    #[test]
    fn test_honeypot_trips_on_any_decoy() {
        for field in HONEYPOT_FIELDS {
            let mut extra = Map::new();
            extra.insert(field.to_string(), json!("filled by a bot"));
            assert!(!is_legitimate_submission(&extra), "field {}", field);
        }

        let mut extra = Map::new();
        extra.insert("url".to_string(), json!(42));
        assert!(!is_legitimate_submission(&extra));
    }

    #[test]
    fn test_char_run_helpers() {
        assert!(has_leading_char_run("aaaaab", 5));
        assert!(!has_leading_char_run("abaaaa", 5));
        assert!(has_char_run("xx!!!!!!!!!!!yy", 11));
        assert!(!has_char_run("abababababab", 2));
        assert!(!has_char_run("", 1));
    }
}
