/// Unit tests for submission screening
/// Tests contact-data validation and the honeypot check against the kinds
/// of payloads the live form actually receives.
use lead_intake_api::models::LeadContactInput;
use lead_intake_api::validation::{is_legitimate_submission, validate_contact, HONEYPOT_FIELDS};
use serde_json::{json, Map, Value};

fn contact(fields: Value) -> LeadContactInput {
    serde_json::from_value(fields).unwrap()
}

#[cfg(test)]
mod contact_data_tests {
    use super::*;

    #[test]
    fn test_accepts_realistic_submissions() {
        let cases = [
            json!({"name": "Dana Levi", "phone": "+972-54-1234567"}),
            json!({"name": "Yossi Cohen", "phone": "0501112222", "email": "yossi@example.com"}),
            json!({
                "name": "Noa Shapira",
                "phone": "(03) 555-1234",
                "type": "labor-law",
                "details": "I was dismissed without a hearing and want to understand my options."
            }),
        ];

        for case in cases {
            let result = validate_contact(&contact(case.clone()));
            assert!(result.is_ok(), "case {} should pass: {:?}", case, result);
        }
    }

    #[test]
    fn test_required_field_failures_in_order() {
        // Name failure wins over the equally-broken phone
        assert_eq!(
            validate_contact(&contact(json!({"name": "D", "phone": "123"}))).unwrap_err(),
            "Invalid or missing name"
        );
        assert_eq!(
            validate_contact(&contact(json!({"name": "Dana Levi", "phone": "123"}))).unwrap_err(),
            "Invalid or missing phone number"
        );
        assert_eq!(
            validate_contact(&contact(json!({"name": "  a  ", "phone": "0541234567"})))
                .unwrap_err(),
            "Invalid or missing name"
        );
    }

    #[test]
    fn test_phone_format_boundaries() {
        // Plus prefix, digits, spaces, hyphens and parentheses are allowed
        assert!(validate_contact(&contact(
            json!({"name": "Dana Levi", "phone": "+972 (54) 123-4567"})
        ))
        .is_ok());

        // Letters are not
        assert_eq!(
            validate_contact(&contact(json!({"name": "Dana Levi", "phone": "054CALLME1"})))
                .unwrap_err(),
            "Invalid phone number format"
        );

        // Plus is only allowed as a leading character
        assert_eq!(
            validate_contact(&contact(json!({"name": "Dana Levi", "phone": "054+1234567"})))
                .unwrap_err(),
            "Invalid phone number format"
        );
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_contact(&contact(
            json!({"name": "Dana Levi", "phone": "0541234567", "email": "dana.levi@firm.co.il"})
        ))
        .is_ok());

        for email in ["dana@", "@firm.co.il", "dana@firm", "dana levi@firm.com"] {
            assert_eq!(
                validate_contact(&contact(
                    json!({"name": "Dana Levi", "phone": "0541234567", "email": email})
                ))
                .unwrap_err(),
                "Invalid email format",
                "email {:?}",
                email
            );
        }
    }

    #[test]
    fn test_spammy_details_rejected_with_suspicious_content() {
        let repeated = "z".repeat(12);
        let cases = [
            "check out www.spam.com for deals",
            "buy viagra today",
            "CONGRATULATIONS!!! click here",
            "AAAAAAAAAAAAAAAAAAAAAAAA",
            repeated.as_str(),
        ];

        for details in cases {
            assert_eq!(
                validate_contact(&contact(
                    json!({"name": "Dana Levi", "phone": "0541234567", "details": details})
                ))
                .unwrap_err(),
                "Suspicious content detected",
                "details {:?}",
                details
            );
        }
    }

    #[test]
    fn test_click_here_style_name_passes_unless_pattern_trips() {
        // "click here now" is only screened in details, not in name
        assert!(validate_contact(&contact(
            json!({"name": "click here now", "phone": "0541234567"})
        ))
        .is_ok());

        assert_eq!(
            validate_contact(&contact(json!({
                "name": "click here now",
                "phone": "0541234567",
                "details": "visit www.spam.com"
            })))
            .unwrap_err(),
            "Suspicious content detected"
        );
    }
}

#[cfg(test)]
mod honeypot_tests {
    use super::*;

    fn extras(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_clean_payload_is_legitimate() {
        assert!(is_legitimate_submission(&Map::new()));
        assert!(is_legitimate_submission(&extras(&[
            ("website", json!("")),
            ("comment", json!("legitimate extra field")),
        ])));
    }

    #[test]
    fn test_any_filled_decoy_marks_bot() {
        for field in HONEYPOT_FIELDS {
            let map = extras(&[(field, json!("https://bot.example"))]);
            assert!(!is_legitimate_submission(&map), "field {}", field);
        }
    }

    #[test]
    fn test_whitespace_only_decoy_is_ignored() {
        assert!(is_legitimate_submission(&extras(&[(
            "company",
            json!("  \t ")
        )])));
    }
}
