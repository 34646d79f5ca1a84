//! Contact form.

use std::collections::HashMap;

use serde::Deserialize;

use crate::forms::validation::{
    check_email, check_length, check_optional_length, valid_phone, FieldErrors, NAME_MAX, NAME_MIN,
};
use crate::security::sanitize::sanitize_for_storage;

pub const MESSAGE_MIN: usize = 10;
pub const MESSAGE_MAX: usize = 2000;
const SERVICE_MAX: usize = 100;

/// Contact form fields as posted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub csrf_token: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub service: String,
    pub message: String,
}

/// Sanitized, validated contact enquiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: String,
}

impl ContactForm {
    /// Sanitize every field and check all rules.
    pub fn validate(&self) -> Result<ValidContact, Vec<String>> {
        let first_name = sanitize_for_storage(&self.first_name);
        let last_name = sanitize_for_storage(&self.last_name);
        let email = sanitize_for_storage(&self.email).to_lowercase();
        let phone = sanitize_for_storage(&self.phone);
        let service = sanitize_for_storage(&self.service);
        let message = sanitize_for_storage(&self.message);

        let mut errors = FieldErrors::new();
        check_length(&mut errors, "First name", &first_name, NAME_MIN, NAME_MAX);
        check_length(&mut errors, "Last name", &last_name, NAME_MIN, NAME_MAX);
        check_email(&mut errors, &email);

        let phone = if phone.is_empty() {
            None
        } else {
            let normalized = valid_phone(&phone);
            if normalized.is_none() {
                errors.push("Please enter a valid phone number (10-15 digits, optional leading +).");
            }
            normalized
        };

        check_optional_length(&mut errors, "Service", &service, SERVICE_MAX);
        check_length(&mut errors, "Message", &message, MESSAGE_MIN, MESSAGE_MAX);

        errors.finish(ValidContact {
            first_name,
            last_name,
            email,
            phone,
            service: (!service.is_empty()).then_some(service),
            message,
        })
    }

    /// Submitted values to re-fill the form with, minus the token.
    pub fn old_input(&self) -> HashMap<String, String> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("service", &self.service),
            ("message", &self.message),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), sanitize_for_storage(v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            csrf_token: Some("token".into()),
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "Asha@Example.com".into(),
            phone: "+919812345678".into(),
            service: String::new(),
            message: "I would like a quote for a 2000 sqft villa in Nagpur.".into(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let contact = valid_form().validate().unwrap();
        assert_eq!(contact.first_name, "Asha");
        assert_eq!(contact.email, "asha@example.com");
        assert_eq!(contact.phone.as_deref(), Some("+919812345678"));
        assert_eq!(contact.service, None);
    }

    #[test]
    fn test_phone_is_optional() {
        let form = ContactForm {
            phone: "   ".into(),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap().phone, None);
    }

    #[test]
    fn test_reports_every_problem() {
        let form = ContactForm {
            csrf_token: None,
            first_name: "A".into(),
            last_name: String::new(),
            email: "not-an-email".into(),
            phone: "123".into(),
            service: String::new(),
            message: "short".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.starts_with("First name")));
        assert!(errors.iter().any(|e| e.starts_with("Last name")));
        assert!(errors.iter().any(|e| e.contains("email")));
        assert!(errors.iter().any(|e| e.contains("phone")));
        assert!(errors.iter().any(|e| e.starts_with("Message")));
    }

    #[test]
    fn test_control_characters_do_not_count_toward_length() {
        let form = ContactForm {
            first_name: "\0A\n".into(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors, vec!["First name must be at least 2 characters."]);
    }

    #[test]
    fn test_old_input_excludes_token() {
        let old = valid_form().old_input();
        assert_eq!(old.get("first_name").map(String::as_str), Some("Asha"));
        assert!(!old.contains_key("csrf_token"));
        assert_eq!(old.len(), 6);
    }
}
