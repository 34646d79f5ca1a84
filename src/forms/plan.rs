//! Package (plan) selection form.

use std::collections::HashMap;

use serde::Deserialize;

use crate::forms::validation::{
    check_email, check_length, check_optional_length, valid_phone, FieldErrors, NAME_MAX, NAME_MIN,
};
use crate::security::sanitize::sanitize_for_storage;

const LOCATION_MAX: usize = 100;
const MESSAGE_MAX: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanSelectionForm {
    pub csrf_token: Option<String>,
    /// Name of the selected package.
    pub package: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPlanSelection {
    pub package: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: Option<String>,
    pub message: Option<String>,
}

impl PlanSelectionForm {
    /// Check the fields. Whether the package exists is left to the caller.
    pub fn validate(&self) -> Result<ValidPlanSelection, Vec<String>> {
        let package = sanitize_for_storage(&self.package);
        let name = sanitize_for_storage(&self.name);
        let email = sanitize_for_storage(&self.email).to_lowercase();
        let phone = sanitize_for_storage(&self.phone);
        let location = sanitize_for_storage(&self.location);
        let message = sanitize_for_storage(&self.message);

        let mut errors = FieldErrors::new();
        if package.is_empty() {
            errors.push("Please select a package.");
        }
        check_length(&mut errors, "Name", &name, NAME_MIN, NAME_MAX);
        check_email(&mut errors, &email);

        let phone = if phone.is_empty() {
            errors.push("Phone number is required.");
            String::new()
        } else {
            valid_phone(&phone).unwrap_or_else(|| {
                errors.push("Please enter a valid phone number (10-15 digits, optional leading +).");
                String::new()
            })
        };

        check_optional_length(&mut errors, "Location", &location, LOCATION_MAX);
        check_optional_length(&mut errors, "Message", &message, MESSAGE_MAX);

        errors.finish(ValidPlanSelection {
            package,
            name,
            email,
            phone,
            location: (!location.is_empty()).then_some(location),
            message: (!message.is_empty()).then_some(message),
        })
    }

    pub fn old_input(&self) -> HashMap<String, String> {
        [
            ("package", &self.package),
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("location", &self.location),
            ("message", &self.message),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), sanitize_for_storage(v)))
        .collect()
    }
}
