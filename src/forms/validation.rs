//! Field rules shared by the forms.
//!
//! Every rule appends to a [`FieldErrors`] list instead of returning early,
//! so one submission reports all of its problems at once.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is valid"));

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 254;

/// Human-readable validation messages for one submission.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// `Ok(value)` when no error was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, Vec<String>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}

/// Require `value` to be between `min` and `max` characters.
pub fn check_length(errors: &mut FieldErrors, label: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(format!("{label} is required."));
    } else if len < min {
        errors.push(format!("{label} must be at least {min} characters."));
    } else if len > max {
        errors.push(format!("{label} must not exceed {max} characters."));
    }
}

/// Like [`check_length`] but an empty value is fine.
pub fn check_optional_length(errors: &mut FieldErrors, label: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(format!("{label} must not exceed {max} characters."));
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX && EMAIL_RE.is_match(email)
}

pub fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.push("Email address is required.");
    } else if !is_valid_email(email) {
        errors.push("Please enter a valid email address.");
    }
}

/// Drop the separators people type into phone numbers.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}

/// Normalized phone number when it has 10 to 15 digits and an optional leading `+`.
pub fn valid_phone(raw: &str) -> Option<String> {
    let phone = normalize_phone(raw);
    PHONE_RE.is_match(&phone).then_some(phone)
}
