//! Blog comment form.

use std::collections::HashMap;

use serde::Deserialize;

use crate::forms::validation::{check_email, check_length, FieldErrors, NAME_MAX, NAME_MIN};
use crate::security::sanitize::sanitize_for_storage;

pub const COMMENT_MIN: usize = 3;
pub const COMMENT_MAX: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub csrf_token: Option<String>,
    pub article_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidComment {
    pub name: String,
    pub email: String,
    pub comment: String,
}

impl CommentForm {
    /// Positive numeric article id, if the field holds one.
    pub fn article_id(&self) -> Option<i64> {
        self.article_id
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
    }

    pub fn validate(&self) -> Result<ValidComment, Vec<String>> {
        let name = sanitize_for_storage(&self.name);
        let email = sanitize_for_storage(&self.email).to_lowercase();
        let comment = sanitize_for_storage(&self.comment);

        let mut errors = FieldErrors::new();
        check_length(&mut errors, "Name", &name, NAME_MIN, NAME_MAX);
        check_email(&mut errors, &email);
        check_length(&mut errors, "Comment", &comment, COMMENT_MIN, COMMENT_MAX);

        errors.finish(ValidComment {
            name,
            email,
            comment,
        })
    }

    pub fn old_input(&self) -> HashMap<String, String> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("comment", &self.comment),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), sanitize_for_storage(v)))
        .collect()
    }
}
