//! Session flash messages and preserved form input.
//!
//! A redirect carries no body, so outcomes travel through the session: the
//! handler stores a [`Flash`] and the next page render takes it (reading
//! removes it). Old input is kept per form until a submission succeeds.

use std::collections::HashMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::forms::FormKind;
use crate::security::sanitize::escape_html;

const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub messages: Vec<String>,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            messages: vec![message.into()],
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            messages: vec![message.into()],
        }
    }

    pub fn errors(messages: Vec<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            messages,
        }
    }

    /// Store for the next render. Failures are logged, not raised.
    pub async fn store(&self, session: &Session) {
        if let Err(e) = session.insert(FLASH_KEY, self).await {
            tracing::error!(error = %e, "Failed to store flash message");
        }
    }

    /// Remove and return the pending flash, if any.
    pub async fn take(session: &Session) -> Option<Flash> {
        match session.remove::<Flash>(FLASH_KEY).await {
            Ok(flash) => flash,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read flash message");
                None
            }
        }
    }

    /// Escaped markup for the page template.
    pub fn render(&self) -> String {
        let class = match self.kind {
            FlashKind::Success => "alert alert-success",
            FlashKind::Error => "alert alert-danger",
        };
        let mut html = format!("<div class=\"{class}\" role=\"alert\">");
        if let [single] = self.messages.as_slice() {
            let _ = write!(html, "{}", escape_html(single));
        } else {
            html.push_str("<ul>");
            for message in &self.messages {
                let _ = write!(html, "<li>{}</li>", escape_html(message));
            }
            html.push_str("</ul>");
        }
        html.push_str("</div>");
        html
    }
}

fn old_input_key(form: FormKind) -> String {
    format!("old_input:{}", form.action())
}

pub async fn store_old_input(session: &Session, form: FormKind, values: HashMap<String, String>) {
    if let Err(e) = session.insert(&old_input_key(form), values).await {
        tracing::error!(form = form.action(), error = %e, "Failed to store old input");
    }
}

pub async fn old_input(session: &Session, form: FormKind) -> HashMap<String, String> {
    match session.get::<HashMap<String, String>>(&old_input_key(form)).await {
        Ok(values) => values.unwrap_or_default(),
        Err(e) => {
            tracing::error!(form = form.action(), error = %e, "Failed to read old input");
            HashMap::new()
        }
    }
}

pub async fn clear_old_input(session: &Session, form: FormKind) {
    if let Err(e) = session
        .remove::<HashMap<String, String>>(&old_input_key(form))
        .await
    {
        tracing::error!(form = form.action(), error = %e, "Failed to clear old input");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_message_render() {
        let html = Flash::success("Saved <ok>").render();
        assert_eq!(
            html,
            "<div class=\"alert alert-success\" role=\"alert\">Saved &lt;ok&gt;</div>"
        );
    }

    #[test]
    fn test_multiple_messages_render_as_list() {
        let html = Flash::errors(vec!["Name is required.".into(), "Bad \"email\"".into()]).render();
        assert!(html.starts_with("<div class=\"alert alert-danger\""));
        assert!(html.contains("<li>Name is required.</li>"));
        assert!(html.contains("<li>Bad &quot;email&quot;</li>"));
    }

    #[test]
    fn test_serialized_kind_is_lowercase() {
        let json = serde_json::to_string(&Flash::error("x")).unwrap();
        assert_eq!(json, r#"{"kind":"error","messages":["x"]}"#);
    }
}
