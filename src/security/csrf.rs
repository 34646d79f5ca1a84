//! CSRF token manager.
//!
//! # Responsibilities
//! - Issue one random secret per session (256 bits, hex encoded)
//! - Render the hidden form field carrying it
//! - Validate submitted tokens in constant time
//!
//! # Design Decisions
//! - Validation never errors: any missing piece is simply `false`
//! - A failed validation leaves the token in place so the user can retry

use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

use crate::security::sanitize::escape_html;
use crate::security::session::SessionState;

/// Name of the hidden form field.
pub const CSRF_FIELD: &str = "csrf_token";

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh token from the OS random source.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Return the session's token, creating it first if there is none.
pub fn issue_token(state: &mut SessionState) -> &str {
    state.csrf_token.get_or_insert_with(generate_token)
}

/// Hidden input carrying the session token, ready to embed in a form.
pub fn render_hidden_field(state: &mut SessionState) -> String {
    let token = escape_html(issue_token(state));
    format!(r#"<input type="hidden" name="{CSRF_FIELD}" value="{token}">"#)
}

/// Check a submitted token against the session's token.
pub fn validate(state: &SessionState, submitted: Option<&str>) -> bool {
    let (Some(expected), Some(submitted)) = (state.csrf_token.as_deref(), submitted) else {
        return false;
    };
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_issued_token_validates() {
        let mut state = SessionState::default();
        let token = issue_token(&mut state).to_string();

        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(validate(&state, Some(&token)));
    }

    #[test]
    fn test_issue_is_idempotent() {
        let mut state = SessionState::default();
        let first = issue_token(&mut state).to_string();
        let second = issue_token(&mut state).to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mismatch_keeps_token() {
        let mut state = SessionState::default();
        let token = issue_token(&mut state).to_string();

        assert!(!validate(&state, Some("not-the-token")));
        assert!(!validate(&state, Some(&token[..token.len() - 1])));
        assert_eq!(state.csrf_token.as_deref(), Some(token.as_str()));
        assert!(validate(&state, Some(&token)));
    }

    #[test]
    fn test_fresh_session_rejects_everything() {
        let state = SessionState::default();
        let other_session_token = generate_token();

        assert!(!validate(&state, Some(&other_session_token)));
        assert!(!validate(&state, Some("")));
        assert!(!validate(&state, None));
    }

    #[test]
    fn test_missing_submission_rejected() {
        let mut state = SessionState::default();
        issue_token(&mut state);
        assert!(!validate(&state, None));
        assert!(!validate(&state, Some("")));
    }

    #[test]
    fn test_hidden_field_embeds_token() {
        let mut state = SessionState::default();
        let field = render_hidden_field(&mut state);
        let token = state.csrf_token.clone().unwrap();

        assert_eq!(
            field,
            format!(r#"<input type="hidden" name="csrf_token" value="{token}">"#)
        );
    }

    #[test]
    fn test_hidden_field_escapes_stored_value() {
        let mut state = SessionState {
            csrf_token: Some(r#""><script>"#.to_string()),
            ..Default::default()
        };
        let field = render_hidden_field(&mut state);
        assert!(!field.contains("<script>"));
        assert!(field.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn test_tokens_do_not_collide() {
        let tokens: HashSet<String> = (0..10_000).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 10_000);
    }
}
