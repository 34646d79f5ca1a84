//! Lead-capture forms.
//!
//! # Data Flow
//! ```text
//! POST body (form-encoded)
//!     → contact.rs / comment.rs / plan.rs (typed record)
//!     → validate() (sanitize + validation.rs rules, all errors collected)
//!     → valid record handed to the submission pipeline
//! ```
//!
//! # Design Decisions
//! - Every field defaults to empty so a missing field is a validation error, not a 4xx
//! - The CSRF token is carried as `Option` and checked before anything else

pub mod comment;
pub mod contact;
pub mod plan;
pub mod validation;

pub use comment::CommentForm;
pub use contact::ContactForm;
pub use plan::PlanSelectionForm;

use crate::config::{RateLimitRule, SiteConfig};

/// The forms accepted by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Contact,
    Comment,
    PlanSelection,
}

impl FormKind {
    pub const ALL: [FormKind; 3] = [FormKind::Contact, FormKind::Comment, FormKind::PlanSelection];

    /// Action name used for rate-limit keys, metrics and the security log.
    pub fn action(self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Comment => "comment",
            FormKind::PlanSelection => "plan_selection",
        }
    }

    pub fn from_action(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.action() == action)
    }

    pub fn rate_limit(self, config: &SiteConfig) -> RateLimitRule {
        match self {
            FormKind::Contact => config.rate_limits.contact,
            FormKind::Comment => config.rate_limits.comment,
            FormKind::PlanSelection => config.rate_limits.plan_selection,
        }
    }

    /// Page the visitor lands on after submitting.
    pub fn redirect_path(self) -> &'static str {
        match self {
            FormKind::Contact => "/contact",
            FormKind::Comment => "/blog",
            FormKind::PlanSelection => "/packages",
        }
    }

    /// Visible fields, in display order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            FormKind::Contact => &["first_name", "last_name", "email", "phone", "service", "message"],
            FormKind::Comment => &["name", "email", "comment"],
            FormKind::PlanSelection => &["package", "name", "email", "phone", "location", "message"],
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            FormKind::Contact => {
                "Thank you for contacting us! We will get back to you within 24 hours."
            }
            FormKind::Comment => {
                "Thank you! Your comment has been submitted and is awaiting moderation."
            }
            FormKind::PlanSelection => {
                "Thank you for choosing a package! Our team will contact you shortly."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_round_trip() {
        for kind in FormKind::ALL {
            assert_eq!(FormKind::from_action(kind.action()), Some(kind));
        }
        assert_eq!(FormKind::from_action("admin"), None);
    }

    #[test]
    fn test_rate_limits_come_from_config() {
        let mut config = SiteConfig::default();
        config.rate_limits.comment = RateLimitRule::new(1, 10);
        assert_eq!(FormKind::Comment.rate_limit(&config), RateLimitRule::new(1, 10));
        assert_eq!(FormKind::Contact.rate_limit(&config), RateLimitRule::new(5, 300));
    }
}
