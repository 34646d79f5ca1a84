//! Persistence boundary.
//!
//! # Data Flow
//! ```text
//! form handler (validated, sanitized record)
//!     → Repository trait
//!         → memory.rs (in-process, default and tests)
//!         → sqlite.rs (sqlx SQLite pool)
//! ```
//!
//! # Design Decisions
//! - Submissions are insert-only; nothing here updates or deletes them
//! - Every call returns `Result<_, StorageError>`; handlers turn errors into a generic message
//! - Page data (articles, packages) is read-only from this side

pub mod memory;
pub mod sqlite;

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

/// Failure of the storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Where a submission came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub address: IpAddr,
    pub user_agent: Option<String>,
}

/// Contact form enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Service the enquiry is about, when the visitor picked one.
    pub service: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    pub client: ClientMeta,
}

/// Blog comment awaiting moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub article_id: i64,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub submitted_at: DateTime<Utc>,
    pub client: ClientMeta,
}

/// Moderation status given to new comments.
pub const COMMENT_STATUS_PENDING: &str = "pending";

/// Enquiry about a construction package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEnquiry {
    pub package_id: i64,
    pub package_name: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: Option<String>,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub client: ClientMeta,
}

/// Blog article as far as the comment form cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub published: bool,
}

/// Construction package with its free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub price: Option<String>,
    pub content: String,
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<i64, StorageError>;

    async fn insert_comment(&self, comment: &NewComment) -> Result<i64, StorageError>;

    async fn insert_plan_enquiry(&self, enquiry: &PlanEnquiry) -> Result<i64, StorageError>;

    /// Article by id, only if it is published.
    async fn find_published_article(&self, id: i64) -> Result<Option<Article>, StorageError>;

    async fn list_packages(&self) -> Result<Vec<Package>, StorageError>;

    /// Package by name, ignoring ASCII case.
    async fn find_package_by_name(&self, name: &str) -> Result<Option<Package>, StorageError> {
        Ok(self
            .list_packages()
            .await?
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name)))
    }
}
