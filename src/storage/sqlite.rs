//! SQLite repository backed by a sqlx pool.
//!
//! The schema is created on connect when missing. Use `sqlite::memory:`
//! for throwaway databases and `sqlite://path/site.db?mode=rwc` to create
//! a file on first run.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::storage::{
    Article, ContactMessage, NewComment, Package, PlanEnquiry, Repository, StorageError,
    COMMENT_STATUS_PENDING,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        published INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS packages (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        price TEXT,
        content TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS contact_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        service TEXT,
        message TEXT NOT NULL,
        ip_address TEXT NOT NULL,
        user_agent TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL REFERENCES articles(id),
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        comment TEXT NOT NULL,
        status TEXT NOT NULL,
        ip_address TEXT NOT NULL,
        user_agent TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS plan_enquiries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        package_id INTEGER NOT NULL REFERENCES packages(id),
        package_name TEXT NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        location TEXT,
        message TEXT,
        ip_address TEXT NOT NULL,
        user_agent TEXT,
        created_at TEXT NOT NULL
    )",
];

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect and make sure the schema exists.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let repo = Self { pool };
        repo.migrate().await?;
        tracing::info!(url, "SQLite repository ready");
        Ok(repo)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn add_article(&self, article: &Article) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO articles (id, title, slug, published) VALUES (?, ?, ?, ?)")
            .bind(article.id)
            .bind(&article.title)
            .bind(&article.slug)
            .bind(article.published)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_package(&self, package: &Package) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO packages (id, name, price, content) VALUES (?, ?, ?, ?)")
            .bind(package.id)
            .bind(&package.name)
            .bind(&package.price)
            .bind(&package.content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO contact_messages
                (first_name, last_name, email, phone, service, message, ip_address, user_agent, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.first_name)
        .bind(&message.last_name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(&message.service)
        .bind(&message.message)
        .bind(message.client.address.to_string())
        .bind(&message.client.user_agent)
        .bind(message.submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO comments
                (article_id, name, email, comment, status, ip_address, user_agent, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.article_id)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.comment)
        .bind(COMMENT_STATUS_PENDING)
        .bind(comment.client.address.to_string())
        .bind(&comment.client.user_agent)
        .bind(comment.submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn insert_plan_enquiry(&self, enquiry: &PlanEnquiry) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO plan_enquiries
                (package_id, package_name, name, email, phone, location, message, ip_address, user_agent, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(enquiry.package_id)
        .bind(&enquiry.package_name)
        .bind(&enquiry.name)
        .bind(&enquiry.email)
        .bind(&enquiry.phone)
        .bind(&enquiry.location)
        .bind(&enquiry.message)
        .bind(enquiry.client.address.to_string())
        .bind(&enquiry.client.user_agent)
        .bind(enquiry.submitted_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn find_published_article(&self, id: i64) -> Result<Option<Article>, StorageError> {
        let row: Option<(i64, String, String, bool)> = sqlx::query_as(
            "SELECT id, title, slug, published FROM articles WHERE id = ? AND published = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, title, slug, published)| Article {
            id,
            title,
            slug,
            published,
        }))
    }

    async fn list_packages(&self) -> Result<Vec<Package>, StorageError> {
        let rows: Vec<(i64, String, Option<String>, String)> =
            sqlx::query_as("SELECT id, name, price, content FROM packages ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, price, content)| Package {
                id,
                name,
                price,
                content,
            })
            .collect())
    }
}
