//! In-process repository.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::storage::{
    Article, ContactMessage, NewComment, Package, PlanEnquiry, Repository, StorageError,
};

#[derive(Default)]
struct Submissions {
    contact: Vec<(i64, ContactMessage)>,
    comments: Vec<(i64, NewComment)>,
    enquiries: Vec<(i64, PlanEnquiry)>,
}

/// Repository kept in memory; cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    articles: Arc<DashMap<i64, Article>>,
    packages: Arc<DashMap<i64, Package>>,
    submissions: Arc<Mutex<Submissions>>,
    next_id: Arc<AtomicI64>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with a few articles and the standard packages.
    pub fn with_demo_content() -> Self {
        let repo = Self::new();
        repo.add_article(Article {
            id: 1,
            title: "Choosing the right foundation for black cotton soil".into(),
            slug: "foundation-black-cotton-soil".into(),
            published: true,
        });
        repo.add_article(Article {
            id: 2,
            title: "Monsoon-proofing your new home".into(),
            slug: "monsoon-proofing".into(),
            published: true,
        });
        repo.add_article(Article {
            id: 3,
            title: "Draft: 2027 material price outlook".into(),
            slug: "material-price-outlook".into(),
            published: false,
        });
        repo.add_package(Package {
            id: 1,
            name: "Basic".into(),
            price: Some("₹1,650 / sqft".into()),
            content: "Cement: ACC or equivalent\nSteel: Kamdhenu Fe 500\nBricks: Red clay bricks\n\
                      Flooring: Vitrified tiles up to ₹50/sqft\nPainting: Tractor emulsion\n\
                      Electrical: Anchor wiring and switches"
                .into(),
        });
        repo.add_package(Package {
            id: 2,
            name: "Standard".into(),
            price: Some("₹1,850 / sqft".into()),
            content: "Cement: UltraTech\nSteel: JSW Neosteel Fe 550\nBricks: Fly ash bricks\n\
                      Flooring: Vitrified tiles up to ₹80/sqft\nKitchen: Granite platform with SS sink\n\
                      Painting: Asian Paints Apcolite\nElectrical: Finolex wiring, Legrand switches\n\
                      Plumbing: Ashirvad CPVC"
                .into(),
        });
        repo.add_package(Package {
            id: 3,
            name: "Premium".into(),
            price: Some("₹2,250 / sqft".into()),
            content: "Cement: UltraTech or Ambuja\nSteel: Tata Tiscon Fe 550D\nBricks: AAC blocks\n\
                      Flooring: Italian marble in living areas\nKitchen: Modular kitchen allowance\n\
                      Bathroom: Jaquar fittings\nDoors: Teak main door\nWindows: UPVC sliding windows\n\
                      Painting: Asian Paints Royale\nElectrical: Havells wiring, Schneider switches\n\
                      Plumbing: Astral CPVC"
                .into(),
        });
        repo
    }

    pub fn add_article(&self, article: Article) {
        self.articles.insert(article.id, article);
    }

    pub fn add_package(&self, package: Package) {
        self.packages.insert(package.id, package);
    }

    /// Make every write fail, as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contact_messages(&self) -> Vec<ContactMessage> {
        self.lock().contact.iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn comments(&self) -> Vec<NewComment> {
        self.lock().comments.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn plan_enquiries(&self) -> Vec<PlanEnquiry> {
        self.lock().enquiries.iter().map(|(_, e)| e.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Submissions> {
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("memory repository marked unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<i64, StorageError> {
        self.check_available()?;
        let id = self.allocate_id();
        self.lock().contact.push((id, message.clone()));
        Ok(id)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<i64, StorageError> {
        self.check_available()?;
        let id = self.allocate_id();
        self.lock().comments.push((id, comment.clone()));
        Ok(id)
    }

    async fn insert_plan_enquiry(&self, enquiry: &PlanEnquiry) -> Result<i64, StorageError> {
        self.check_available()?;
        let id = self.allocate_id();
        self.lock().enquiries.push((id, enquiry.clone()));
        Ok(id)
    }

    async fn find_published_article(&self, id: i64) -> Result<Option<Article>, StorageError> {
        Ok(self
            .articles
            .get(&id)
            .filter(|a| a.published)
            .map(|a| a.value().clone()))
    }

    async fn list_packages(&self) -> Result<Vec<Package>, StorageError> {
        let mut packages: Vec<Package> = self.packages.iter().map(|p| p.value().clone()).collect();
        packages.sort_by_key(|p| p.id);
        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ClientMeta;
    use chrono::Utc;

    fn comment(article_id: i64) -> NewComment {
        NewComment {
            article_id,
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            comment: "Very helpful, thanks!".into(),
            submitted_at: Utc::now(),
            client: ClientMeta {
                address: "127.0.0.1".parse().unwrap(),
                user_agent: None,
            },
        }
    }

    #[tokio::test]
    async fn test_only_published_articles_are_found() {
        let repo = MemoryRepository::with_demo_content();
        assert!(repo.find_published_article(1).await.unwrap().is_some());
        assert!(repo.find_published_article(3).await.unwrap().is_none());
        assert!(repo.find_published_article(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inserts_are_recorded_with_increasing_ids() {
        let repo = MemoryRepository::new();
        let first = repo.insert_comment(&comment(1)).await.unwrap();
        let second = repo.insert_comment(&comment(2)).await.unwrap();

        assert!(second > first);
        assert_eq!(repo.comments().len(), 2);
        assert_eq!(repo.comments()[1].article_id, 2);
    }

    #[tokio::test]
    async fn test_unavailable_rejects_writes() {
        let repo = MemoryRepository::new();
        repo.set_unavailable(true);
        assert!(matches!(
            repo.insert_comment(&comment(1)).await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(repo.comments().is_empty());
    }

    #[tokio::test]
    async fn test_packages_sorted_and_found_by_name() {
        let repo = MemoryRepository::with_demo_content();
        let names: Vec<String> = repo.list_packages().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Basic", "Standard", "Premium"]);

        let found = repo.find_package_by_name("premium").await.unwrap().unwrap();
        assert_eq!(found.id, 3);
        assert!(repo.find_package_by_name("Platinum").await.unwrap().is_none());
    }
}
