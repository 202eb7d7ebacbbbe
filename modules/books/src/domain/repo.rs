use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Book, Review};

/// Port for the domain layer: catalog persistence.
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Ordered by `created_at`, then `id`.
    async fn list(&self) -> anyhow::Result<Vec<Book>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>>;
    async fn insert(&self, b: Book) -> anyhow::Result<()>;
}

/// Port for the domain layer: review persistence.
#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    /// Ordered by `created_at`, then `id`.
    async fn list_for_book(&self, book_id: Uuid) -> anyhow::Result<Vec<Review>>;
    async fn insert(&self, r: Review) -> anyhow::Result<()>;
}
