use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::BooksError,
    model::{Book, BookDetail, NewBook, NewReview, Review},
};

/// Public API of the books module, published to the `ClientHub`.
#[async_trait]
pub trait BooksApi: Send + Sync {
    /// All books in insertion order.
    async fn list_books(&self) -> Result<Vec<Book>, BooksError>;

    async fn get_book(&self, id: Uuid) -> Result<BookDetail, BooksError>;

    async fn create_book(&self, new_book: NewBook) -> Result<Book, BooksError>;

    async fn create_review(&self, new_review: NewReview) -> Result<Review, BooksError>;

    /// Reviews of one book in insertion order.
    async fn reviews_for_book(&self, book_id: Uuid) -> Result<Vec<Review>, BooksError>;
}
