use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::BooksApi,
    error::BooksError,
    model::{Book, BookDetail, NewBook, NewReview, Review},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process implementation of [`BooksApi`] backed by the domain service.
pub struct BooksLocalClient {
    service: Arc<Service>,
}

impl BooksLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BooksApi for BooksLocalClient {
    async fn list_books(&self) -> Result<Vec<Book>, BooksError> {
        self.service.list_books().await.map_err(Into::into)
    }

    async fn get_book(&self, id: Uuid) -> Result<BookDetail, BooksError> {
        self.service.get_book(id).await.map_err(Into::into)
    }

    async fn create_book(&self, new_book: NewBook) -> Result<Book, BooksError> {
        self.service.create_book(new_book).await.map_err(Into::into)
    }

    async fn create_review(&self, new_review: NewReview) -> Result<Review, BooksError> {
        self.service
            .create_review(new_review)
            .await
            .map_err(Into::into)
    }

    async fn reviews_for_book(&self, book_id: Uuid) -> Result<Vec<Review>, BooksError> {
        self.service
            .reviews_for_book(book_id)
            .await
            .map_err(Into::into)
    }
}

impl From<DomainError> for BooksError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::BookNotFound { id } => BooksError::not_found("Book", id),
            DomainError::AuthorNotFound { id } => BooksError::not_found("User", id),
            DomainError::Validation { field, message } => {
                BooksError::validation(format!("{field}: {message}"))
            }
            DomainError::Directory { message } | DomainError::Database { message } => {
                tracing::error!(error = %message, "books store failure");
                BooksError::internal()
            }
        }
    }
}
