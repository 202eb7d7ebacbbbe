use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{Book, BookDetail, NewBook, NewReview, Review, ReviewDetail};
use crate::domain::error::DomainError;
use crate::domain::ports::UserDirectory;
use crate::domain::repo::{BooksRepository, ReviewsRepository};

pub const TITLE_MAX_LENGTH: usize = 200;
pub const AUTHOR_MAX_LENGTH: usize = 200;

const PRICE_MAX_DIGITS: u32 = 6;
const PRICE_DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_review_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_review_length: 255,
        }
    }
}

/// Book catalog and review store.
#[derive(Clone)]
pub struct Service {
    books: Arc<dyn BooksRepository>,
    reviews: Arc<dyn ReviewsRepository>,
    users: Arc<dyn UserDirectory>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(
        books: Arc<dyn BooksRepository>,
        reviews: Arc<dyn ReviewsRepository>,
        users: Arc<dyn UserDirectory>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            books,
            reviews,
            users,
            config,
        }
    }

    #[instrument(name = "books.service.list_books", skip(self))]
    pub async fn list_books(&self) -> Result<Vec<Book>, DomainError> {
        let books = self
            .books
            .list()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    async fn find_book(&self, id: Uuid) -> Result<Book, DomainError> {
        self.books
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::book_not_found(id))
    }

    #[instrument(name = "books.service.get_book", skip(self), fields(book_id = %id))]
    pub async fn get_book(&self, id: Uuid) -> Result<BookDetail, DomainError> {
        let book = self.find_book(id).await?;
        let reviews = self
            .reviews
            .list_for_book(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let mut usernames: HashMap<Uuid, String> = HashMap::new();
        let mut detailed = Vec::with_capacity(reviews.len());
        for review in reviews {
            let author_username = match usernames.get(&review.author_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .users
                        .username(review.author_id)
                        .await?
                        .unwrap_or_default();
                    usernames.insert(review.author_id, name.clone());
                    name
                }
            };
            detailed.push(ReviewDetail {
                review,
                author_username,
            });
        }

        Ok(BookDetail {
            book,
            reviews: detailed,
        })
    }

    #[instrument(name = "books.service.create_book", skip(self, new_book), fields(title = %new_book.title))]
    pub async fn create_book(&self, new_book: NewBook) -> Result<Book, DomainError> {
        info!("Creating new book");

        let title = required_text("title", &new_book.title, TITLE_MAX_LENGTH)?;
        let author = required_text("author", &new_book.author, AUTHOR_MAX_LENGTH)?;
        let price = normalize_price(new_book.price)?;

        let book = Book {
            id: Uuid::now_v7(),
            title,
            author,
            price,
            created_at: Utc::now(),
        };
        self.books
            .insert(book.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!(book_id = %book.id, "Successfully created book");
        Ok(book)
    }

    #[instrument(
        name = "books.service.create_review",
        skip(self, new_review),
        fields(book_id = %new_review.book_id, author_id = %new_review.author_id)
    )]
    pub async fn create_review(&self, new_review: NewReview) -> Result<Review, DomainError> {
        let review_text =
            required_text("review_text", &new_review.review_text, self.config.max_review_length)?;
        self.find_book(new_review.book_id).await?;
        if self.users.username(new_review.author_id).await?.is_none() {
            return Err(DomainError::author_not_found(new_review.author_id));
        }

        let review = Review {
            id: Uuid::now_v7(),
            book_id: new_review.book_id,
            author_id: new_review.author_id,
            review_text,
            created_at: Utc::now(),
        };
        self.reviews
            .insert(review.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!(review_id = %review.id, "Successfully created review");
        Ok(review)
    }

    #[instrument(name = "books.service.reviews_for_book", skip(self), fields(book_id = %book_id))]
    pub async fn reviews_for_book(&self, book_id: Uuid) -> Result<Vec<Review>, DomainError> {
        self.find_book(book_id).await?;
        self.reviews
            .list_for_book(book_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }
}

fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, "This field is required."));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(DomainError::validation(
            field,
            format!("Ensure this value has at most {max_len} characters (it has {len})."),
        ));
    }
    Ok(value.to_string())
}

/// Check the price fits `decimal(6, 2)` and is not negative; returns it with scale 2.
pub fn normalize_price(price: Decimal) -> Result<Decimal, DomainError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(DomainError::validation(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        ));
    }
    let limit = Decimal::from(10_i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if normalized >= limit {
        return Err(DomainError::validation(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        ));
    }
    Ok(with_cents(normalized))
}

/// Two decimal places, rounding away float noise from storage round trips.
pub fn with_cents(price: Decimal) -> Decimal {
    let mut price = price.round_dp(PRICE_DECIMAL_PLACES);
    price.rescale(PRICE_DECIMAL_PLACES);
    price
}
