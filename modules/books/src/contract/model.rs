use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// Non-negative, at most 6 digits with 2 decimal places.
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Decimal,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, price: Decimal) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    /// Id of the reviewing user in the accounts module.
    pub author_id: Uuid,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub book_id: Uuid,
    pub author_id: Uuid,
    pub review_text: String,
}

/// A review together with its author's username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDetail {
    pub review: Review,
    pub author_username: String,
}

/// A book with its reviews, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetail {
    pub book: Book,
    pub reviews: Vec<ReviewDetail>,
}
