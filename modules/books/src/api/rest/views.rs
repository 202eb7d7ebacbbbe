//! Template contexts for the catalog pages.

use accounts::api::rest::extract::UserSummary;
use chrono::{DateTime, Utc};
use modkit::ViewInfo;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::contract::model::{Book, ReviewDetail};

#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub price: Decimal,
}

impl From<Book> for BookView {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            title: b.title,
            author: b.author,
            price: b.price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub author: String,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDetail> for ReviewView {
    fn from(r: ReviewDetail) -> Self {
        Self {
            author: r.author_username,
            review_text: r.review.review_text,
            created_at: r.review.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookListContext {
    pub view: ViewInfo,
    pub user: Option<UserSummary>,
    pub book_list: Vec<BookView>,
}

#[derive(Debug, Serialize)]
pub struct BookDetailContext {
    pub view: ViewInfo,
    pub user: Option<UserSummary>,
    pub book: BookView,
    pub reviews: Vec<ReviewView>,
}
