use crate::contract::model::{Book, Review};
use crate::domain::service::with_cents;
use crate::infra::storage::{book_entity, review_entity};

impl From<book_entity::Model> for Book {
    fn from(m: book_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            author: m.author,
            price: with_cents(m.price),
            created_at: m.created_at,
        }
    }
}

impl From<review_entity::Model> for Review {
    fn from(m: review_entity::Model) -> Self {
        Self {
            id: m.id,
            book_id: m.book_id,
            author_id: m.author_id,
            review_text: m.review_text,
            created_at: m.created_at,
        }
    }
}
