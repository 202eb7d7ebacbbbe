//! Demo catalog for `--mock` runs.

use std::sync::Arc;

use books::{BooksApi, NewBook};
use rust_decimal::Decimal;

const DEMO_BOOKS: &[(&str, &str, i64)] = &[
    ("Django for Professionals", "William S. Vincent", 3999),
    ("The Rust Programming Language", "Steve Klabnik and Carol Nichols", 3995),
    ("Designing Data-Intensive Applications", "Martin Kleppmann", 4499),
];

/// Insert the demo books into an empty catalog. Returns how many were added.
pub async fn seed_demo_books(api: Arc<dyn BooksApi>) -> anyhow::Result<usize> {
    if !api.list_books().await?.is_empty() {
        return Ok(0);
    }
    for (title, author, cents) in DEMO_BOOKS {
        api.create_book(NewBook::new(*title, *author, Decimal::new(*cents, 2)))
            .await?;
    }
    tracing::info!(count = DEMO_BOOKS.len(), "Seeded demo books");
    Ok(DEMO_BOOKS.len())
}
