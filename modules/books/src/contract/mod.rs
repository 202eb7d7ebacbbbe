pub mod client;
pub mod error;
pub mod model;

pub use client::BooksApi;
pub use error::BooksError;
pub use model::{Book, BookDetail, NewBook, NewReview, Review, ReviewDetail};
