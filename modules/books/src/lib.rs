// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};
pub use contract::{Book, BookDetail, BooksApi, BooksError, NewBook, NewReview, Review, ReviewDetail};

// === MODULE DEFINITION ===
pub mod module;
pub use module::{register, Books, MODULE_NAME};

// === INTERNAL MODULES ===
// Exposed for tests; not a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
