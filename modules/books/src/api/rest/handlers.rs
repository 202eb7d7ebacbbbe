use std::sync::Arc;

use accounts::CurrentUser;
use axum::{extract::Path, Extension};
use modkit::{Page, PageError, ViewInfo};
use tracing::info;
use uuid::Uuid;

use crate::api::rest::views::{BookDetailContext, BookListContext};
use crate::domain::{error::DomainError, service::Service};

pub const BOOK_LIST_VIEW: ViewInfo = ViewInfo {
    name: "book_list",
    template: "books/book_list.html",
};

pub const BOOK_DETAIL_VIEW: ViewInfo = ViewInfo {
    name: "book_detail",
    template: "books/book_detail.html",
};

const NO_SUCH_BOOK: &str = "No book found matching the query";

fn to_page_error(e: DomainError) -> PageError {
    match e {
        DomainError::BookNotFound { .. } => PageError::not_found(NO_SUCH_BOOK),
        other => PageError::Internal(other.into()),
    }
}

/// GET /books/
pub async fn book_list(
    Extension(svc): Extension<Arc<Service>>,
    current: CurrentUser,
) -> Result<Page, PageError> {
    info!("Listing books");
    let books = svc.list_books().await.map_err(to_page_error)?;

    Ok(Page::new(
        BOOK_LIST_VIEW.template,
        BookListContext {
            view: BOOK_LIST_VIEW,
            user: current.summary(),
            book_list: books.into_iter().map(Into::into).collect(),
        },
    ))
}

/// GET /books/{id}/ ; malformed ids are 404s like unknown ones.
pub async fn book_detail(
    Extension(svc): Extension<Arc<Service>>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Page, PageError> {
    info!(book_id = %raw_id, "Getting book");
    let id = Uuid::parse_str(&raw_id).map_err(|_| PageError::not_found(NO_SUCH_BOOK))?;
    let detail = svc.get_book(id).await.map_err(to_page_error)?;

    Ok(Page::new(
        BOOK_DETAIL_VIEW.template,
        BookDetailContext {
            view: BOOK_DETAIL_VIEW,
            user: current.summary(),
            book: detail.book.into(),
            reviews: detail.reviews.into_iter().map(Into::into).collect(),
        },
    ))
}
