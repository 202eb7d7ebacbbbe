//! Catalog and review store behaviour through the published `BooksApi`.

mod common;

use std::str::FromStr;

use books::{
    infra::storage::{book_entity, review_entity},
    BooksError, NewBook, NewReview,
};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[tokio::test]
async fn create_book_keeps_fields() {
    let app = common::app().await;

    let book = app.test_book().await;
    assert_eq!(book.title, "Test Book");
    assert_eq!(book.author, "Test Author");
    assert_eq!(book.price.to_string(), "19.99");

    let detail = app.books.get_book(book.id).await.unwrap();
    assert_eq!(detail.book.title, "Test Book");
    assert_eq!(detail.book.author, "Test Author");
    assert_eq!(detail.book.price.to_string(), "19.99");
    assert!(detail.reviews.is_empty());
}

#[tokio::test]
async fn whole_prices_get_cents() {
    let app = common::app().await;
    let book = app
        .books
        .create_book(NewBook::new("Dune", "Frank Herbert", Decimal::from(20)))
        .await
        .unwrap();
    assert_eq!(book.price.to_string(), "20.00");

    let stored = app.books.get_book(book.id).await.unwrap();
    assert_eq!(stored.book.price.to_string(), "20.00");
}

#[tokio::test]
async fn invalid_books_are_rejected() {
    let app = common::app().await;

    let cases = [
        NewBook::new("", "Someone", Decimal::new(100, 2)),
        NewBook::new("Title", "   ", Decimal::new(100, 2)),
        NewBook::new("Title", "Someone", Decimal::new(-1, 2)),
        NewBook::new("Title", "Someone", Decimal::from_str("1.999").unwrap()),
        NewBook::new("Title", "Someone", Decimal::from(10_000)),
        NewBook::new("x".repeat(201), "Someone", Decimal::ONE),
    ];
    for new_book in cases {
        let err = app.books.create_book(new_book.clone()).await.unwrap_err();
        assert!(
            matches!(err, BooksError::Validation { .. }),
            "{new_book:?} gave {err:?}"
        );
    }
    assert!(app.books.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn books_are_listed_in_insertion_order() {
    let app = common::app().await;
    for title in ["First", "Second", "Third"] {
        app.books
            .create_book(NewBook::new(title, "Author", Decimal::ONE))
            .await
            .unwrap();
    }

    let titles: Vec<String> = app
        .books
        .list_books()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let app = common::app().await;
    let id = Uuid::new_v4();

    let err = app.books.get_book(id).await.unwrap_err();
    assert_eq!(err, BooksError::not_found("Book", id));

    let err = app.books.reviews_for_book(id).await.unwrap_err();
    assert_eq!(err, BooksError::not_found("Book", id));
}

#[tokio::test]
async fn review_is_attached_to_book_and_author() {
    let app = common::app().await;
    let user = app.reviewer().await;
    let book = app.test_book().await;

    let review = app
        .books
        .create_review(NewReview {
            book_id: book.id,
            author_id: user.id,
            review_text: "An excellent review".into(),
        })
        .await
        .unwrap();
    assert_eq!(review.book_id, book.id);
    assert_eq!(review.author_id, user.id);
    assert_eq!(review.review_text, "An excellent review");

    let reviews = app.books.reviews_for_book(book.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id, review.id);

    let detail = app.books.get_book(book.id).await.unwrap();
    assert_eq!(detail.reviews.len(), 1);
    assert_eq!(detail.reviews[0].author_username, "reviewuser");
    assert_eq!(detail.reviews[0].review.review_text, "An excellent review");
}

#[tokio::test]
async fn reviews_keep_insertion_order() {
    let app = common::app().await;
    let user = app.reviewer().await;
    let book = app.test_book().await;

    for text in ["one", "two", "three"] {
        app.books
            .create_review(NewReview {
                book_id: book.id,
                author_id: user.id,
                review_text: text.into(),
            })
            .await
            .unwrap();
    }

    let texts: Vec<String> = app
        .books
        .reviews_for_book(book.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.review_text)
        .collect();
    assert_eq!(texts, ["one", "two", "three"]);
}

#[tokio::test]
async fn review_needs_existing_book_and_author() {
    let app = common::app().await;
    let user = app.reviewer().await;
    let book = app.test_book().await;

    let missing_book = Uuid::new_v4();
    let err = app
        .books
        .create_review(NewReview {
            book_id: missing_book,
            author_id: user.id,
            review_text: "Great".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, BooksError::not_found("Book", missing_book));

    let missing_user = Uuid::new_v4();
    let err = app
        .books
        .create_review(NewReview {
            book_id: book.id,
            author_id: missing_user,
            review_text: "Great".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, BooksError::not_found("User", missing_user));

    assert!(app.books.reviews_for_book(book.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn review_text_is_required_and_bounded() {
    let app = common::app().await;
    let user = app.reviewer().await;
    let book = app.test_book().await;

    for text in [String::new(), "  ".to_string(), "x".repeat(256)] {
        let err = app
            .books
            .create_review(NewReview {
                book_id: book.id,
                author_id: user.id,
                review_text: text,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BooksError::Validation { .. }), "{err:?}");
    }

    app.books
        .create_review(NewReview {
            book_id: book.id,
            author_id: user.id,
            review_text: "x".repeat(255),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn deleting_a_book_removes_its_reviews() {
    let app = common::app().await;
    let user = app.reviewer().await;
    let book = app.test_book().await;
    app.books
        .create_review(NewReview {
            book_id: book.id,
            author_id: user.id,
            review_text: "Gone soon".into(),
        })
        .await
        .unwrap();

    book_entity::Entity::delete_by_id(book.id)
        .exec(app.db.seaorm())
        .await
        .unwrap();

    let remaining = review_entity::Entity::find()
        .count(app.db.seaorm())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
