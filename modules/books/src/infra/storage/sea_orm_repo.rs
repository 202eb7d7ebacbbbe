//! SeaORM-backed implementations of the catalog ports.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::contract::model::{Book, Review};
use crate::domain::repo::{BooksRepository, ReviewsRepository};
use crate::infra::storage::book_entity::{
    ActiveModel as BookAM, Column as BookColumn, Entity as BookEntity,
};
use crate::infra::storage::review_entity::{
    ActiveModel as ReviewAM, Column as ReviewColumn, Entity as ReviewEntity,
};

pub struct SeaOrmBooksRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmBooksRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> BooksRepository for SeaOrmBooksRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list(&self) -> anyhow::Result<Vec<Book>> {
        let rows = BookEntity::find()
            .order_by_asc(BookColumn::CreatedAt)
            .order_by_asc(BookColumn::Id)
            .all(&self.conn)
            .await
            .context("list books failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>> {
        let found = BookEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find book failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert(&self, b: Book) -> anyhow::Result<()> {
        let m = BookAM {
            id: Set(b.id),
            title: Set(b.title),
            author: Set(b.author),
            price: Set(b.price),
            created_at: Set(b.created_at),
        };
        let _ = m.insert(&self.conn).await.context("insert book failed")?;
        Ok(())
    }
}

pub struct SeaOrmReviewsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmReviewsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> ReviewsRepository for SeaOrmReviewsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_for_book(&self, book_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let rows = ReviewEntity::find()
            .filter(ReviewColumn::BookId.eq(book_id))
            .order_by_asc(ReviewColumn::CreatedAt)
            .order_by_asc(ReviewColumn::Id)
            .all(&self.conn)
            .await
            .context("list reviews failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, r: Review) -> anyhow::Result<()> {
        let m = ReviewAM {
            id: Set(r.id),
            book_id: Set(r.book_id),
            author_id: Set(r.author_id),
            review_text: Set(r.review_text),
            created_at: Set(r.created_at),
        };
        let _ = m.insert(&self.conn).await.context("insert review failed")?;
        Ok(())
    }
}
