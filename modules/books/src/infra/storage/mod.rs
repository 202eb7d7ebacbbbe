pub mod book_entity;
pub mod mapper;
pub mod migrations;
pub mod review_entity;
pub mod sea_orm_repo;
