//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::Date;

use crate::domain::entities::{AuthorRecord, BookRecord, ReviewRecord, UserRecord};
use crate::domain::types::Role;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Full column set written on create and on the persist step of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorParams {
    pub name: String,
    pub biography: String,
    pub birth_date: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookParams {
    pub title: String,
    pub author_id: i64,
    pub isbn: String,
    pub publication_year: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewParams {
    pub rating: i32,
    pub comment: String,
    pub date_posted: Date,
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[async_trait]
pub trait AuthorsRepo: Send + Sync {
    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError>;

    /// Fails with [`RepoError::NotFound`] when no row matches.
    async fn find_author(&self, id: i64) -> Result<AuthorRecord, RepoError>;

    async fn create_author(&self, params: AuthorParams) -> Result<AuthorRecord, RepoError>;

    async fn update_author(&self, id: i64, params: AuthorParams)
    -> Result<AuthorRecord, RepoError>;

    /// Returns whether a row was removed. Books and their reviews cascade.
    async fn delete_author(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait BooksRepo: Send + Sync {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError>;

    async fn find_book(&self, id: i64) -> Result<BookRecord, RepoError>;

    /// A missing author surfaces as [`RepoError::InvalidInput`].
    async fn create_book(&self, params: BookParams) -> Result<BookRecord, RepoError>;

    async fn update_book(&self, id: i64, params: BookParams) -> Result<BookRecord, RepoError>;

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    async fn list_reviews_for_book(&self, book_id: i64) -> Result<Vec<ReviewRecord>, RepoError>;

    async fn find_review(&self, id: i64) -> Result<ReviewRecord, RepoError>;

    async fn create_review(
        &self,
        book_id: i64,
        params: ReviewParams,
    ) -> Result<ReviewRecord, RepoError>;

    async fn update_review(&self, id: i64, params: ReviewParams)
    -> Result<ReviewRecord, RepoError>;

    async fn delete_review(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Username and email uniqueness violations surface as [`RepoError::Duplicate`].
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    /// Round-trip to the store; any failure means it is unreachable.
    async fn health_check(&self) -> Result<(), RepoError>;
}
