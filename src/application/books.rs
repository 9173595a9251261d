use std::sync::Arc;

use libris_api_types::BookResponse;

use crate::application::cache::{CacheKey, LookAsideCache};
use crate::application::repos::{BookParams, BooksRepo, RepoError};
use crate::domain::entities::BookRecord;

pub type CreateBookCommand = BookParams;

#[derive(Debug, Clone, Default)]
pub struct UpdateBookCommand {
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BooksRepo>,
    cache: LookAsideCache,
}

impl BookService {
    pub fn new(books: Arc<dyn BooksRepo>, cache: LookAsideCache) -> Self {
        Self { books, cache }
    }

    pub async fn list_books(&self) -> Result<Vec<BookResponse>, RepoError> {
        self.cache
            .get_or_load(CacheKey::BooksList, || async {
                let records = self.books.list_books().await?;
                Ok(records.iter().map(book_response).collect())
            })
            .await
    }

    pub async fn get_book(&self, id: i64) -> Result<BookResponse, RepoError> {
        self.cache
            .get_or_load(CacheKey::Book(id), || async {
                let record = self.books.find_book(id).await?;
                Ok(book_response(&record))
            })
            .await
    }

    pub async fn create_book(&self, command: CreateBookCommand) -> Result<BookResponse, RepoError> {
        let record = self.books.create_book(command).await?;
        self.cache
            .invalidate([CacheKey::BooksList, CacheKey::Book(record.id)])
            .await;
        Ok(book_response(&record))
    }

    pub async fn update_book(
        &self,
        id: i64,
        command: UpdateBookCommand,
    ) -> Result<BookResponse, RepoError> {
        let current = self.books.find_book(id).await?;

        let UpdateBookCommand {
            title,
            author_id,
            isbn,
            publication_year,
            description,
        } = command;
        let params = BookParams {
            title: title.unwrap_or(current.title),
            author_id: author_id.unwrap_or(current.author_id),
            isbn: isbn.unwrap_or(current.isbn),
            publication_year: publication_year.unwrap_or(current.publication_year),
            description: description.unwrap_or(current.description),
        };

        let updated = self.books.update_book(id, params).await?;
        self.cache.invalidate(book_keys(id)).await;
        Ok(book_response(&updated))
    }

    /// Reviews cascade with the book, so its review list is dropped as well.
    pub async fn delete_book(&self, id: i64) -> Result<(), RepoError> {
        self.books.find_book(id).await?;

        if !self.books.delete_book(id).await? {
            return Err(RepoError::NotFound);
        }

        self.cache.invalidate(book_keys(id)).await;
        Ok(())
    }
}

/// Review records carry the book title, so a book change also stales its
/// review list.
fn book_keys(id: i64) -> [CacheKey; 3] {
    [
        CacheKey::Book(id),
        CacheKey::BooksList,
        CacheKey::BookReviews(id),
    ]
}

pub(crate) fn book_response(record: &BookRecord) -> BookResponse {
    BookResponse {
        id: record.id,
        title: record.title.clone(),
        author_id: record.author_id,
        author_name: record.author_name.clone(),
        isbn: record.isbn.clone(),
        publication_year: record.publication_year,
        description: record.description.clone(),
    }
}
