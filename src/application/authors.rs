use std::sync::Arc;

use libris_api_types::AuthorResponse;
use time::Date;

use crate::application::cache::{CacheKey, LookAsideCache};
use crate::application::repos::{AuthorParams, AuthorsRepo, RepoError};
use crate::domain::entities::AuthorRecord;
use crate::domain::validation::format_calendar_date;

/// Validated field set for a new author.
pub type CreateAuthorCommand = AuthorParams;

/// Fields present in a partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateAuthorCommand {
    pub name: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<Date>,
}

#[derive(Clone)]
pub struct AuthorService {
    authors: Arc<dyn AuthorsRepo>,
    cache: LookAsideCache,
}

impl AuthorService {
    pub fn new(authors: Arc<dyn AuthorsRepo>, cache: LookAsideCache) -> Self {
        Self { authors, cache }
    }

    pub async fn list_authors(&self) -> Result<Vec<AuthorResponse>, RepoError> {
        self.cache
            .get_or_load(CacheKey::AuthorsList, || async {
                let records = self.authors.list_authors().await?;
                Ok(records.iter().map(author_response).collect())
            })
            .await
    }

    pub async fn get_author(&self, id: i64) -> Result<AuthorResponse, RepoError> {
        self.cache
            .get_or_load(CacheKey::Author(id), || async {
                let record = self.authors.find_author(id).await?;
                Ok(author_response(&record))
            })
            .await
    }

    pub async fn create_author(
        &self,
        command: CreateAuthorCommand,
    ) -> Result<AuthorResponse, RepoError> {
        let record = self.authors.create_author(command).await?;
        self.cache
            .invalidate([CacheKey::AuthorsList, CacheKey::Author(record.id)])
            .await;
        Ok(author_response(&record))
    }

    pub async fn update_author(
        &self,
        id: i64,
        command: UpdateAuthorCommand,
    ) -> Result<AuthorResponse, RepoError> {
        let current = self.authors.find_author(id).await?;

        let UpdateAuthorCommand {
            name,
            biography,
            birth_date,
        } = command;
        let params = AuthorParams {
            name: name.unwrap_or(current.name.clone()),
            biography: biography.unwrap_or(current.biography.clone()),
            birth_date: birth_date.or(current.birth_date),
        };

        let updated = self.authors.update_author(id, params).await?;
        self.cache.invalidate(author_keys(&current)).await;
        Ok(author_response(&updated))
    }

    /// Deleting an author cascades to its books and their reviews, so every
    /// cached record derived from them goes too.
    pub async fn delete_author(&self, id: i64) -> Result<(), RepoError> {
        let current = self.authors.find_author(id).await?;

        if !self.authors.delete_author(id).await? {
            return Err(RepoError::NotFound);
        }

        self.cache.invalidate(author_keys(&current)).await;
        Ok(())
    }
}

/// Keys made stale by changing or removing `author`: its own entries plus
/// every book record that denormalizes the author name.
fn author_keys(author: &AuthorRecord) -> Vec<CacheKey> {
    let mut keys = vec![
        CacheKey::Author(author.id),
        CacheKey::AuthorsList,
        CacheKey::BooksList,
    ];
    for book_id in &author.book_ids {
        keys.push(CacheKey::Book(*book_id));
        keys.push(CacheKey::BookReviews(*book_id));
    }
    keys
}

pub(crate) fn author_response(record: &AuthorRecord) -> AuthorResponse {
    AuthorResponse {
        id: record.id,
        name: record.name.clone(),
        biography: record.biography.clone(),
        birth_date: record.birth_date.map(format_calendar_date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_keys_cover_owned_books() {
        let author = AuthorRecord {
            id: 5,
            name: "Le Guin".into(),
            biography: String::new(),
            birth_date: None,
            book_ids: vec![11, 12],
        };

        let keys = author_keys(&author);
        for expected in [
            CacheKey::Author(5),
            CacheKey::AuthorsList,
            CacheKey::BooksList,
            CacheKey::Book(11),
            CacheKey::BookReviews(11),
            CacheKey::Book(12),
            CacheKey::BookReviews(12),
        ] {
            assert!(keys.contains(&expected), "missing {expected}");
        }
    }
}
