use std::sync::Arc;

use libris_api_types::ReviewResponse;
use time::Date;

use crate::application::cache::{CacheKey, LookAsideCache};
use crate::application::repos::{BooksRepo, RepoError, ReviewParams, ReviewsRepo};
use crate::domain::entities::ReviewRecord;
use crate::domain::validation::format_calendar_date;

pub type CreateReviewCommand = ReviewParams;

#[derive(Debug, Clone, Default)]
pub struct UpdateReviewCommand {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub date_posted: Option<Date>,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewsRepo>,
    books: Arc<dyn BooksRepo>,
    cache: LookAsideCache,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewsRepo>,
        books: Arc<dyn BooksRepo>,
        cache: LookAsideCache,
    ) -> Self {
        Self {
            reviews,
            books,
            cache,
        }
    }

    /// Reviews of one book. An unknown book is `NotFound` rather than an
    /// empty list, and is never cached.
    pub async fn list_reviews_for_book(
        &self,
        book_id: i64,
    ) -> Result<Vec<ReviewResponse>, RepoError> {
        self.cache
            .get_or_load(CacheKey::BookReviews(book_id), || async {
                self.books.find_book(book_id).await?;
                let records = self.reviews.list_reviews_for_book(book_id).await?;
                Ok(records.iter().map(review_response).collect())
            })
            .await
    }

    pub async fn create_review(
        &self,
        book_id: i64,
        command: CreateReviewCommand,
    ) -> Result<ReviewResponse, RepoError> {
        self.books.find_book(book_id).await?;

        let record = self.reviews.create_review(book_id, command).await?;
        self.cache
            .invalidate([CacheKey::BookReviews(record.book_id)])
            .await;
        Ok(review_response(&record))
    }

    pub async fn update_review(
        &self,
        id: i64,
        command: UpdateReviewCommand,
    ) -> Result<ReviewResponse, RepoError> {
        let current = self.reviews.find_review(id).await?;

        let UpdateReviewCommand {
            rating,
            comment,
            date_posted,
        } = command;
        let params = ReviewParams {
            rating: rating.unwrap_or(current.rating),
            comment: comment.unwrap_or(current.comment),
            date_posted: date_posted.unwrap_or(current.date_posted),
        };

        let updated = self.reviews.update_review(id, params).await?;
        self.cache
            .invalidate([CacheKey::BookReviews(current.book_id)])
            .await;
        Ok(review_response(&updated))
    }

    /// The review list is cached per parent book, so the review is read
    /// first to learn which key to drop.
    pub async fn delete_review(&self, id: i64) -> Result<(), RepoError> {
        let current = self.reviews.find_review(id).await?;

        if !self.reviews.delete_review(id).await? {
            return Err(RepoError::NotFound);
        }

        self.cache
            .invalidate([CacheKey::BookReviews(current.book_id)])
            .await;
        Ok(())
    }
}

pub(crate) fn review_response(record: &ReviewRecord) -> ReviewResponse {
    ReviewResponse {
        id: record.id,
        book_id: record.book_id,
        book_title: record.book_title.clone(),
        rating: record.rating,
        comment: record.comment.clone(),
        date_posted: format_calendar_date(record.date_posted),
    }
}
