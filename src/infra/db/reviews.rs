use async_trait::async_trait;
use time::Date;

use crate::{
    application::repos::{RepoError, ReviewParams, ReviewsRepo},
    domain::entities::ReviewRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    book_id: i64,
    book_title: String,
    rating: i32,
    comment: String,
    date_posted: Date,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            book_id: row.book_id,
            book_title: row.book_title,
            rating: row.rating,
            comment: row.comment,
            date_posted: row.date_posted,
        }
    }
}

#[async_trait]
impl ReviewsRepo for PostgresRepositories {
    async fn list_reviews_for_book(&self, book_id: i64) -> Result<Vec<ReviewRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.book_id, b.title AS book_title, r.rating, r.comment, r.date_posted
            FROM reviews r
            INNER JOIN books b ON b.id = r.book_id
            WHERE r.book_id = $1
            ORDER BY r.date_posted DESC, r.id DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn find_review(&self, id: i64) -> Result<ReviewRecord, RepoError> {
        sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.book_id, b.title AS book_title, r.rating, r.comment, r.date_posted
            FROM reviews r
            INNER JOIN books b ON b.id = r.book_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map(ReviewRecord::from)
        .map_err(map_sqlx_error)
    }

    async fn create_review(
        &self,
        book_id: i64,
        params: ReviewParams,
    ) -> Result<ReviewRecord, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (book_id, rating, comment, date_posted)
                VALUES ($1, $2, $3, $4)
                RETURNING id, book_id, rating, comment, date_posted
            )
            SELECT i.id, i.book_id, b.title AS book_title, i.rating, i.comment, i.date_posted
            FROM inserted i
            INNER JOIN books b ON b.id = i.book_id
            "#,
        )
        .bind(book_id)
        .bind(params.rating)
        .bind(&params.comment)
        .bind(params.date_posted)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_review(
        &self,
        id: i64,
        params: ReviewParams,
    ) -> Result<ReviewRecord, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH updated AS (
                UPDATE reviews
                SET rating = $2, comment = $3, date_posted = $4, updated_at = now()
                WHERE id = $1
                RETURNING id, book_id, rating, comment, date_posted
            )
            SELECT u.id, u.book_id, b.title AS book_title, u.rating, u.comment, u.date_posted
            FROM updated u
            INNER JOIN books b ON b.id = u.book_id
            "#,
        )
        .bind(id)
        .bind(params.rating)
        .bind(&params.comment)
        .bind(params.date_posted)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ReviewRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_review(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
