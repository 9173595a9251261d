use async_trait::async_trait;

use crate::{
    application::repos::{BookParams, BooksRepo, RepoError},
    domain::entities::BookRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author_id: i64,
    author_name: String,
    isbn: String,
    publication_year: i32,
    description: String,
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author_id: row.author_id,
            author_name: row.author_name,
            isbn: row.isbn,
            publication_year: row.publication_year,
            description: row.description,
        }
    }
}

#[async_trait]
impl BooksRepo for PostgresRepositories {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT b.id, b.title, b.author_id, a.name AS author_name,
                   b.isbn, b.publication_year, b.description
            FROM books b
            INNER JOIN authors a ON a.id = b.author_id
            ORDER BY b.id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BookRecord::from).collect())
    }

    async fn find_book(&self, id: i64) -> Result<BookRecord, RepoError> {
        sqlx::query_as::<_, BookRow>(
            r#"
            SELECT b.id, b.title, b.author_id, a.name AS author_name,
                   b.isbn, b.publication_year, b.description
            FROM books b
            INNER JOIN authors a ON a.id = b.author_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map(BookRecord::from)
        .map_err(map_sqlx_error)
    }

    async fn create_book(&self, params: BookParams) -> Result<BookRecord, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            WITH inserted AS (
                INSERT INTO books (title, author_id, isbn, publication_year, description)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, title, author_id, isbn, publication_year, description
            )
            SELECT i.id, i.title, i.author_id, a.name AS author_name,
                   i.isbn, i.publication_year, i.description
            FROM inserted i
            INNER JOIN authors a ON a.id = i.author_id
            "#,
        )
        .bind(&params.title)
        .bind(params.author_id)
        .bind(&params.isbn)
        .bind(params.publication_year)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_book(&self, id: i64, params: BookParams) -> Result<BookRecord, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            WITH updated AS (
                UPDATE books
                SET title = $2, author_id = $3, isbn = $4, publication_year = $5,
                    description = $6, updated_at = now()
                WHERE id = $1
                RETURNING id, title, author_id, isbn, publication_year, description
            )
            SELECT u.id, u.title, u.author_id, a.name AS author_name,
                   u.isbn, u.publication_year, u.description
            FROM updated u
            INNER JOIN authors a ON a.id = u.author_id
            "#,
        )
        .bind(id)
        .bind(&params.title)
        .bind(params.author_id)
        .bind(&params.isbn)
        .bind(params.publication_year)
        .bind(&params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(BookRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
