use async_trait::async_trait;
use time::Date;

use crate::{
    application::repos::{AuthorParams, AuthorsRepo, RepoError},
    domain::entities::AuthorRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const SELECT_AUTHORS: &str = r#"
    SELECT
        a.id,
        a.name,
        a.biography,
        a.birth_date,
        COALESCE(
            ARRAY_AGG(b.id ORDER BY b.id) FILTER (WHERE b.id IS NOT NULL),
            '{}'::BIGINT[]
        ) AS book_ids
    FROM authors a
    LEFT JOIN books b ON b.author_id = a.id
"#;

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: i64,
    name: String,
    biography: String,
    birth_date: Option<Date>,
    book_ids: Vec<i64>,
}

impl From<AuthorRow> for AuthorRecord {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            biography: row.biography,
            birth_date: row.birth_date,
            book_ids: row.book_ids,
        }
    }
}

#[async_trait]
impl AuthorsRepo for PostgresRepositories {
    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError> {
        let sql = format!("{SELECT_AUTHORS} GROUP BY a.id ORDER BY a.id");
        let rows = sqlx::query_as::<_, AuthorRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AuthorRecord::from).collect())
    }

    async fn find_author(&self, id: i64) -> Result<AuthorRecord, RepoError> {
        let sql = format!("{SELECT_AUTHORS} WHERE a.id = $1 GROUP BY a.id");
        sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map(AuthorRecord::from)
            .map_err(map_sqlx_error)
    }

    async fn create_author(&self, params: AuthorParams) -> Result<AuthorRecord, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            INSERT INTO authors (name, biography, birth_date)
            VALUES ($1, $2, $3)
            RETURNING id, name, biography, birth_date, '{}'::BIGINT[] AS book_ids
            "#,
        )
        .bind(&params.name)
        .bind(&params.biography)
        .bind(params.birth_date)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_author(
        &self,
        id: i64,
        params: AuthorParams,
    ) -> Result<AuthorRecord, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE authors
            SET name = $2, biography = $3, birth_date = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .bind(&params.biography)
        .bind(params.birth_date)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.find_author(id).await
    }

    async fn delete_author(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
