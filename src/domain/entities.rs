//! Domain entities mirrored from persistent storage.

use time::Date;

use crate::domain::types::Role;

/// An author together with the ids of the books they own.
///
/// `book_ids` is loaded eagerly so mutations can invalidate every cached
/// record that denormalizes the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: i64,
    pub name: String,
    pub biography: String,
    pub birth_date: Option<Date>,
    pub book_ids: Vec<i64>,
}

/// A book joined with its author's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub author_name: String,
    pub isbn: String,
    pub publication_year: i32,
    pub description: String,
}

/// A review joined with its book's title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub rating: i32,
    pub comment: String,
    pub date_posted: Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
