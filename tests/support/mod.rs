//! Shared fixtures: an in-memory catalogue implementing every repository
//! trait, a cache store that records its traffic, and a router harness.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use libris::application::auth::{AuthService, TokenService};
use libris::application::authors::AuthorService;
use libris::application::books::BookService;
use libris::application::cache::{CacheError, CacheStore, LookAsideCache};
use libris::application::repos::{
    AuthorParams, AuthorsRepo, BookParams, BooksRepo, CreateUserParams, HealthRepo, RepoError,
    ReviewParams, ReviewsRepo, UsersRepo,
};
use libris::application::reviews::ReviewService;
use libris::domain::entities::{AuthorRecord, BookRecord, ReviewRecord, UserRecord};
use libris::domain::types::Role;
use libris::infra::cache::MemoryCache;
use libris::infra::http::{ApiState, TokenBucket, build_router};

pub const SECRET: &[u8] = b"integration-secret-with-at-least-32-bytes";
pub const ISSUER: &str = "libris";

#[derive(Default)]
struct Tables {
    next_id: i64,
    authors: BTreeMap<i64, AuthorParams>,
    books: BTreeMap<i64, BookParams>,
    reviews: BTreeMap<i64, (i64, ReviewParams)>,
    users: BTreeMap<i64, UserRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn author(&self, id: i64) -> Result<AuthorRecord, RepoError> {
        let params = self.authors.get(&id).ok_or(RepoError::NotFound)?;
        Ok(AuthorRecord {
            id,
            name: params.name.clone(),
            biography: params.biography.clone(),
            birth_date: params.birth_date,
            book_ids: self
                .books
                .iter()
                .filter(|(_, book)| book.author_id == id)
                .map(|(book_id, _)| *book_id)
                .collect(),
        })
    }

    fn book(&self, id: i64) -> Result<BookRecord, RepoError> {
        let params = self.books.get(&id).ok_or(RepoError::NotFound)?;
        let author = self.authors.get(&params.author_id).ok_or(RepoError::NotFound)?;
        Ok(BookRecord {
            id,
            title: params.title.clone(),
            author_id: params.author_id,
            author_name: author.name.clone(),
            isbn: params.isbn.clone(),
            publication_year: params.publication_year,
            description: params.description.clone(),
        })
    }

    fn review(&self, id: i64) -> Result<ReviewRecord, RepoError> {
        let (book_id, params) = self.reviews.get(&id).ok_or(RepoError::NotFound)?;
        let book = self.books.get(book_id).ok_or(RepoError::NotFound)?;
        Ok(ReviewRecord {
            id,
            book_id: *book_id,
            book_title: book.title.clone(),
            rating: params.rating,
            comment: params.comment.clone(),
            date_posted: params.date_posted,
        })
    }

    fn require_author(&self, author_id: i64) -> Result<(), RepoError> {
        if self.authors.contains_key(&author_id) {
            Ok(())
        } else {
            Err(RepoError::InvalidInput {
                message: format!("author {author_id} does not exist"),
            })
        }
    }

    fn drop_book(&mut self, id: i64) {
        self.books.remove(&id);
        self.reviews.retain(|_, (book_id, _)| *book_id != id);
    }
}

/// Relational behavior of the Postgres adapter without a database: joins,
/// cascades, foreign keys and unique constraints.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    unhealthy: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Successful mutations so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    pub async fn book_count(&self) -> usize {
        self.tables.lock().await.books.len()
    }

    /// Write behind the services' back, as another instance would.
    pub async fn rename_author_directly(&self, id: i64, name: &str) {
        if let Some(author) = self.tables.lock().await.authors.get_mut(&id) {
            author.name = name.to_string();
        }
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthorsRepo for InMemoryStore {
    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, RepoError> {
        let tables = self.tables.lock().await;
        tables.authors.keys().map(|id| tables.author(*id)).collect()
    }

    async fn find_author(&self, id: i64) -> Result<AuthorRecord, RepoError> {
        self.tables.lock().await.author(id)
    }

    async fn create_author(&self, params: AuthorParams) -> Result<AuthorRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.authors.insert(id, params);
        self.wrote();
        tables.author(id)
    }

    async fn update_author(
        &self,
        id: i64,
        params: AuthorParams,
    ) -> Result<AuthorRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let slot = tables.authors.get_mut(&id).ok_or(RepoError::NotFound)?;
        *slot = params;
        self.wrote();
        tables.author(id)
    }

    async fn delete_author(&self, id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.authors.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<i64> = tables
            .books
            .iter()
            .filter(|(_, book)| book.author_id == id)
            .map(|(book_id, _)| *book_id)
            .collect();
        for book_id in owned {
            tables.drop_book(book_id);
        }
        self.wrote();
        Ok(true)
    }
}

#[async_trait]
impl BooksRepo for InMemoryStore {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        let tables = self.tables.lock().await;
        tables.books.keys().map(|id| tables.book(*id)).collect()
    }

    async fn find_book(&self, id: i64) -> Result<BookRecord, RepoError> {
        self.tables.lock().await.book(id)
    }

    async fn create_book(&self, params: BookParams) -> Result<BookRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        tables.require_author(params.author_id)?;
        let id = tables.next_id();
        tables.books.insert(id, params);
        self.wrote();
        tables.book(id)
    }

    async fn update_book(&self, id: i64, params: BookParams) -> Result<BookRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        tables.require_author(params.author_id)?;
        let slot = tables.books.get_mut(&id).ok_or(RepoError::NotFound)?;
        *slot = params;
        self.wrote();
        tables.book(id)
    }

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.lock().await;
        if !tables.books.contains_key(&id) {
            return Ok(false);
        }
        tables.drop_book(id);
        self.wrote();
        Ok(true)
    }
}

#[async_trait]
impl ReviewsRepo for InMemoryStore {
    async fn list_reviews_for_book(&self, book_id: i64) -> Result<Vec<ReviewRecord>, RepoError> {
        let tables = self.tables.lock().await;
        tables
            .reviews
            .iter()
            .filter(|(_, (owner, _))| *owner == book_id)
            .map(|(id, _)| tables.review(*id))
            .collect()
    }

    async fn find_review(&self, id: i64) -> Result<ReviewRecord, RepoError> {
        self.tables.lock().await.review(id)
    }

    async fn create_review(
        &self,
        book_id: i64,
        params: ReviewParams,
    ) -> Result<ReviewRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if !tables.books.contains_key(&book_id) {
            return Err(RepoError::InvalidInput {
                message: format!("book {book_id} does not exist"),
            });
        }
        let id = tables.next_id();
        tables.reviews.insert(id, (book_id, params));
        self.wrote();
        tables.review(id)
    }

    async fn update_review(
        &self,
        id: i64,
        params: ReviewParams,
    ) -> Result<ReviewRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let slot = tables.reviews.get_mut(&id).ok_or(RepoError::NotFound)?;
        slot.1 = params;
        self.wrote();
        tables.review(id)
    }

    async fn delete_review(&self, id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.lock().await;
        let removed = tables.reviews.remove(&id).is_some();
        if removed {
            self.wrote();
        }
        Ok(removed)
    }
}

#[async_trait]
impl UsersRepo for InMemoryStore {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        for user in tables.users.values() {
            if user.username == params.username {
                return Err(RepoError::Duplicate {
                    constraint: "users_username_key".into(),
                });
            }
            if user.email == params.email {
                return Err(RepoError::Duplicate {
                    constraint: "users_email_key".into(),
                });
            }
        }
        let id = tables.next_id();
        let user = UserRecord {
            id,
            username: params.username,
            email: params.email,
            password_hash: params.password_hash,
            role: params.role,
        };
        tables.users.insert(id, user.clone());
        self.wrote();
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl HealthRepo for InMemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    Get(String),
    Set(String),
    Delete(String),
}

/// In-process cache that logs every command and can be switched off to
/// simulate an outage.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    ops: std::sync::Mutex<Vec<CacheOp>>,
    down: AtomicBool,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn ops(&self) -> Vec<CacheOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub fn deleted(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                CacheOp::Delete(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Sets and deletes, excluding reads.
    pub fn mutations(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| !matches!(op, CacheOp::Get(_)))
            .count()
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }

    pub async fn plant(&self, key: &str, value: &str) {
        self.inner
            .set(key, value.to_string(), Duration::from_secs(60))
            .await
            .unwrap();
    }

    fn record(&self, op: CacheOp) -> Result<(), CacheError> {
        self.ops.lock().unwrap().push(op);
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.record(CacheOp::Get(key.to_string()))?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.record(CacheOp::Set(key.to_string()))?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.record(CacheOp::Delete(key.to_string()))?;
        self.inner.delete(key).await
    }
}

pub struct Services {
    pub authors: AuthorService,
    pub books: BookService,
    pub reviews: ReviewService,
}

pub fn services(store: &Arc<InMemoryStore>, cache: &Arc<RecordingCache>) -> Services {
    let look_aside = LookAsideCache::new(cache.clone());
    Services {
        authors: AuthorService::new(store.clone(), look_aside.clone()),
        books: BookService::new(store.clone(), look_aside.clone()),
        reviews: ReviewService::new(store.clone(), store.clone(), look_aside),
    }
}

pub fn token_service() -> TokenService {
    TokenService::new(SECRET, ISSUER)
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<RecordingCache>,
    pub state: ApiState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(10_000, 10_000)
    }

    pub fn with_rate_limit(requests_per_second: u32, burst: u32) -> Self {
        let store = InMemoryStore::new();
        let cache = RecordingCache::new();
        let Services {
            authors,
            books,
            reviews,
        } = services(&store, &cache);

        let state = ApiState {
            auth: Arc::new(AuthService::new(store.clone(), token_service())),
            authors: Arc::new(authors),
            books: Arc::new(books),
            reviews: Arc::new(reviews),
            health: store.clone(),
            rate_limiter: Arc::new(TokenBucket::new(requests_per_second, burst)),
        };

        Self {
            store,
            cache,
            state,
        }
    }

    /// Insert a user directly and return a bearer token for it.
    pub async fn token_for(&self, username: &str, role: Role) -> String {
        let user = self
            .store
            .create_user(CreateUserParams {
                username: username.to_string(),
                email: format!("{username}@libris.test"),
                password_hash: "unused".to_string(),
                role,
            })
            .await
            .unwrap();
        token_service().issue(&user).unwrap().token
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("librarian", Role::Admin).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.send_request(builder.body(body).unwrap()).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
