use std::sync::Arc;

use crate::application::auth::AuthService;
use crate::application::authors::AuthorService;
use crate::application::books::BookService;
use crate::application::repos::HealthRepo;
use crate::application::reviews::ReviewService;

use super::rate_limit::TokenBucket;

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub authors: Arc<AuthorService>,
    pub books: Arc<BookService>,
    pub reviews: Arc<ReviewService>,
    pub health: Arc<dyn HealthRepo>,
    pub rate_limiter: Arc<TokenBucket>,
}
