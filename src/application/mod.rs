//! Application services: catalogue orchestration over store and cache, plus
//! authentication.

pub mod auth;
pub mod authors;
pub mod books;
pub mod cache;
pub mod error;
pub mod repos;
pub mod reviews;
