//! Libris: a catalogue API for authors, books and reviews, served from
//! PostgreSQL through a look-aside cache.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
