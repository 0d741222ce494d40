//! Persistence layer: repository traits, an in-memory implementation for
//! tests, and the SQLite backend.

pub mod repository;
pub mod sqlite;
