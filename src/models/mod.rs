//! Entity repositories and the `Models` aggregate handed to the HTTP layer.
//!
//! Each entity kind is a capability trait. `Models` bundles one implementation
//! of each, built once from a shared pool. Every operation makes a single
//! round trip to PostgreSQL bounded by the configured query timeout.

mod books;
pub mod memory;
mod tokens;
mod users;

pub use books::{validate_book, validate_book_for_year, Book, BookStore, PgBookRepository, BOOK_SORT_SAFELIST, DEFAULT_BOOK_SORT};
pub use tokens::{PgTokenRepository, Token, TokenStore, SCOPE_ACTIVATION, SCOPE_AUTHENTICATION};
pub use users::{validate_email, validate_user, PgUserRepository, User, UserStore};

use crate::error::AppError;
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct Models {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
}

impl Models {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Models {
            books: Arc::new(PgBookRepository::new(pool.clone(), query_timeout)),
            users: Arc::new(PgUserRepository::new(pool.clone(), query_timeout)),
            tokens: Arc::new(PgTokenRepository::new(pool, query_timeout)),
        }
    }

    /// In-process repositories with the same contracts, for tests and local tooling.
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Models {
            books: store.clone(),
            users: store.clone(),
            tokens: store,
        }
    }
}

/// Runs one storage round trip under `limit`. Elapsed deadlines become
/// [`AppError::StorageTimeout`]; the statement is dropped, nothing is retried.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(timeout = ?limit, "query timed out");
            Err(AppError::StorageTimeout(limit))
        }
    }
}
