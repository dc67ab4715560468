use crate::error::AppError;
use crate::models::bounded;
use crate::service::{calculate_metadata, validate_filters, Filters, Metadata, Validator};
use crate::sql;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;

/// Sort tokens accepted by book listings.
pub const BOOK_SORT_SAFELIST: &[&str] = &[
    "id",
    "title",
    "year",
    "released_at",
    "-id",
    "-title",
    "-year",
    "-released_at",
];

pub const DEFAULT_BOOK_SORT: &str = "id";

#[derive(Clone, Debug, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genres: Vec<String>,
    pub released_at: i32,
    pub version: i32,
}

pub fn validate_book(v: &mut Validator, book: &Book) {
    validate_book_for_year(v, book, Utc::now().year());
}

pub fn validate_book_for_year(v: &mut Validator, book: &Book, current_year: i32) {
    v.check(!book.title.is_empty(), "title", "must be provided");
    v.check(!book.author.is_empty(), "author", "must be provided");
    v.check(book.year != 0, "year", "must be provided");
    v.check(book.year > 0, "year", "must be greater than zero");
    v.check(book.year <= current_year, "year", "must not be in the future");
    v.check(book.released_at != 0, "released_at", "must be provided");
    v.check(!book.genres.is_empty(), "genres", "must be provided");
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persists a new book and back-fills `id`, `created_at` and `version`. Does not validate.
    async fn insert(&self, book: &mut Book) -> Result<(), AppError>;

    async fn get(&self, id: i64) -> Result<Book, AppError>;

    /// Validates, then writes only if `book.version` still matches the stored row.
    /// On success the stored values, including the new version, are written back into `book`.
    async fn update(&self, book: &mut Book) -> Result<(), AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Search terms are trimmed first; a blank term does not filter.
    async fn get_all(
        &self,
        title: &str,
        author: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Book>, Metadata), AppError>;
}

#[derive(sqlx::FromRow)]
struct CountedBook {
    total_records: i64,
    #[sqlx(flatten)]
    book: Book,
}

type StoredFields = (String, String, i32, Vec<String>, i32, i32);

pub struct PgBookRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgBookRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        PgBookRepository { pool, timeout }
    }
}

#[async_trait]
impl BookStore for PgBookRepository {
    async fn insert(&self, book: &mut Book) -> Result<(), AppError> {
        let q = sql::insert_book(book);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let (id, created_at, version): (i64, DateTime<Utc>, i32) =
            bounded(self.timeout, q.query_as().fetch_one(&self.pool)).await?;
        book.id = id;
        book.created_at = created_at;
        book.version = version;
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Book, AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }
        let q = sql::select_book_by_id(id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        bounded(self.timeout, q.query_as::<Book>().fetch_optional(&self.pool))
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn update(&self, book: &mut Book) -> Result<(), AppError> {
        let mut v = Validator::new();
        validate_book(&mut v, book);
        v.into_result()?;

        let q = sql::update_book(book);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let stored: Option<StoredFields> =
            bounded(self.timeout, q.query_as().fetch_optional(&self.pool)).await?;
        let Some((title, author, year, genres, released_at, version)) = stored else {
            tracing::debug!(id = book.id, version = book.version, "update matched no row");
            return Err(AppError::EditConflict);
        };
        book.title = title;
        book.author = author;
        book.year = year;
        book.genres = genres;
        book.released_at = released_at;
        book.version = version;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(AppError::NotFound);
        }
        let q = sql::delete_book(id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let res = bounded(self.timeout, q.query().execute(&self.pool)).await?;
        if res.rows_affected() == 0 {
            Err(AppError::NotFound)
        } else {
            Ok(())
        }
    }

    async fn get_all(
        &self,
        title: &str,
        author: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Book>, Metadata), AppError> {
        let mut v = Validator::new();
        validate_filters(&mut v, filters);
        v.into_result()?;
        let order = filters.sort_order()?;

        let q = sql::search_books(title.trim(), author.trim(), genres, order, filters.limit(), filters.offset());
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows: Vec<CountedBook> = bounded(self.timeout, q.query_as().fetch_all(&self.pool)).await?;

        let total_records = rows.first().map(|r| r.total_records).unwrap_or(0);
        let books = rows.into_iter().map(|r| r.book).collect();
        Ok((books, calculate_metadata(total_records, filters.page, filters.page_size)))
    }
}
