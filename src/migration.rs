//! Schema DDL for books, users and tokens. Every statement is idempotent.

use crate::error::AppError;
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        year INTEGER NOT NULL,
        genres TEXT[] NOT NULL,
        released_at INTEGER NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    "ALTER TABLE books ADD COLUMN IF NOT EXISTS version INTEGER NOT NULL DEFAULT 1",
    "CREATE INDEX IF NOT EXISTS books_title_idx ON books USING GIN (to_tsvector('simple', title))",
    "CREATE INDEX IF NOT EXISTS books_author_idx ON books USING GIN (to_tsvector('simple', author))",
    "CREATE INDEX IF NOT EXISTS books_genres_idx ON books USING GIN (genres)",
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password_hash BYTEA NOT NULL,
        activated BOOLEAN NOT NULL DEFAULT FALSE,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tokens (
        hash BYTEA PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users ON DELETE CASCADE,
        expiry TIMESTAMPTZ NOT NULL,
        scope TEXT NOT NULL
    )
    "#,
];

/// Create tables and indexes if missing. Safe to run on every start.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for ddl in STATEMENTS {
        tracing::debug!(sql = %ddl.trim(), "migration");
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(statements = STATEMENTS.len(), "schema up to date");
    Ok(())
}
