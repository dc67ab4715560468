use crate::error::AppError;
use crate::models::{bounded, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;

pub const SCOPE_ACTIVATION: &str = "activation";
pub const SCOPE_AUTHENTICATION: &str = "authentication";

/// Stored token. Only the hash of the plaintext is persisted; generating and
/// hashing tokens happens outside this crate.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub hash: Vec<u8>,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: String,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &Token) -> Result<(), AppError>;

    async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> Result<(), AppError>;

    /// Owner of an unexpired token with the given scope and hash.
    async fn get_user_for_token(&self, scope: &str, hash: &[u8]) -> Result<User, AppError>;
}

const INSERT_TOKEN: &str = r#"
INSERT INTO tokens (hash, user_id, expiry, scope)
VALUES ($1, $2, $3, $4)"#;

const DELETE_TOKENS_FOR_USER: &str = r#"
DELETE FROM tokens
WHERE scope = $1 AND user_id = $2"#;

const SELECT_USER_FOR_TOKEN: &str = r#"
SELECT users.id, users.created_at, users.name, users.email, users.password_hash, users.activated, users.version
FROM users
INNER JOIN tokens ON users.id = tokens.user_id
WHERE tokens.hash = $1
AND tokens.scope = $2
AND tokens.expiry > $3"#;

pub struct PgTokenRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        PgTokenRepository { pool, timeout }
    }
}

#[async_trait]
impl TokenStore for PgTokenRepository {
    async fn insert(&self, token: &Token) -> Result<(), AppError> {
        tracing::debug!(sql = %INSERT_TOKEN, user_id = token.user_id, scope = %token.scope, "query");
        bounded(
            self.timeout,
            sqlx::query(INSERT_TOKEN)
                .bind(&token.hash)
                .bind(token.user_id)
                .bind(token.expiry)
                .bind(&token.scope)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: &str, user_id: i64) -> Result<(), AppError> {
        tracing::debug!(sql = %DELETE_TOKENS_FOR_USER, user_id, scope, "query");
        bounded(
            self.timeout,
            sqlx::query(DELETE_TOKENS_FOR_USER)
                .bind(scope)
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn get_user_for_token(&self, scope: &str, hash: &[u8]) -> Result<User, AppError> {
        tracing::debug!(sql = %SELECT_USER_FOR_TOKEN, scope, "query");
        bounded(
            self.timeout,
            sqlx::query_as::<_, User>(SELECT_USER_FOR_TOKEN)
                .bind(hash)
                .bind(scope)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(AppError::NotFound)
    }
}
