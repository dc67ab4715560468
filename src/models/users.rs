use crate::error::AppError;
use crate::models::bounded;
use crate::service::Validator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::LazyLock;
use std::time::Duration;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid email regex"));

const MAX_NAME_BYTES: usize = 500;

/// Account record. The password hash is produced and checked by the auth layer; it is opaque here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    pub activated: bool,
    #[serde(skip_serializing)]
    pub version: i32,
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        EMAIL_RX.is_match(email),
        "email",
        "must be a valid email address",
    );
}

pub fn validate_user(v: &mut Validator, user: &User) {
    v.check(!user.name.is_empty(), "name", "must be provided");
    v.check(user.name.len() <= MAX_NAME_BYTES, "name", "must not be more than 500 bytes long");
    validate_email(v, &user.email);
    v.check(!user.password_hash.is_empty(), "password", "must be provided");
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user and back-fills `id`, `created_at` and `version`.
    async fn insert(&self, user: &mut User) -> Result<(), AppError>;

    async fn get_by_email(&self, email: &str) -> Result<User, AppError>;

    /// Version-conditioned write; a stale `user.version` yields [`AppError::EditConflict`].
    async fn update(&self, user: &mut User) -> Result<(), AppError>;
}

const INSERT_USER: &str = r#"
INSERT INTO users (name, email, password_hash, activated)
VALUES ($1, $2, $3, $4)
RETURNING id, created_at, version"#;

const SELECT_USER_BY_EMAIL: &str = r#"
SELECT id, created_at, name, email, password_hash, activated, version
FROM users
WHERE email = $1"#;

const UPDATE_USER: &str = r#"
UPDATE users
SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1
WHERE id = $5 AND version = $6
RETURNING version"#;

fn map_unique_email(e: AppError) -> AppError {
    match e {
        AppError::Storage(sqlx::Error::Database(db)) if db.is_unique_violation() => AppError::DuplicateEmail,
        other => other,
    }
}

pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        PgUserRepository { pool, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn insert(&self, user: &mut User) -> Result<(), AppError> {
        tracing::debug!(sql = %INSERT_USER, email = %user.email, "query");
        let (id, created_at, version): (i64, DateTime<Utc>, i32) = bounded(
            self.timeout,
            sqlx::query_as(INSERT_USER)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.activated)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(map_unique_email)?;
        user.id = id;
        user.created_at = created_at;
        user.version = version;
        Ok(())
    }

    async fn get_by_email(&self, email: &str) -> Result<User, AppError> {
        tracing::debug!(sql = %SELECT_USER_BY_EMAIL, email = %email, "query");
        bounded(
            self.timeout,
            sqlx::query_as::<_, User>(SELECT_USER_BY_EMAIL)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn update(&self, user: &mut User) -> Result<(), AppError> {
        tracing::debug!(sql = %UPDATE_USER, id = user.id, version = user.version, "query");
        let version: Option<i32> = bounded(
            self.timeout,
            sqlx::query_scalar(UPDATE_USER)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.activated)
                .bind(user.id)
                .bind(user.version)
                .fetch_optional(&self.pool),
        )
        .await
        .map_err(map_unique_email)?;
        user.version = version.ok_or(AppError::EditConflict)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            name: "Alice Smith".into(),
            email: "alice@example.com".into(),
            password_hash: b"$argon2id$stub".to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_user_passes() {
        let mut v = Validator::new();
        validate_user(&mut v, &user());
        assert!(v.valid(), "{:?}", v.errors());
    }

    #[test]
    fn email_pattern_compiles() {
        assert!(Regex::new(EMAIL_PATTERN).is_ok());
        assert!(EMAIL_RX.is_match("alice@example.com"));
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["", "alice", "alice@", "@example.com", "alice@exa mple.com"] {
            let mut v = Validator::new();
            validate_email(&mut v, bad);
            assert!(!v.valid(), "{bad}");
        }
        let mut v = Validator::new();
        validate_email(&mut v, "a.b+tag@sub.example.org");
        assert!(v.valid());
    }

    #[test]
    fn name_length_and_hash_are_checked() {
        let mut v = Validator::new();
        validate_user(
            &mut v,
            &User {
                name: "x".repeat(501),
                password_hash: Vec::new(),
                ..user()
            },
        );
        assert_eq!(v.errors()["name"], "must not be more than 500 bytes long");
        assert_eq!(v.errors()["password"], "must be provided");
    }
}
